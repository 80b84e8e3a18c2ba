// Wire types for the biometric service.
//
// `GetDrvList` returns `(i, av)`: a count followed by an array of
// variants, each wrapping a 13-field `DeviceInfo` structure. These types
// mirror that shape with no domain interpretation; `biocfg-core` maps
// them into its own model.

use serde::Serialize;
use zvariant::{OwnedValue, Structure, Value};

use crate::error::Error;

/// Number of fields in a `DeviceInfo` structure, signature `(issiiiiiiiiii)`.
pub const DEVICE_INFO_FIELDS: usize = 13;

/// Number of fields in a fully populated `UpdateStatus` reply.
pub const UPDATE_STATUS_FIELDS: usize = 3;

/// One device record exactly as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawDeviceInfo {
    pub device_id: i32,
    pub short_name: String,
    pub full_name: String,
    pub driver_enable: i32,
    pub device_available: i32,
    pub biotype: i32,
    pub stotype: i32,
    pub eigtype: i32,
    pub vertype: i32,
    pub idtype: i32,
    pub bustype: i32,
    pub dev_status: i32,
    pub ops_status: i32,
}

/// Reply of `GetDrvList`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverList {
    /// Count reported by the service. Not trusted beyond `devices.len()`.
    pub count: i32,
    pub devices: Vec<RawDeviceInfo>,
}

/// Reply of `UpdateStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusReply {
    /// The service answered with fewer fields than expected, or with an
    /// error reply. Seen right after a restart, before the service has
    /// finished re-registering.
    Incomplete { fields: usize },
    /// Fully populated reply.
    Complete {
        result: i32,
        dev_status: i32,
        available: i32,
    },
}

impl StatusReply {
    /// Interpret an `UpdateStatus` reply from its top-level body fields.
    pub fn from_fields(fields: &[Value<'_>]) -> Result<Self, Error> {
        if fields.len() < UPDATE_STATUS_FIELDS {
            return Ok(Self::Incomplete {
                fields: fields.len(),
            });
        }
        Ok(Self::Complete {
            result: int_field("UpdateStatus", fields, 0)?,
            dev_status: int_field("UpdateStatus", fields, 1)?,
            available: int_field("UpdateStatus", fields, 2)?,
        })
    }
}

impl RawDeviceInfo {
    /// Decode one element of the `av` array returned by `GetDrvList`.
    pub fn from_value(value: &Value<'_>) -> Result<Self, Error> {
        match value {
            Value::Value(inner) => Self::from_value(inner),
            Value::Structure(structure) => Self::from_structure(structure),
            other => Err(Error::Decode {
                method: "GetDrvList",
                message: format!("expected a DeviceInfo structure, got {}", other.value_signature()),
            }),
        }
    }

    fn from_structure(structure: &Structure<'_>) -> Result<Self, Error> {
        let f = structure.fields();
        if f.len() < DEVICE_INFO_FIELDS {
            return Err(Error::Decode {
                method: "GetDrvList",
                message: format!(
                    "DeviceInfo has {} fields, expected {DEVICE_INFO_FIELDS}",
                    f.len()
                ),
            });
        }
        Ok(Self {
            device_id: int_field("GetDrvList", f, 0)?,
            short_name: str_field("GetDrvList", f, 1)?,
            full_name: str_field("GetDrvList", f, 2)?,
            driver_enable: int_field("GetDrvList", f, 3)?,
            device_available: int_field("GetDrvList", f, 4)?,
            biotype: int_field("GetDrvList", f, 5)?,
            stotype: int_field("GetDrvList", f, 6)?,
            eigtype: int_field("GetDrvList", f, 7)?,
            vertype: int_field("GetDrvList", f, 8)?,
            idtype: int_field("GetDrvList", f, 9)?,
            bustype: int_field("GetDrvList", f, 10)?,
            dev_status: int_field("GetDrvList", f, 11)?,
            ops_status: int_field("GetDrvList", f, 12)?,
        })
    }
}

impl DriverList {
    /// Decode the `(count, av)` pair returned by `GetDrvList`.
    pub fn from_parts(count: i32, entries: &[OwnedValue]) -> Result<Self, Error> {
        let devices = entries
            .iter()
            .map(|v| RawDeviceInfo::from_value(v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { count, devices })
    }
}

// ── Field helpers ───────────────────────────────────────────────────

fn field<'f, 'v>(
    method: &'static str,
    fields: &'f [Value<'v>],
    index: usize,
) -> Result<&'f Value<'v>, Error> {
    let value = fields.get(index).ok_or_else(|| Error::Decode {
        method,
        message: format!("missing field {index}"),
    })?;
    // Services built on QtDBus sometimes wrap scalars in an extra variant.
    match value {
        Value::Value(inner) => Ok(&**inner),
        other => Ok(other),
    }
}

fn int_field(method: &'static str, fields: &[Value<'_>], index: usize) -> Result<i32, Error> {
    match field(method, fields, index)? {
        Value::I32(n) => Ok(*n),
        Value::U32(n) => i32::try_from(*n).map_err(|_| Error::Decode {
            method,
            message: format!("field {index} out of range: {n}"),
        }),
        Value::I16(n) => Ok(i32::from(*n)),
        Value::U8(n) => Ok(i32::from(*n)),
        other => Err(Error::Decode {
            method,
            message: format!("field {index}: expected integer, got {}", other.value_signature()),
        }),
    }
}

fn str_field(method: &'static str, fields: &[Value<'_>], index: usize) -> Result<String, Error> {
    match field(method, fields, index)? {
        Value::Str(s) => Ok(s.as_str().to_owned()),
        other => Err(Error::Decode {
            method,
            message: format!("field {index}: expected string, got {}", other.value_signature()),
        }),
    }
}
