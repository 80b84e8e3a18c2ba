use std::fmt;

use serde::{Deserialize, Serialize};

use super::Biotype;

/// Identifier assigned by the biometric service.
///
/// Stable for the lifetime of one service process; may change when the
/// service restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for DeviceId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// One biometric device in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub biotype: Biotype,
    /// Display key; looked up by name within its biotype group.
    pub short_name: String,
    pub full_name: String,
    pub driver_enabled: bool,
    /// `<= 0` means unavailable.
    pub available: i32,
}

impl DeviceRecord {
    pub fn is_available(&self) -> bool {
        self.available > 0
    }
}

/// One entry of a device-list fetch, before biotype validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeviceEntry {
    pub id: i32,
    pub biotype: i32,
    pub short_name: String,
    pub full_name: String,
    pub driver_enable: i32,
    pub available: i32,
}

impl RawDeviceEntry {
    /// Build the inventory record, or `None` if the biotype is unknown.
    pub fn to_record(&self) -> Option<DeviceRecord> {
        Some(DeviceRecord {
            id: DeviceId(self.id),
            biotype: Biotype::from_wire(self.biotype)?,
            short_name: self.short_name.clone(),
            full_name: self.full_name.clone(),
            driver_enabled: self.driver_enable != 0,
            available: self.available,
        })
    }
}

/// Result of a device-list fetch: the service's count plus its entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceList {
    pub count: i32,
    pub entries: Vec<RawDeviceEntry>,
}
