// ── API → domain type conversions ──
//
// Bridges raw `biocfg-api` reply types into canonical domain types.

use biocfg_api::{DriverList, RawDeviceInfo, StatusReply};

use crate::model::{DeviceList, RawDeviceEntry, ResultCode, StatusResponse};

impl From<RawDeviceInfo> for RawDeviceEntry {
    fn from(raw: RawDeviceInfo) -> Self {
        Self {
            id: raw.device_id,
            biotype: raw.biotype,
            short_name: raw.short_name,
            full_name: raw.full_name,
            driver_enable: raw.driver_enable,
            available: raw.device_available,
        }
    }
}

impl From<DriverList> for DeviceList {
    fn from(list: DriverList) -> Self {
        Self {
            count: list.count,
            entries: list.devices.into_iter().map(RawDeviceEntry::from).collect(),
        }
    }
}

impl From<StatusReply> for StatusResponse {
    fn from(reply: StatusReply) -> Self {
        match reply {
            StatusReply::Incomplete { .. } => Self::NotReady,
            StatusReply::Complete {
                result, available, ..
            } => Self::Ready {
                result: ResultCode::from_wire(result),
                available,
            },
        }
    }
}
