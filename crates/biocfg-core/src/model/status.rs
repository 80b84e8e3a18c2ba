use serde::Serialize;

/// Result code carried by an `UpdateStatus` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    Success,
    Error,
    DeviceBusy,
    NoSuchDevice,
    PermissionDenied,
    Unknown(i32),
}

impl ResultCode {
    pub fn from_wire(value: i32) -> Self {
        match value {
            0 => Self::Success,
            1 => Self::Error,
            2 => Self::DeviceBusy,
            3 => Self::NoSuchDevice,
            4 => Self::PermissionDenied,
            other => Self::Unknown(other),
        }
    }
}

/// Outcome of one per-device status update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusResponse {
    /// The service has not finished coming back up.
    NotReady,
    Ready { result: ResultCode, available: i32 },
}
