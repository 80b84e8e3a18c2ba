// ── Domain model ──
//
// Canonical types shared by the inventory, the controller, and the CLI.
// Wire shapes from `biocfg-api` are mapped into these in `crate::convert`.

mod biotype;
mod device;
mod status;
mod summary;
mod verification;

pub use biotype::{BIOTYPE_COUNT, Biotype};
pub use device::{DeviceId, DeviceList, DeviceRecord, RawDeviceEntry};
pub use status::{ResultCode, StatusResponse};
pub use summary::{BiotypeSummary, DeviceSummary};
pub use verification::VerificationState;
