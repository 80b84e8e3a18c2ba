// biocfg-api: Async clients for the biometric-authentication service,
// systemd, and the privileged helper programs.

pub mod biometric;
pub mod error;
pub mod process;
pub mod systemd;
pub mod transport;

pub use biometric::BiometricClient;
pub use biometric::models::{DriverList, RawDeviceInfo, StatusReply};
pub use error::Error;
pub use process::{ProcessOutput, ProcessRunner};
pub use systemd::SystemdClient;
pub use transport::{BIOMETRIC_UNIT, ServiceEndpoint};
