// ── Collaborator seams ──
//
// The controller talks to the outside world only through these traits.
// `system` holds the D-Bus and helper-process implementations; tests
// substitute scripted fakes.

pub mod system;

use std::future::Future;

use crate::error::CoreError;
use crate::model::{DeviceId, DeviceList, DeviceRecord, StatusResponse};

/// Calls into the biometric-authentication service.
pub trait ServiceClient: Send + Sync {
    /// Whether the service currently owns its bus name.
    fn service_exists(&self) -> impl Future<Output = Result<bool, CoreError>> + Send;

    /// `true` when the service accepts this application API version.
    fn check_api_compatibility(
        &self,
        major: i32,
        minor: i32,
        func: i32,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;

    /// Single round trip; waits as long as the service needs.
    fn fetch_device_list(&self) -> impl Future<Output = Result<DeviceList, CoreError>> + Send;

    fn update_device_status(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<StatusResponse, CoreError>> + Send;

    /// Number of features `uid` has enrolled on the device.
    fn feature_count(
        &self,
        id: DeviceId,
        uid: u32,
    ) -> impl Future<Output = Result<u32, CoreError>> + Send;
}

/// Exit status of a privileged helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// `None` when the helper was killed by a signal.
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub const SUCCESS: Self = Self { code: Some(0) };

    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

/// Privileged helper invocations.
pub trait PrivilegedRunner: Send + Sync {
    /// `enable-driver` / `disable-driver <short_name>`.
    fn set_driver_enabled(
        &self,
        short_name: &str,
        enable: bool,
    ) -> impl Future<Output = Result<ExitOutcome, CoreError>> + Send;

    /// `enable` / `disable -u <user>`.
    fn set_verification(
        &self,
        user: &str,
        enable: bool,
    ) -> impl Future<Output = Result<ExitOutcome, CoreError>> + Send;

    /// Raw output of the verification status probe.
    fn verification_status(&self) -> impl Future<Output = Result<String, CoreError>> + Send;
}

/// Restarts the service unit.
pub trait ServiceManager: Send + Sync {
    fn restart_service(&self) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Answer to "restart the service now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Now,
    Later,
}

/// Asks the user whether to restart the service after a driver change.
pub trait RestartPrompt: Send + Sync {
    fn ask(&self, device: &DeviceRecord, enable: bool) -> RestartDecision;
}
