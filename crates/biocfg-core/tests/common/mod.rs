// Scripted collaborators for controller tests.
//
// Every fake appends to a shared call log so tests can assert on the
// exact sequence of outside-world interactions.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use biocfg_core::{
    CoreError, DeviceId, DeviceList, DeviceRecord, ExitOutcome, PrivilegedRunner, RawDeviceEntry,
    RestartDecision, RestartPrompt, ServiceClient, ServiceManager, StatusResponse, SyncConfig,
    SyncController,
};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub type TestController = SyncController<FakeService, FakeRunner, FakeManager>;

// ── Service ─────────────────────────────────────────────────────────

pub struct FakeService {
    log: CallLog,
    pub exists: Mutex<Option<bool>>,
    pub api_compatible: Mutex<bool>,
    /// `None` makes the fetch fail.
    pub devices: Mutex<Option<DeviceList>>,
    /// Scripted `UpdateStatus` answers; `None` is a transport error.
    /// When exhausted, the device reports ready and available.
    pub statuses: Mutex<VecDeque<Option<StatusResponse>>>,
    /// Per device id; `None` makes the count fail.
    pub features: Mutex<HashMap<i32, Option<u32>>>,
}

impl FakeService {
    pub fn set_devices(&self, entries: Vec<RawDeviceEntry>) {
        *self.devices.lock().unwrap() = Some(list(entries));
    }

    pub fn fail_fetch(&self) {
        *self.devices.lock().unwrap() = None;
    }

    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = Option<StatusResponse>>) {
        self.statuses.lock().unwrap().extend(statuses);
    }

    pub fn set_features(&self, id: i32, count: Option<u32>) {
        self.features.lock().unwrap().insert(id, count);
    }
}

impl ServiceClient for FakeService {
    async fn service_exists(&self) -> Result<bool, CoreError> {
        record(&self.log, "exists");
        self.exists
            .lock()
            .unwrap()
            .ok_or_else(|| CoreError::ServiceUnavailable {
                message: "bus unreachable".into(),
            })
    }

    async fn check_api_compatibility(
        &self,
        major: i32,
        minor: i32,
        func: i32,
    ) -> Result<bool, CoreError> {
        record(&self.log, format!("api {major}.{minor}.{func}"));
        Ok(*self.api_compatible.lock().unwrap())
    }

    async fn fetch_device_list(&self) -> Result<DeviceList, CoreError> {
        record(&self.log, "list");
        self.devices
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CoreError::ServiceUnavailable {
                message: "GetDrvList failed".into(),
            })
    }

    async fn update_device_status(&self, id: DeviceId) -> Result<StatusResponse, CoreError> {
        record(&self.log, format!("status {id}"));
        match self.statuses.lock().unwrap().pop_front() {
            Some(Some(status)) => Ok(status),
            Some(None) => Err(CoreError::ServiceUnavailable {
                message: "name has no owner".into(),
            }),
            None => Ok(ready(1)),
        }
    }

    async fn feature_count(&self, id: DeviceId, uid: u32) -> Result<u32, CoreError> {
        record(&self.log, format!("features {id} {uid}"));
        match self.features.lock().unwrap().get(&id.0) {
            Some(Some(n)) => Ok(*n),
            Some(None) => Err(CoreError::Api {
                message: "GetFeatureList failed".into(),
                name: None,
            }),
            None => Ok(0),
        }
    }
}

// ── Privileged runner ───────────────────────────────────────────────

pub struct FakeRunner {
    log: CallLog,
    pub driver_exit: Mutex<Option<i32>>,
    pub verification_exit: Mutex<Option<i32>>,
    /// `None` makes the probe fail.
    pub status_output: Mutex<Option<String>>,
    /// Simulated helper runtime.
    pub driver_delay: Duration,
}

impl PrivilegedRunner for FakeRunner {
    async fn set_driver_enabled(
        &self,
        short_name: &str,
        enable: bool,
    ) -> Result<ExitOutcome, CoreError> {
        let verb = if enable { "enable" } else { "disable" };
        record(&self.log, format!("driver {verb} {short_name}"));
        if !self.driver_delay.is_zero() {
            tokio::time::sleep(self.driver_delay).await;
            record(&self.log, format!("driver done {short_name}"));
        }
        Ok(ExitOutcome {
            code: *self.driver_exit.lock().unwrap(),
        })
    }

    async fn set_verification(&self, user: &str, enable: bool) -> Result<ExitOutcome, CoreError> {
        let verb = if enable { "enable" } else { "disable" };
        record(&self.log, format!("verification {verb} {user}"));
        Ok(ExitOutcome {
            code: *self.verification_exit.lock().unwrap(),
        })
    }

    async fn verification_status(&self) -> Result<String, CoreError> {
        record(&self.log, "probe");
        self.status_output
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CoreError::Api {
                message: "bioctl not found".into(),
                name: None,
            })
    }
}

// ── Service manager ─────────────────────────────────────────────────

pub struct FakeManager {
    log: CallLog,
    pub fail: Mutex<bool>,
}

impl ServiceManager for FakeManager {
    async fn restart_service(&self) -> Result<(), CoreError> {
        record(&self.log, "restart");
        if *self.fail.lock().unwrap() {
            return Err(CoreError::Api {
                message: "Access denied".into(),
                name: Some("org.freedesktop.DBus.Error.AccessDenied".into()),
            });
        }
        Ok(())
    }
}

// ── Prompt ──────────────────────────────────────────────────────────

/// Records each question and answers with a fixed decision.
pub struct ScriptedPrompt {
    log: CallLog,
    decision: RestartDecision,
}

impl ScriptedPrompt {
    pub fn new(log: &CallLog, decision: RestartDecision) -> Self {
        Self {
            log: Arc::clone(log),
            decision,
        }
    }
}

impl RestartPrompt for ScriptedPrompt {
    fn ask(&self, device: &DeviceRecord, enable: bool) -> RestartDecision {
        let verb = if enable { "enable" } else { "disable" };
        record(&self.log, format!("prompt {verb} {}", device.short_name));
        self.decision
    }
}

// ── Harness ─────────────────────────────────────────────────────────

pub struct Harness {
    pub controller: Arc<TestController>,
    pub log: CallLog,
}

impl Harness {
    pub fn new(entries: Vec<RawDeviceEntry>) -> Self {
        Self::with_config(config(), entries)
    }

    pub fn with_config(config: SyncConfig, entries: Vec<RawDeviceEntry>) -> Self {
        Self::build(config, entries, Duration::ZERO)
    }

    pub fn with_driver_delay(entries: Vec<RawDeviceEntry>, delay: Duration) -> Self {
        Self::build(config(), entries, delay)
    }

    fn build(config: SyncConfig, entries: Vec<RawDeviceEntry>, driver_delay: Duration) -> Self {
        let log: CallLog = Arc::default();
        let service = FakeService {
            log: Arc::clone(&log),
            exists: Mutex::new(Some(true)),
            api_compatible: Mutex::new(true),
            devices: Mutex::new(Some(list(entries))),
            statuses: Mutex::new(VecDeque::new()),
            features: Mutex::new(HashMap::new()),
        };
        let runner = FakeRunner {
            log: Arc::clone(&log),
            driver_exit: Mutex::new(Some(0)),
            verification_exit: Mutex::new(Some(0)),
            status_output: Mutex::new(Some("Biometric authentication is disabled\n".into())),
            driver_delay,
        };
        let manager = FakeManager {
            log: Arc::clone(&log),
            fail: Mutex::new(false),
        };
        let controller = Arc::new(SyncController::new(config, service, runner, manager));
        Self { controller, log }
    }

    pub fn service(&self) -> &FakeService {
        self.controller.service()
    }

    pub fn runner(&self) -> &FakeRunner {
        self.controller.runner()
    }

    pub fn manager(&self) -> &FakeManager {
        self.controller.manager()
    }

    pub fn prompt(&self, decision: RestartDecision) -> ScriptedPrompt {
        ScriptedPrompt::new(&self.log, decision)
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().clear();
    }

    /// Calls whose text starts with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
}

// ── Builders ────────────────────────────────────────────────────────

pub fn config() -> SyncConfig {
    SyncConfig {
        user: "alice".into(),
        uid: 1000,
        ..SyncConfig::default()
    }
}

pub fn device(id: i32, biotype: i32, name: &str, available: i32) -> RawDeviceEntry {
    RawDeviceEntry {
        id,
        biotype,
        short_name: name.into(),
        full_name: format!("{name} reader"),
        driver_enable: 1,
        available,
    }
}

pub fn list(entries: Vec<RawDeviceEntry>) -> DeviceList {
    DeviceList {
        count: i32::try_from(entries.len()).unwrap(),
        entries,
    }
}

pub fn ready(available: i32) -> StatusResponse {
    StatusResponse::Ready {
        result: biocfg_core::ResultCode::Success,
        available,
    }
}

fn record(log: &CallLog, call: impl Into<String>) {
    log.lock().unwrap().push(call.into());
}
