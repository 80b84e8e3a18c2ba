// ── Sync controller ──
//
// Orchestrates user-triggered changes against the biometric service:
// driver toggles, service restarts, inventory refreshes, the
// confirmation poll, and the global verification switch.

use std::sync::Arc;

use biocfg_api::{BiometricClient, SystemdClient, transport};
use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::backend::system::{DbusService, HelperCommands, SystemdManager};
use crate::backend::{PrivilegedRunner, RestartDecision, RestartPrompt, ServiceClient, ServiceManager};
use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::model::{
    Biotype, BiotypeSummary, DeviceId, DeviceRecord, DeviceSummary, ResultCode, StatusResponse,
    VerificationState,
};
use crate::store::DeviceInventory;

/// Result of a successful device status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Service restarted and inventory refreshed; `available` is the
    /// device's availability afterwards.
    Applied { available: i32 },
    /// Driver changed, restart deferred. The inventory was not refreshed.
    PendingRestart,
}

/// Controller wired to the system bus and the real helper programs.
pub type SystemSyncController = SyncController<DbusService, HelperCommands, SystemdManager>;

// ── SyncController ───────────────────────────────────────────────

/// Composes the service client, privileged runner, and service manager
/// with the shared [`DeviceInventory`].
///
/// Changes to the same device are serialized; changes to different
/// devices may interleave. Devices are identified by biotype and short
/// name, since ids can change across the restart a change performs.
pub struct SyncController<S, P, M> {
    config: SyncConfig,
    service: S,
    runner: P,
    manager: M,
    inventory: Arc<DeviceInventory>,
    verification: watch::Sender<VerificationState>,
    device_locks: DashMap<(Biotype, String), Arc<Mutex<()>>>,
}

impl SystemSyncController {
    /// Connect to the system bus and build the production collaborators.
    /// Does not contact the service; call [`start()`](Self::start) next.
    pub async fn connect_system(config: SyncConfig) -> Result<Self, CoreError> {
        let connection = transport::system_bus().await?;
        let service = DbusService::new(BiometricClient::with_connection(
            connection.clone(),
            config.endpoint.clone(),
        ));
        let runner = HelperCommands::new(&config.helpers);
        let manager = SystemdManager::new(SystemdClient::new(connection), config.unit.clone());
        Ok(Self::new(config, service, runner, manager))
    }
}

impl<S, P, M> SyncController<S, P, M>
where
    S: ServiceClient,
    P: PrivilegedRunner,
    M: ServiceManager,
{
    pub fn new(config: SyncConfig, service: S, runner: P, manager: M) -> Self {
        let (verification, _) = watch::channel(VerificationState::default());
        Self {
            config,
            service,
            runner,
            manager,
            inventory: Arc::new(DeviceInventory::new()),
            verification,
            device_locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn inventory(&self) -> &Arc<DeviceInventory> {
        &self.inventory
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn runner(&self) -> &P {
        &self.runner
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Startup sequence: presence check, API check, verification probe,
    /// initial refresh. Only the first two are fatal; returns the number
    /// of devices loaded.
    pub async fn start(&self) -> Result<usize, CoreError> {
        let bus_name = &self.config.endpoint.bus_name;
        match self.service.service_exists().await {
            Ok(true) => debug!(%bus_name, "biometric service present"),
            Ok(false) => {
                return Err(CoreError::ServiceNotRunning {
                    bus_name: bus_name.clone(),
                });
            }
            Err(e) => {
                warn!(error = %e, "service presence check failed");
                return Err(CoreError::ServiceNotRunning {
                    bus_name: bus_name.clone(),
                });
            }
        }

        let v = self.config.api_version;
        let compatible = match self
            .service
            .check_api_compatibility(v.major, v.minor, v.func)
            .await
        {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "API version check failed");
                false
            }
        };
        if !compatible {
            return Err(CoreError::IncompatibleApi {
                major: v.major,
                minor: v.minor,
                func: v.func,
            });
        }

        self.probe_verification().await;

        match self.refresh().await {
            Ok(count) => Ok(count),
            Err(e) => {
                warn!(error = %e, "initial device fetch failed; starting with no devices");
                Ok(0)
            }
        }
    }

    /// Re-fetch the device list into the inventory.
    pub async fn refresh(&self) -> Result<usize, CoreError> {
        self.inventory.refresh(&self.service).await
    }

    // ── Device status changes ────────────────────────────────────

    /// Toggle a device: enable it if currently unavailable, disable it
    /// otherwise.
    ///
    /// `device` may be a stale copy; it is re-resolved by biotype and
    /// short name after the refresh.
    pub async fn change_device_status(
        &self,
        device: &DeviceRecord,
        prompt: &impl RestartPrompt,
    ) -> Result<ChangeOutcome, CoreError> {
        let lock = self.device_lock(device);
        let _guard = lock.lock().await;

        let to_enable = !device.is_available();
        let action = if to_enable { "enable-driver" } else { "disable-driver" };
        info!(id = %device.id, name = %device.short_name, action, "changing device status");

        let outcome = match self
            .runner
            .set_driver_enabled(&device.short_name, to_enable)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, action, "driver helper could not run");
                return Err(CoreError::ChangeRejected {
                    action: format!("{action} {}", device.short_name),
                    code: None,
                });
            }
        };
        if !outcome.success() {
            return Err(CoreError::ChangeRejected {
                action: format!("{action} {}", device.short_name),
                code: outcome.code,
            });
        }

        if prompt.ask(device, to_enable) == RestartDecision::Later {
            info!(name = %device.short_name, "restart deferred; change applies after the next restart");
            return Ok(ChangeOutcome::PendingRestart);
        }

        self.restart_service().await?;
        if let Err(e) = self.update_devices().await {
            warn!(error = %e, "refresh after restart failed");
        }

        if !to_enable {
            self.inventory
                .set_availability(device.biotype, &device.short_name, 0);
            return Ok(ChangeOutcome::Applied { available: 0 });
        }

        let id = match self
            .inventory
            .find_by_name(device.biotype, &device.short_name)
        {
            Some(fresh) => {
                if fresh.id != device.id {
                    debug!(old = %device.id, new = %fresh.id, "device id changed across restart");
                }
                fresh.id
            }
            None => device.id,
        };
        let available = self.poll_device_status(id, &device.short_name).await?;
        self.inventory
            .set_availability(device.biotype, &device.short_name, available);
        Ok(ChangeOutcome::Applied { available })
    }

    /// Restart the service unit.
    pub async fn restart_service(&self) -> Result<(), CoreError> {
        info!(unit = %self.config.unit, "restarting biometric service");
        self.manager
            .restart_service()
            .await
            .map_err(|e| CoreError::RestartFailed {
                unit: self.config.unit.clone(),
                reason: e.to_string(),
            })
    }

    /// Wait out the grace period after a restart, then refresh.
    pub async fn update_devices(&self) -> Result<usize, CoreError> {
        debug!(grace = ?self.config.grace_period, "waiting for service to come back");
        tokio::time::sleep(self.config.grace_period).await;
        self.refresh().await
    }

    /// Restart the service and refresh the inventory.
    pub async fn restart_and_refresh(&self) -> Result<usize, CoreError> {
        self.restart_service().await?;
        self.update_devices().await
    }

    /// Poll `UpdateStatus` until the service gives a ready answer.
    ///
    /// Not-ready replies and transport errors are retried after the
    /// backoff interval. Unbounded unless `max_status_polls` is set.
    pub async fn poll_device_status(&self, id: DeviceId, name: &str) -> Result<i32, CoreError> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self.service.update_device_status(id).await {
                Ok(StatusResponse::Ready {
                    result: ResultCode::NoSuchDevice,
                    ..
                }) => {
                    return Err(CoreError::DeviceNotConnected {
                        name: name.to_owned(),
                    });
                }
                Ok(StatusResponse::Ready { result, available }) => {
                    if result != ResultCode::Success {
                        warn!(%id, ?result, "status update returned non-success result");
                    }
                    debug!(%id, attempts, available, "device status settled");
                    return Ok(available);
                }
                Ok(StatusResponse::NotReady) => debug!(%id, attempts, "service not ready"),
                Err(e) => debug!(%id, attempts, error = %e, "status update failed; retrying"),
            }

            if self
                .config
                .max_status_polls
                .is_some_and(|max| attempts >= max)
            {
                return Err(CoreError::Timeout { attempts });
            }
            tokio::time::sleep(self.config.poll_backoff).await;
        }
    }

    // ── Verification ─────────────────────────────────────────────

    pub fn verification(&self) -> VerificationState {
        *self.verification.borrow()
    }

    pub fn subscribe_verification(&self) -> watch::Receiver<VerificationState> {
        self.verification.subscribe()
    }

    /// Read the current verification state from the status probe.
    /// A failed probe counts as disabled.
    pub async fn probe_verification(&self) -> VerificationState {
        let state = match self.runner.verification_status().await {
            Ok(output) => VerificationState::from_probe_output(&output),
            Err(e) => {
                warn!(error = %e, "verification status probe failed");
                VerificationState::default()
            }
        };
        self.verification.send_replace(state);
        state
    }

    /// Enable or disable biometric verification system-wide.
    ///
    /// Enabling requires at least one enrolled feature across all devices.
    pub async fn set_verification_enabled(
        &self,
        enable: bool,
    ) -> Result<VerificationState, CoreError> {
        if enable {
            let total = self.enrolled_feature_total().await;
            debug!(total, "enrolled features");
            if total == 0 {
                return Err(CoreError::NoFeaturesEnrolled);
            }
        }

        let action = if enable { "enable" } else { "disable" };
        let user = &self.config.user;
        let outcome = match self.runner.set_verification(user, enable).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "verification helper could not run");
                return Err(CoreError::ChangeRejected {
                    action: format!("{action} verification"),
                    code: None,
                });
            }
        };
        if !outcome.success() {
            return Err(CoreError::ChangeRejected {
                action: format!("{action} verification"),
                code: outcome.code,
            });
        }

        let state = VerificationState { enabled: enable };
        self.verification.send_replace(state);
        info!(enabled = enable, %user, "verification updated");
        Ok(state)
    }

    /// Enrolled features of the configured uid on one device.
    pub async fn device_feature_count(&self, device: &DeviceRecord) -> Result<u32, CoreError> {
        self.service.feature_count(device.id, self.config.uid).await
    }

    /// Sum of enrolled features for the configured uid over every device.
    /// Per-device failures count as zero.
    pub async fn enrolled_feature_total(&self) -> u64 {
        let mut total = 0u64;
        for device in self.inventory.all() {
            match self.service.feature_count(device.id, self.config.uid).await {
                Ok(n) => total += u64::from(n),
                Err(e) => warn!(id = %device.id, error = %e, "feature count failed; counting 0"),
            }
        }
        total
    }

    // ── Views ────────────────────────────────────────────────────

    /// Per-biotype counts and availability for the dashboard.
    pub fn summary(&self) -> DeviceSummary {
        let groups = self
            .inventory
            .groups()
            .into_iter()
            .map(|(biotype, devices)| BiotypeSummary {
                biotype,
                total: devices.len(),
                available: devices.iter().filter(|d| d.is_available()).count(),
                devices: devices
                    .iter()
                    .map(|d| (d.short_name.clone(), d.is_available()))
                    .collect(),
            })
            .collect();
        DeviceSummary {
            groups,
            verification_enabled: self.verification().enabled,
        }
    }

    // ── Internals ────────────────────────────────────────────────

    fn device_lock(&self, device: &DeviceRecord) -> Arc<Mutex<()>> {
        let key = (device.biotype, device.short_name.clone());
        Arc::clone(self.device_locks.entry(key).or_default().value())
    }
}
