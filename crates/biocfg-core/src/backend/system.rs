// ── System-bus and helper-process collaborators ──

use biocfg_api::{BiometricClient, ProcessRunner, SystemdClient};
use tracing::{debug, warn};

use super::{
    ExitOutcome, PrivilegedRunner, RestartDecision, RestartPrompt, ServiceClient, ServiceManager,
};
use crate::config::HelperConfig;
use crate::error::CoreError;
use crate::model::{DeviceId, DeviceList, DeviceRecord, StatusResponse};

// ── Biometric service over D-Bus ─────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DbusService {
    client: BiometricClient,
}

impl DbusService {
    pub fn new(client: BiometricClient) -> Self {
        Self { client }
    }
}

impl ServiceClient for DbusService {
    async fn service_exists(&self) -> Result<bool, CoreError> {
        Ok(self.client.service_exists().await?)
    }

    async fn check_api_compatibility(
        &self,
        major: i32,
        minor: i32,
        func: i32,
    ) -> Result<bool, CoreError> {
        let result = self.client.check_app_api_version(major, minor, func).await?;
        Ok(result == 0)
    }

    async fn fetch_device_list(&self) -> Result<DeviceList, CoreError> {
        Ok(self.client.get_drv_list().await?.into())
    }

    async fn update_device_status(&self, id: DeviceId) -> Result<StatusResponse, CoreError> {
        Ok(self.client.update_status(id.0).await?.into())
    }

    async fn feature_count(&self, id: DeviceId, uid: u32) -> Result<u32, CoreError> {
        let uid = i32::try_from(uid).map_err(|_| CoreError::Config {
            message: format!("uid {uid} does not fit the service's uid type"),
        })?;
        let count = self.client.feature_count(id.0, uid).await?;
        Ok(u32::try_from(count).unwrap_or(0))
    }
}

// ── Helper programs ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HelperCommands {
    runner: ProcessRunner,
    config_tool: String,
    bioctl: String,
}

impl HelperCommands {
    pub fn new(config: &HelperConfig) -> Self {
        Self {
            runner: ProcessRunner::new(config.elevate.clone()),
            config_tool: config.config_tool.clone(),
            bioctl: config.bioctl.clone(),
        }
    }
}

impl PrivilegedRunner for HelperCommands {
    async fn set_driver_enabled(
        &self,
        short_name: &str,
        enable: bool,
    ) -> Result<ExitOutcome, CoreError> {
        let action = if enable { "enable-driver" } else { "disable-driver" };
        let out = self
            .runner
            .run_privileged(&self.config_tool, &[action, short_name])
            .await?;
        Ok(ExitOutcome { code: out.code })
    }

    async fn set_verification(&self, user: &str, enable: bool) -> Result<ExitOutcome, CoreError> {
        let action = if enable { "enable" } else { "disable" };
        let out = self
            .runner
            .run_privileged(&self.bioctl, &[action, "-u", user])
            .await?;
        Ok(ExitOutcome { code: out.code })
    }

    async fn verification_status(&self) -> Result<String, CoreError> {
        let out = self.runner.run(&self.bioctl, &["status"]).await?;
        debug!(stdout = %out.stdout.trim(), "verification status probe");
        if !out.success() {
            warn!(code = ?out.code, "status probe exited non-zero");
        }
        Ok(out.stdout)
    }
}

// ── systemd ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SystemdManager {
    client: SystemdClient,
    unit: String,
}

impl SystemdManager {
    pub fn new(client: SystemdClient, unit: impl Into<String>) -> Self {
        Self {
            client,
            unit: unit.into(),
        }
    }
}

impl ServiceManager for SystemdManager {
    async fn restart_service(&self) -> Result<(), CoreError> {
        self.client.restart_unit(&self.unit).await?;
        Ok(())
    }
}

// ── Non-interactive prompt ───────────────────────────────────────────

/// Answers every restart question the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrompt(pub RestartDecision);

impl RestartPrompt for FixedPrompt {
    fn ask(&self, _device: &DeviceRecord, _enable: bool) -> RestartDecision {
        self.0
    }
}
