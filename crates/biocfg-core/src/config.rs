// ── Runtime synchronization configuration ──
//
// These types describe *where* the service lives, *which* helpers to
// run, and *how long* to wait between steps. They never touch disk; the
// CLI builds a `SyncConfig` from `biocfg-config` and hands it in.

use std::time::Duration;

use biocfg_api::{BIOMETRIC_UNIT, ServiceEndpoint};

/// Application API version sent with `CheckAppApiVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion {
    pub major: i32,
    pub minor: i32,
    pub func: i32,
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self {
            major: 0,
            minor: 11,
            func: 1,
        }
    }
}

/// External helper programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperConfig {
    /// Elevation wrapper for privileged helpers. `None` runs them directly.
    pub elevate: Option<String>,
    /// Driver configuration tool (`enable-driver` / `disable-driver`).
    pub config_tool: String,
    /// Verification control tool (`enable` / `disable` / `status`).
    pub bioctl: String,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            elevate: Some("pkexec".into()),
            config_tool: "biometric-config-tool".into(),
            bioctl: "bioctl".into(),
        }
    }
}

/// Everything the `SyncController` needs to run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub endpoint: ServiceEndpoint,
    /// systemd unit restarted after driver changes.
    pub unit: String,
    pub api_version: ApiVersion,
    pub helpers: HelperConfig,
    /// Delay between a service restart and the inventory refresh.
    pub grace_period: Duration,
    /// Delay between confirmation polls.
    pub poll_backoff: Duration,
    /// Cap on confirmation polls. `None` polls until the service answers.
    pub max_status_polls: Option<u32>,
    /// Login name passed to `bioctl enable|disable -u`.
    pub user: String,
    /// Numeric uid used for enrolled-feature counts.
    pub uid: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: ServiceEndpoint::default(),
            unit: BIOMETRIC_UNIT.into(),
            api_version: ApiVersion::default(),
            helpers: HelperConfig::default(),
            grace_period: Duration::from_secs(3),
            poll_backoff: Duration::from_millis(200),
            max_status_polls: None,
            user: String::new(),
            uid: 0,
        }
    }
}
