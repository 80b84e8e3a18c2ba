//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use biocfg_config::ConfigError;
use biocfg_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const SERVICE: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Service ──────────────────────────────────────────────────────
    #[error("The biometric service ({bus_name}) is not running")]
    #[diagnostic(
        code(biocfg::service_not_running),
        help(
            "Start it with: systemctl start biometric-authentication.service\n\
             Then check: biocfg service check"
        )
    )]
    ServiceNotRunning { bus_name: String },

    #[error("The biometric service does not support this client (API {version})")]
    #[diagnostic(
        code(biocfg::incompatible_api),
        help("Update biocfg or the biometric-authentication package so their versions match.")
    )]
    IncompatibleApi { version: String },

    #[error("Biometric service unavailable: {message}")]
    #[diagnostic(
        code(biocfg::service_unavailable),
        help("Check the service with: biocfg service check")
    )]
    ServiceUnavailable { message: String },

    #[error("Failed to restart {unit}: {reason}")]
    #[diagnostic(
        code(biocfg::restart_failed),
        help("Restarting a system unit needs administrator rights. Try: biocfg service restart")
    )]
    RestartFailed { unit: String, reason: String },

    // ── Operations ───────────────────────────────────────────────────
    #[error("{action} was rejected{}", .code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    #[diagnostic(
        code(biocfg::change_rejected),
        help("The privileged helper refused the change or authentication was cancelled.")
    )]
    ChangeRejected { action: String, code: Option<i32> },

    #[error("Device '{name}' is not connected")]
    #[diagnostic(
        code(biocfg::device_not_connected),
        help("Plug the device in, then run: biocfg devices enable {name}")
    )]
    DeviceNotConnected { name: String },

    #[error("There is no available device or no features enrolled")]
    #[diagnostic(
        code(biocfg::no_features),
        help("Enroll at least one biometric feature before enabling verification.")
    )]
    NoFeaturesEnrolled,

    #[error("Device status did not settle after {attempts} polls")]
    #[diagnostic(
        code(biocfg::timeout),
        help("Raise or remove sync.max_status_polls in the config file.")
    )]
    Timeout { attempts: u32 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(biocfg::not_found),
        help("Run: biocfg devices list to see available devices")
    )]
    NotFound { identifier: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(biocfg::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(biocfg::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(biocfg::config))]
    Config(ConfigError),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(biocfg::api))]
    Api { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Serialize(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ServiceNotRunning { .. }
            | Self::IncompatibleApi { .. }
            | Self::ServiceUnavailable { .. }
            | Self::RestartFailed { .. } => exit_code::SERVICE,
            Self::ChangeRejected { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } | Self::DeviceNotConnected { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ConfigExists { .. } | Self::Config(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ServiceNotRunning { bus_name } => CliError::ServiceNotRunning { bus_name },
            CoreError::IncompatibleApi { major, minor, func } => CliError::IncompatibleApi {
                version: format!("{major}.{minor}.{func}"),
            },
            CoreError::ServiceUnavailable { message } => CliError::ServiceUnavailable { message },
            CoreError::RestartFailed { unit, reason } => CliError::RestartFailed { unit, reason },
            CoreError::ChangeRejected { action, code } => CliError::ChangeRejected { action, code },
            CoreError::DeviceNotConnected { name } => CliError::DeviceNotConnected { name },
            CoreError::NoFeaturesEnrolled => CliError::NoFeaturesEnrolled,
            CoreError::Timeout { attempts } => CliError::Timeout { attempts },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Api { message, name } => CliError::Api {
                message: match name {
                    Some(name) => format!("{message} ({name})"),
                    None => message,
                },
            },
            CoreError::Internal(message) => CliError::Api { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
