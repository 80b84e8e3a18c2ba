// ── Core error types ──
//
// User-facing errors from biocfg-core. Consumers never see D-Bus error
// names or decode failures directly; the `From<biocfg_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Startup errors ───────────────────────────────────────────────
    #[error("Biometric service '{bus_name}' is not running")]
    ServiceNotRunning { bus_name: String },

    #[error("Biometric service does not support application API {major}.{minor}.{func}")]
    IncompatibleApi { major: i32, minor: i32, func: i32 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Biometric service unavailable: {message}")]
    ServiceUnavailable { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{action} was rejected{}", .code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    ChangeRejected { action: String, code: Option<i32> },

    #[error("Failed to restart {unit}: {reason}")]
    RestartFailed { unit: String, reason: String },

    #[error("Device '{name}' is not connected")]
    DeviceNotConnected { name: String },

    #[error("No available device or no features enrolled")]
    NoFeaturesEnrolled,

    #[error("Device status did not settle after {attempts} polls")]
    Timeout { attempts: u32 },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// D-Bus error name, when the remote answered with an error reply.
        name: Option<String>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Errors that make the panel unusable for this session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ServiceNotRunning { .. } | Self::IncompatibleApi { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<biocfg_api::Error> for CoreError {
    fn from(err: biocfg_api::Error) -> Self {
        if err.is_service_unknown() {
            return CoreError::ServiceUnavailable {
                message: err.to_string(),
            };
        }
        match err {
            biocfg_api::Error::BusConnect(e) => CoreError::ServiceUnavailable {
                message: format!("system bus: {e}"),
            },
            biocfg_api::Error::Bus(e) => CoreError::ServiceUnavailable {
                message: e.to_string(),
            },
            biocfg_api::Error::MethodError {
                method,
                name,
                message,
            } => CoreError::Api {
                message: format!("{method}: {message}"),
                name: Some(name),
            },
            biocfg_api::Error::Decode { method, message } => {
                CoreError::Internal(format!("Unexpected {method} reply: {message}"))
            }
            biocfg_api::Error::Spawn { program, source } => CoreError::Api {
                message: format!("failed to run '{program}': {source}"),
                name: None,
            },
        }
    }
}
