use thiserror::Error;

/// Top-level error type for the `biocfg-api` crate.
///
/// Covers every failure mode across the surfaces this crate talks to:
/// the system bus, the biometric service, systemd, and the helper
/// processes. `biocfg-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Bus ─────────────────────────────────────────────────────────
    /// Could not connect to the system bus.
    #[error("Cannot connect to the system bus: {0}")]
    BusConnect(#[source] zbus::Error),

    /// Transport-level D-Bus failure (peer vanished, I/O error, bad name, ...).
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    /// The remote side answered with a D-Bus error reply.
    #[error("{method} failed: {name}: {message}")]
    MethodError {
        method: &'static str,
        name: String,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// A reply body did not have the expected shape.
    #[error("Unexpected reply from {method}: {message}")]
    Decode {
        method: &'static str,
        message: String,
    },

    // ── Helper processes ────────────────────────────────────────────
    /// The helper program could not be started at all.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap a zbus failure from a specific method call, unpacking error replies.
    pub(crate) fn from_call(method: &'static str, err: zbus::Error) -> Self {
        match err {
            zbus::Error::MethodError(name, message, _) => Self::MethodError {
                method,
                name: name.to_string(),
                message: message.unwrap_or_default(),
            },
            other => Self::Bus(other),
        }
    }

    /// Returns `true` if the remote answered with an error reply rather
    /// than the call failing in transit.
    pub fn is_method_error(&self) -> bool {
        matches!(self, Self::MethodError { .. })
    }

    /// Returns `true` if the error means nobody currently owns the
    /// destination name (typical while the service is restarting).
    pub fn is_service_unknown(&self) -> bool {
        match self {
            Self::MethodError { name, .. } => {
                name == "org.freedesktop.DBus.Error.ServiceUnknown"
                    || name == "org.freedesktop.DBus.Error.NameHasNoOwner"
            }
            _ => false,
        }
    }
}
