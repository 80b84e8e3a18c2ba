use serde::Serialize;

/// Whether biometric verification is enabled system-wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerificationState {
    pub enabled: bool,
}

impl VerificationState {
    pub fn status_text(self) -> &'static str {
        if self.enabled { "Opened" } else { "Closed" }
    }

    pub fn note(self) -> &'static str {
        if self.enabled {
            "Biometric Authentication can take over system authentication processes \
             which include Login, LockScreen, sudo/su and Polkit"
        } else {
            "There is no any available biometric device or no features enrolled currently."
        }
    }

    /// Interpret `bioctl status` output.
    pub fn from_probe_output(output: &str) -> Self {
        Self {
            enabled: output.to_ascii_lowercase().contains("enable"),
        }
    }
}
