// Helper process runner
//
// Runs the privileged helpers (`pkexec biometric-config-tool ...`,
// `pkexec bioctl ...`) and the `bioctl status` probe. Arguments are
// passed as a vector, never through a shell.

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::Error;

/// What a finished helper process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Exit code 0 is the only success.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Spawns helper programs, optionally behind an elevation wrapper.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Elevation wrapper prepended to privileged invocations (e.g. `pkexec`).
    elevate: Option<String>,
}

impl ProcessRunner {
    pub fn new(elevate: Option<String>) -> Self {
        Self { elevate }
    }

    /// Run `program args...` as the current user and wait for it.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<ProcessOutput, Error> {
        execute(program, args).await
    }

    /// Run `program args...` through the elevation wrapper, if one is set.
    pub async fn run_privileged(
        &self,
        program: &str,
        args: &[&str],
    ) -> Result<ProcessOutput, Error> {
        match self.elevate.as_deref() {
            Some(wrapper) => {
                let mut full: Vec<&str> = Vec::with_capacity(args.len() + 1);
                full.push(program);
                full.extend_from_slice(args);
                execute(wrapper, &full).await
            }
            None => execute(program, args).await,
        }
    }
}

async fn execute(program: &str, args: &[&str]) -> Result<ProcessOutput, Error> {
    debug!(program, ?args, "spawning helper");
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| Error::Spawn {
            program: program.to_owned(),
            source,
        })?;

    let result = ProcessOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if result.success() {
        debug!(program, "helper succeeded");
    } else {
        warn!(program, code = ?result.code, stderr = %result.stderr.trim(), "helper failed");
    }
    Ok(result)
}
