//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use biocfg_core::{Biotype, DeviceInventory, DeviceRecord, RestartDecision, RestartPrompt};

use crate::cli::{DeviceSelector, GlobalOpts};
use crate::error::CliError;

/// Resolve a device by numeric id or short name.
///
/// Names are matched within `--biotype` when given, otherwise across
/// groups in biotype order; the first match wins.
pub fn resolve_device(
    inventory: &DeviceInventory,
    selector: &DeviceSelector,
) -> Result<DeviceRecord, CliError> {
    let snap = inventory.snapshot();
    let in_scope = |d: &&DeviceRecord| selector.biotype.is_none_or(|b| d.biotype == b);

    if let Ok(id) = selector.device.parse::<i32>() {
        if let Some(found) = snap.iter().filter(in_scope).find(|d| d.id.0 == id) {
            return Ok(found.clone());
        }
    }
    snap.iter()
        .filter(in_scope)
        .find(|d| d.short_name == selector.device)
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            identifier: match selector.biotype {
                Some(b) => format!("{b}/{}", selector.device),
                None => selector.device.clone(),
            },
        })
}

/// Spinner on stderr while a blocking call runs. Hidden when quiet or
/// when stderr is not a terminal.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

// ── Restart prompt ──────────────────────────────────────────────────

/// Asks "restart now?" on the terminal, honoring `--yes` and
/// `--restart-later`. Non-interactive sessions without either flag
/// choose Later.
pub struct DialogPrompt {
    yes: bool,
    restart_later: bool,
    interactive: bool,
}

impl DialogPrompt {
    pub fn new(global: &GlobalOpts) -> Self {
        Self {
            yes: global.yes,
            restart_later: global.restart_later,
            interactive: std::io::stdin().is_terminal() && std::io::stderr().is_terminal(),
        }
    }
}

impl DialogPrompt {
    /// Whether `ask` will block on the terminal.
    pub fn will_ask(&self) -> bool {
        self.interactive && !self.yes && !self.restart_later
    }
}

impl RestartPrompt for DialogPrompt {
    fn ask(&self, device: &DeviceRecord, enable: bool) -> RestartDecision {
        if self.restart_later {
            return RestartDecision::Later;
        }
        if self.yes {
            return RestartDecision::Now;
        }
        if !self.interactive {
            debug!("no terminal for restart prompt; deferring restart");
            return RestartDecision::Later;
        }
        let verb = if enable { "enable" } else { "disable" };
        let answer = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Restart the biometric service now to {verb} {}?",
                device.short_name
            ))
            .default(true)
            .interact();
        match answer {
            Ok(true) => RestartDecision::Now,
            Ok(false) => RestartDecision::Later,
            Err(e) => {
                debug!(error = %e, "restart prompt failed; deferring restart");
                RestartDecision::Later
            }
        }
    }
}

/// Heading for one biotype group.
pub fn group_heading(biotype: Biotype, count: usize) -> String {
    format!("{} ({count})", biotype.label())
}
