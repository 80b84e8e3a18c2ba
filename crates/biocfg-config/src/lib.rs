//! Configuration for the biocfg CLI.
//!
//! A TOML file at the platform config dir, merged over built-in defaults
//! and `BIOCFG_`-prefixed environment variables, then translated into
//! `biocfg_core::SyncConfig`. Core never reads files; this crate does.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use biocfg_core::{ApiVersion, HelperConfig, SyncConfig};

/// Environment variable prefix. Nested keys use a double underscore:
/// `BIOCFG_SYNC__GRACE_PERIOD=5s`.
pub const ENV_PREFIX: &str = "BIOCFG_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("cannot determine the current user; set `user` in the config file")]
    UnknownUser,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Login name passed to `bioctl -u`. Defaults to the invoking user.
    pub user: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub service: ServiceSection,

    #[serde(default)]
    pub commands: CommandsSection,

    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Where the biometric service lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceSection {
    pub bus_name: String,
    pub object_path: String,
    pub interface: String,
    /// systemd unit restarted after driver changes.
    pub unit: String,
    pub api_major: i32,
    pub api_minor: i32,
    pub api_func: i32,
}

impl Default for ServiceSection {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            bus_name: sync.endpoint.bus_name,
            object_path: sync.endpoint.object_path,
            interface: sync.endpoint.interface,
            unit: sync.unit,
            api_major: sync.api_version.major,
            api_minor: sync.api_version.minor,
            api_func: sync.api_version.func,
        }
    }
}

/// Helper programs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CommandsSection {
    /// Elevation wrapper; an empty string runs helpers directly.
    pub elevate: String,
    pub config_tool: String,
    pub bioctl: String,
}

impl Default for CommandsSection {
    fn default() -> Self {
        let helpers = HelperConfig::default();
        Self {
            elevate: helpers.elevate.unwrap_or_default(),
            config_tool: helpers.config_tool,
            bioctl: helpers.bioctl,
        }
    }
}

/// Timing of the restart / refresh / poll protocol.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncSection {
    /// Wait after a restart before refreshing (humantime, e.g. "3s").
    pub grace_period: String,
    /// Wait between confirmation polls (humantime, e.g. "200ms").
    pub poll_backoff: String,
    /// Give up after this many polls. Absent means never.
    pub max_status_polls: Option<u32>,
}

impl Default for SyncSection {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            grace_period: humantime::format_duration(sync.grace_period).to_string(),
            poll_backoff: humantime::format_duration(sync.poll_backoff).to_string(),
            max_status_polls: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "biocfg", "biocfg").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("biocfg");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from a specific file + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it, creating parent directories.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core ─────────────────────────────────────────────

/// Build the runtime `SyncConfig`, resolving the user and uid.
pub fn to_sync_config(cfg: &Config) -> Result<SyncConfig, ConfigError> {
    let (user, uid) = resolve_user(cfg.user.as_deref())?;
    to_sync_config_for(cfg, user, uid)
}

/// Build the runtime `SyncConfig` for an explicit user.
pub fn to_sync_config_for(cfg: &Config, user: String, uid: u32) -> Result<SyncConfig, ConfigError> {
    let mut sync = SyncConfig::default();

    sync.endpoint.bus_name.clone_from(&cfg.service.bus_name);
    sync.endpoint.object_path.clone_from(&cfg.service.object_path);
    sync.endpoint.interface.clone_from(&cfg.service.interface);
    sync.unit.clone_from(&cfg.service.unit);
    sync.api_version = ApiVersion {
        major: cfg.service.api_major,
        minor: cfg.service.api_minor,
        func: cfg.service.api_func,
    };

    let elevate = cfg.commands.elevate.trim();
    sync.helpers = HelperConfig {
        elevate: (!elevate.is_empty()).then(|| elevate.to_owned()),
        config_tool: non_empty("commands.config_tool", &cfg.commands.config_tool)?,
        bioctl: non_empty("commands.bioctl", &cfg.commands.bioctl)?,
    };

    sync.grace_period = parse_duration("sync.grace_period", &cfg.sync.grace_period)?;
    sync.poll_backoff = parse_duration("sync.poll_backoff", &cfg.sync.poll_backoff)?;
    sync.max_status_polls = match cfg.sync.max_status_polls {
        Some(0) => {
            return Err(ConfigError::Validation {
                field: "sync.max_status_polls".into(),
                reason: "must be at least 1".into(),
            });
        }
        other => other,
    };

    sync.user = user;
    sync.uid = uid;
    Ok(sync)
}

fn non_empty(field: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(value.to_owned())
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{value}': {e}"),
    })
}

// ── User resolution ─────────────────────────────────────────────────

/// Resolve the login name and uid.
///
/// An explicit name is looked up in the passwd database; otherwise the
/// invoking user is used, falling back to `$USER` when the passwd entry
/// is missing.
pub fn resolve_user(explicit: Option<&str>) -> Result<(String, u32), ConfigError> {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        let uid = nix::unistd::User::from_name(name)
            .ok()
            .flatten()
            .map_or_else(|| nix::unistd::getuid().as_raw(), |u| u.uid.as_raw());
        return Ok((name.to_owned(), uid));
    }

    let uid = nix::unistd::getuid();
    if let Some(user) = nix::unistd::User::from_uid(uid).ok().flatten() {
        return Ok((user.name, uid.as_raw()));
    }
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .map(|u| (u, uid.as_raw()))
        .ok_or(ConfigError::UnknownUser)
}
