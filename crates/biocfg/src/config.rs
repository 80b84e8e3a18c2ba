//! CLI configuration: thin wrapper around `biocfg_config`.
//!
//! Adds `--config` path handling and the `[defaults]` fallback for the
//! display flags on top of the shared loader.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use biocfg_config::{Config, Defaults, load_config_from, save_config_to, to_sync_config};

/// Config file in effect: `--config` / `BIOCFG_CONFIG`, else the platform path.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(biocfg_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&active_config_path(global))?)
}

/// Fill `--output` / `--color` from `[defaults]` when neither the flag
/// nor its environment variable was given.
pub fn apply_defaults(global: &mut GlobalOpts, defaults: &Defaults) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = Some(parse_default::<OutputFormat>("defaults.output", &defaults.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_default::<ColorMode>("defaults.color", &defaults.color)?);
    }
    Ok(())
}

fn parse_default<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value.trim(), true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}
