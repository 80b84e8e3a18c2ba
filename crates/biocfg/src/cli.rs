//! Clap derive structures for the `biocfg` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use biocfg_core::Biotype;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// biocfg -- manage biometric authentication devices
#[derive(Debug, Parser)]
#[command(
    name = "biocfg",
    version,
    about = "Manage biometric authentication devices from the command line",
    long_about = "View biometric devices (fingerprint, finger vein, iris, voiceprint),\n\
        toggle device drivers, restart the biometric service, and switch\n\
        biometric verification on or off for the current user.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "BIOCFG_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (default: `defaults.output` from the config file, else table)
    #[arg(long, short = 'o', env = "BIOCFG_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output (default: `defaults.color`, else auto)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Restart the service after driver changes without asking
    #[arg(long, short = 'y', global = true, conflicts_with = "restart_later")]
    pub yes: bool,

    /// Apply driver changes without restarting the service
    #[arg(long, global = true)]
    pub restart_later: bool,
}

impl GlobalOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.unwrap_or_default()
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    #[default]
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and toggle biometric devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Biometric verification for the current user
    #[command(alias = "verify")]
    Verification(VerificationArgs),

    /// The biometric-authentication service
    #[command(alias = "svc")]
    Service(ServiceArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

/// Selects one device by id or short name.
#[derive(Debug, Args)]
pub struct DeviceSelector {
    /// Device id or short name
    pub device: String,

    /// Restrict name lookup to one biometric type
    #[arg(long, short = 't', value_parser = parse_biotype)]
    pub biotype: Option<Biotype>,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List {
        /// Only show one biometric type
        #[arg(long, short = 't', value_parser = parse_biotype)]
        biotype: Option<Biotype>,

        /// Only show available devices
        #[arg(long)]
        available: bool,
    },

    /// Show one device
    Get(DeviceSelector),

    /// Device counts per biometric type
    Summary,

    /// Enable a device driver (no-op if already available)
    Enable(DeviceSelector),

    /// Disable a device driver (no-op if already unavailable)
    Disable(DeviceSelector),

    /// Flip a device between available and unavailable
    Toggle(DeviceSelector),
}

// ── Verification ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VerificationArgs {
    #[command(subcommand)]
    pub command: VerificationCommand,
}

#[derive(Debug, Subcommand)]
pub enum VerificationCommand {
    /// Show whether biometric verification is enabled
    Status,
    /// Enable biometric verification (requires enrolled features)
    Enable,
    /// Disable biometric verification
    Disable,
}

// ── Service ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    /// Restart the service and reload the device list
    Restart,
    /// Check that the service is running and API-compatible
    Check,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

fn parse_biotype(value: &str) -> Result<Biotype, String> {
    value.parse().map_err(|_| {
        format!("unknown biometric type '{value}' (expected fingerprint, fingervein, iris, voiceprint)")
    })
}
