mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use biocfg_core::SyncController;

use crate::cli::{Cli, Command, ConfigCommand};
use crate::commands::BusCommand;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    let cmd = match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "biocfg", &mut std::io::stdout());
            return Ok(());
        }

        // Config commands don't need the service. Only `show` renders the
        // file, so `path` and `init` still work when it is broken.
        Command::Config(args) => {
            if matches!(args.command, ConfigCommand::Show) {
                let cfg = config::load(&cli.global)?;
                config::apply_defaults(&mut cli.global, &cfg.defaults)?;
            }
            return commands::config_cmd::handle(args, &cli.global);
        }

        Command::Devices(args) => BusCommand::Devices(args),
        Command::Verification(args) => BusCommand::Verification(args),
        Command::Service(args) => BusCommand::Service(args),
    };

    // Everything else talks to the biometric service
    let cfg = config::load(&cli.global)?;
    config::apply_defaults(&mut cli.global, &cfg.defaults)?;
    let sync_config = config::to_sync_config(&cfg)?;
    let controller = SyncController::connect_system(sync_config).await?;

    tracing::debug!(command = ?cmd, "dispatching command");
    commands::dispatch(cmd, &controller, &cli.global).await
}
