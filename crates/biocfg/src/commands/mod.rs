//! Command dispatch for commands that need the biometric service.

pub mod config_cmd;
pub mod devices;
pub mod service;
pub mod util;
pub mod verification;

use biocfg_core::SystemSyncController;

use crate::cli::{DevicesArgs, GlobalOpts, ServiceArgs, VerificationArgs};
use crate::error::CliError;

/// Subcommands that talk to the biometric service.
#[derive(Debug)]
pub enum BusCommand {
    Devices(DevicesArgs),
    Verification(VerificationArgs),
    Service(ServiceArgs),
}

/// Start the controller (presence and API checks, initial load), then
/// route to the handler.
pub async fn dispatch(
    cmd: BusCommand,
    controller: &SystemSyncController,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = util::spinner("Loading biometric devices...", global.quiet);
    let started = controller.start().await;
    spinner.finish_and_clear();
    started?;

    match cmd {
        BusCommand::Devices(args) => devices::handle(controller, args, global).await,
        BusCommand::Verification(args) => verification::handle(controller, args, global).await,
        BusCommand::Service(args) => service::handle(controller, args, global).await,
    }
}
