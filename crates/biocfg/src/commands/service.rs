//! Service command handlers.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use biocfg_core::{PrivilegedRunner, ServiceClient, ServiceManager, SyncController};

use crate::cli::{GlobalOpts, ServiceArgs, ServiceCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct ServiceView {
    bus_name: String,
    unit: String,
    running: bool,
    devices: usize,
    last_refresh: Option<DateTime<Utc>>,
}

fn detail(v: &ServiceView) -> String {
    [
        format!("Service:      {}", v.bus_name),
        format!("Unit:         {}", v.unit),
        format!("Running:      {}", if v.running { "yes" } else { "no" }),
        format!("Devices:      {}", v.devices),
        format!(
            "Last refresh: {}",
            v.last_refresh.map_or_else(
                || "-".into(),
                |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
            )
        ),
    ]
    .join("\n")
}

pub async fn handle<S, P, M>(
    controller: &SyncController<S, P, M>,
    args: ServiceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    S: ServiceClient,
    P: PrivilegedRunner,
    M: ServiceManager,
{
    if let ServiceCommand::Restart = args.command {
        if !util::confirm("Restart the biometric service?", global.yes)? {
            return Ok(());
        }
        let spinner = util::spinner("Restarting biometric service...", global.quiet);
        let result = controller.restart_and_refresh().await;
        spinner.finish_and_clear();
        let count = result?;
        output::print_status(
            &format!("Service restarted; {count} device(s) loaded"),
            global.quiet,
        );
    }

    // `start()` already verified presence and API compatibility.
    let inventory = controller.inventory();
    let view = ServiceView {
        bus_name: controller.config().endpoint.bus_name.clone(),
        unit: controller.config().unit.clone(),
        running: true,
        devices: inventory.len(),
        last_refresh: inventory.last_refresh(),
    };
    let out = output::render_single(global.output_format(), &view, detail, |v| {
        v.bus_name.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
