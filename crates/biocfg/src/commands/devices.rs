//! Device command handlers.

use serde::Serialize;
use tabled::Tabled;
use tracing::warn;

use biocfg_core::{
    ChangeOutcome, DeviceRecord, DeviceSummary, PrivilegedRunner, ServiceClient, ServiceManager,
    SyncController,
};

use crate::cli::{DeviceSelector, DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    biotype: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    full_name: String,
    #[tabled(rename = "Driver")]
    driver: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl DeviceRow {
    fn new(d: &DeviceRecord, color: bool) -> Self {
        let mute = color && !d.is_available();
        Self {
            id: d.id.to_string(),
            biotype: d.biotype.label().into(),
            name: output::muted(&d.short_name, mute),
            full_name: output::muted(&d.full_name, mute),
            driver: if d.driver_enabled { "enabled" } else { "disabled" }.into(),
            status: output::availability(d.is_available(), color),
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Type")]
    biotype: String,
    #[tabled(rename = "Devices")]
    total: usize,
    #[tabled(rename = "Available")]
    available: usize,
}

/// One device plus the configured user's enrolled-feature count.
#[derive(Serialize)]
struct DeviceDetail {
    #[serde(flatten)]
    device: DeviceRecord,
    /// `None` when the service could not count them.
    features: Option<u32>,
}

fn detail(view: &DeviceDetail, color: bool) -> String {
    let d = &view.device;
    [
        format!("ID:          {}", d.id),
        format!("Name:        {}", d.short_name),
        format!("Description: {}", d.full_name),
        format!("Type:        {}", d.biotype.label()),
        format!(
            "Driver:      {}",
            if d.driver_enabled { "enabled" } else { "disabled" }
        ),
        format!("Status:      {}", output::availability(d.is_available(), color)),
        format!(
            "Features:    {}",
            view.features.map_or_else(|| "-".into(), |n| n.to_string())
        ),
    ]
    .join("\n")
}

fn summary_detail(s: &DeviceSummary, color: bool) -> String {
    let rows: Vec<SummaryRow> = s
        .groups
        .iter()
        .map(|g| SummaryRow {
            biotype: g.biotype.label().into(),
            total: g.total,
            available: g.available,
        })
        .collect();
    let mut out = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();

    for group in s.groups.iter().filter(|g| g.total > 0) {
        out.push_str("\n\n");
        out.push_str(&util::group_heading(group.biotype, group.total));
        for (name, available) in &group.devices {
            out.push_str(&format!(
                "\n  {:<16} {}",
                output::muted(name, color && !available),
                output::availability(*available, color)
            ));
        }
    }
    out.push_str(&format!(
        "\n\nVerification: {}",
        if s.verification_enabled { "Opened" } else { "Closed" }
    ));
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<S, P, M>(
    controller: &SyncController<S, P, M>,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    S: ServiceClient,
    P: PrivilegedRunner,
    M: ServiceManager,
{
    let color = output::should_color(global.color_mode());
    let inventory = controller.inventory();

    match args.command {
        DevicesCommand::List { biotype, available } => {
            let devices: Vec<DeviceRecord> = inventory
                .all()
                .into_iter()
                .filter(|d| biotype.is_none_or(|b| d.biotype == b))
                .filter(|d| !available || d.is_available())
                .collect();
            let out = output::render_list(
                global.output_format(),
                &devices,
                |d| DeviceRow::new(d, color),
                |d| d.short_name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get(selector) => {
            let device = util::resolve_device(inventory, &selector)?;
            let features = match controller.device_feature_count(&device).await {
                Ok(n) => Some(n),
                Err(e) => {
                    warn!(id = %device.id, error = %e, "feature count failed");
                    None
                }
            };
            let view = DeviceDetail { device, features };
            let out = output::render_single(
                global.output_format(),
                &view,
                |v| detail(v, color),
                |v| v.device.short_name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Summary => {
            let summary = controller.summary();
            let out = output::render_single(
                global.output_format(),
                &summary,
                |s| summary_detail(s, color),
                |s| s.total().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Enable(selector) => set_state(controller, &selector, Some(true), global).await,
        DevicesCommand::Disable(selector) => {
            set_state(controller, &selector, Some(false), global).await
        }
        DevicesCommand::Toggle(selector) => set_state(controller, &selector, None, global).await,
    }
}

/// Drive one device to `target` (or flip it when `None`).
async fn set_state<S, P, M>(
    controller: &SyncController<S, P, M>,
    selector: &DeviceSelector,
    target: Option<bool>,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    S: ServiceClient,
    P: PrivilegedRunner,
    M: ServiceManager,
{
    let device = util::resolve_device(controller.inventory(), selector)?;
    if target.is_some_and(|enable| enable == device.is_available()) {
        let state = if device.is_available() { "available" } else { "unavailable" };
        output::print_status(&format!("{} is already {state}", device.short_name), global.quiet);
        return Ok(());
    }

    let prompt = util::DialogPrompt::new(global);
    // A ticking spinner would garble the restart question.
    let spinner = util::spinner(
        &format!("Updating {}...", device.short_name),
        global.quiet || prompt.will_ask(),
    );
    let result = controller.change_device_status(&device, &prompt).await;
    spinner.finish_and_clear();

    match result? {
        ChangeOutcome::Applied { available } => {
            let state = if available > 0 { "available" } else { "unavailable" };
            output::print_status(&format!("{} is now {state}", device.short_name), global.quiet);
        }
        ChangeOutcome::PendingRestart => {
            output::print_status(
                &format!(
                    "Driver for {} updated; run `biocfg service restart` to apply it",
                    device.short_name
                ),
                global.quiet,
            );
        }
    }
    Ok(())
}
