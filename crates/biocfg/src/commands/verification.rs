//! Verification command handlers.

use serde::Serialize;

use biocfg_core::{
    PrivilegedRunner, ServiceClient, ServiceManager, SyncController, VerificationState,
};

use crate::cli::{GlobalOpts, VerificationArgs, VerificationCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct StatusView {
    enabled: bool,
    status: &'static str,
    note: &'static str,
    user: String,
}

impl StatusView {
    fn new(state: VerificationState, user: &str) -> Self {
        Self {
            enabled: state.enabled,
            status: state.status_text(),
            note: state.note(),
            user: user.to_owned(),
        }
    }
}

fn detail(v: &StatusView) -> String {
    format!("Status: {}\nUser:   {}\n\n{}", v.status, v.user, v.note)
}

pub async fn handle<S, P, M>(
    controller: &SyncController<S, P, M>,
    args: VerificationArgs,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    S: ServiceClient,
    P: PrivilegedRunner,
    M: ServiceManager,
{
    let user = controller.config().user.clone();
    let state = match args.command {
        VerificationCommand::Status => controller.verification(),
        VerificationCommand::Enable => {
            let spinner = util::spinner("Enabling biometric verification...", global.quiet);
            let result = controller.set_verification_enabled(true).await;
            spinner.finish_and_clear();
            result?
        }
        VerificationCommand::Disable => {
            if !util::confirm(
                &format!("Disable biometric verification for {user}?"),
                global.yes,
            )? {
                return Ok(());
            }
            controller.set_verification_enabled(false).await?
        }
    };

    let view = StatusView::new(state, &user);
    let out = output::render_single(global.output_format(), &view, detail, |v| {
        v.status.to_owned()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
