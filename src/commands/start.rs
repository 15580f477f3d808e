//! `fridactl start` — launch the installed server detached.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::controller::{self, StartOutcome};

/// Arguments for the start command.
#[derive(Args, Default)]
pub struct StartArgs {
    /// Flags appended verbatim to the server invocation
    /// (e.g. --flags="-l 0.0.0.0:27042"); not validated or escaped
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub flags: String,
}

/// Run `fridactl start`.
///
/// # Errors
///
/// Returns an error when elevation is unavailable, nothing is installed,
/// or the post-launch re-probe finds no server process.
pub async fn run(args: &StartArgs, app: &AppContext) -> Result<()> {
    let ctx = &app.output;
    controller::ensure_elevated(&app.session).await?;

    if !controller::is_installed(&app.session).await {
        ctx.info("Server is not installed.");
        ctx.kv("Install it", "fridactl install");
        anyhow::bail!("nothing to start");
    }

    match controller::start(&app.session, &args.flags).await? {
        StartOutcome::AlreadyRunning => ctx.info("Server is already running."),
        StartOutcome::Started => ctx.success("Server is running."),
    }
    Ok(())
}
