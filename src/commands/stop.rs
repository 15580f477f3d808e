//! `fridactl stop` — terminate the running server.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::controller;

/// Run `fridactl stop`.
///
/// # Errors
///
/// Returns an error when elevation is unavailable or the server survives
/// every termination strategy.
pub async fn run(app: &AppContext) -> Result<()> {
    let ctx = &app.output;
    controller::ensure_elevated(&app.session).await?;

    if !controller::is_running(&app.session).await {
        ctx.info("Server is not running.");
        return Ok(());
    }

    ctx.info("Stopping server...");
    controller::stop(&app.session).await?;
    ctx.success("Server stopped.");
    Ok(())
}
