//! `fridactl uninstall` — remove the server binary and version marker.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::controller;

/// Run `fridactl uninstall`.
///
/// # Errors
///
/// Returns an error when elevation is unavailable or the binary is still
/// present after removal.
pub async fn run(app: &AppContext) -> Result<()> {
    let ctx = &app.output;
    controller::ensure_elevated(&app.session).await?;

    if !controller::is_installed(&app.session).await {
        ctx.info("Server is not installed; nothing to remove.");
        return Ok(());
    }

    ctx.info("Removing server binary and version marker...");
    controller::uninstall(&app.session).await?;
    ctx.success("Server uninstalled.");
    Ok(())
}
