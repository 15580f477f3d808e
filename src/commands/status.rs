//! `fridactl status` — probe installed/running state and recorded version.

use anyhow::Result;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::ports::PrivilegedShell;
use crate::application::services::controller;

/// Machine-readable status snapshot.
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    /// Whether the elevation probe confirmed root access.
    pub rooted: bool,
    /// Whether the server binary exists at its privileged path.
    pub installed: bool,
    /// Whether a server process is currently alive.
    pub running: bool,
    /// Version recorded by the last install, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Probe all state through the shell. Without root the on-device probes
/// are meaningless, so they are skipped and reported as `false`/absent.
pub async fn gather(shell: &impl PrivilegedShell) -> StatusOutput {
    let rooted = shell.elevated().await;
    if !rooted {
        return StatusOutput {
            rooted,
            installed: false,
            running: false,
            version: None,
        };
    }
    StatusOutput {
        rooted,
        installed: controller::is_installed(shell).await,
        running: controller::is_running(shell).await,
        version: controller::installed_version(shell).await,
    }
}

/// Run `fridactl status`.
///
/// # Errors
///
/// Returns an error only when JSON serialization fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let status = gather(&app.session).await;

    if app.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let ctx = &app.output;
    if !status.rooted {
        ctx.warn("No elevated access — device state cannot be probed.");
        return Ok(());
    }
    ctx.header("Server status");
    ctx.kv("Rooted", "yes");
    ctx.kv("Installed", if status.installed { "yes" } else { "no" });
    ctx.kv("Running", if status.running { "yes" } else { "no" });
    ctx.kv(
        "Version",
        status.version.as_deref().unwrap_or("(not recorded)"),
    );
    Ok(())
}
