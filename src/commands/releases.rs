//! `fridactl releases` — list catalog versions with server assets.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::catalog::ReleaseIndex as _;

/// Arguments for the releases command.
#[derive(Args, Default)]
pub struct ReleasesArgs {
    /// Show at most this many releases (newest first)
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Run `fridactl releases`.
///
/// # Errors
///
/// Returns an error when the release index is unreachable or malformed.
pub fn run(args: &ReleasesArgs, app: &AppContext) -> Result<()> {
    let mut releases = app.index.releases()?;
    if let Some(limit) = args.limit {
        releases.truncate(limit);
    }

    if app.json {
        println!("{}", serde_json::to_string_pretty(&releases)?);
        return Ok(());
    }

    let ctx = &app.output;
    if releases.is_empty() {
        ctx.info("No releases with server assets found.");
        return Ok(());
    }
    ctx.header("Available releases");
    for release in &releases {
        let archs: Vec<&str> = release
            .assets
            .iter()
            .map(|a| a.architecture.token())
            .collect();
        ctx.kv(
            &format!("{:<14}", release.version),
            &format!("{}  [{}]", release.release_date, archs.join(", ")),
        );
    }
    Ok(())
}
