//! `fridactl install` — download and install a server build.

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::services::provision;
use crate::domain::release::Architecture;

/// Arguments for the install command.
#[derive(Args, Default)]
#[command(disable_version_flag = true)]
pub struct InstallArgs {
    /// Version to install, e.g. 16.7.19 (defaults to the newest release)
    pub version: Option<String>,

    /// Target architecture: arm, arm64, x86 or x86_64 (detected when omitted)
    #[arg(long)]
    pub arch: Option<String>,
}

/// Run `fridactl install`.
///
/// # Errors
///
/// Returns an error when the version cannot be resolved, the download or
/// unpack fails, or the install re-probe does not see the binary.
pub async fn run(args: &InstallArgs, app: &AppContext) -> Result<()> {
    let architecture = match args.arch.as_deref() {
        Some(raw) => Architecture::parse(raw).with_context(|| {
            format!("unknown architecture: {raw} (expected arm, arm64, x86 or x86_64)")
        })?,
        None => Architecture::host(),
    };

    let reporter = app.terminal_reporter();
    let installed = provision::install_from_index(
        &app.index,
        &app.fetcher,
        &app.session,
        &reporter,
        args.version.as_deref(),
        architecture,
    )
    .await?;
    drop(reporter);

    let ctx = &app.output;
    ctx.kv("Version", &installed.version);
    ctx.kv("Architecture", installed.architecture.token());
    ctx.kv("Start it", "fridactl start");
    Ok(())
}
