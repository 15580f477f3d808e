//! Provisioning service — resolve, download and install a server build.
//!
//! Imports only from `crate::domain` and the sibling service/port modules.
//! All I/O is routed through the injected abstractions.

use anyhow::{Context, Result};

use crate::application::ports::{PrivilegedShell, ProgressReporter};
use crate::application::services::catalog::{ReleaseIndex, select_asset};
use crate::application::services::controller;
use crate::application::services::fetcher::ArtifactFetcher;
use crate::domain::error::CatalogError;
use crate::domain::release::{Architecture, is_valid_version};

/// What ended up installed on the device.
#[derive(Debug)]
pub struct InstalledServer {
    /// Version recorded in the marker file.
    pub version: String,
    /// Architecture the downloaded asset targets.
    pub architecture: Architecture,
}

/// Resolve a server build, download it, and install it on the device.
///
/// `version: None` installs the newest catalog release. An explicit version
/// must pass the format validator; it may name a version absent from the
/// catalog, in which case the index falls back to the conventional URL.
///
/// # Errors
///
/// Returns the underlying `CatalogError`/`FetchError`/`AgentError`: no
/// elevated access, unresolvable version, failed transfer or unpack, or an
/// install whose re-probe does not see the binary.
pub async fn install_from_index(
    index: &impl ReleaseIndex,
    fetcher: &impl ArtifactFetcher,
    shell: &impl PrivilegedShell,
    reporter: &impl ProgressReporter,
    version: Option<&str>,
    architecture: Architecture,
) -> Result<InstalledServer> {
    controller::ensure_elevated(shell).await?;

    reporter.step("querying release catalog...");
    let (version, url) = match version {
        Some(requested) => {
            if !is_valid_version(requested) {
                return Err(CatalogError::InvalidVersion(requested.to_string()).into());
            }
            let url = index.resolve_download_url(requested, architecture)?;
            (requested.to_string(), url)
        }
        None => {
            let releases = index.releases()?;
            let release = releases.first().context("release catalog is empty")?;
            let asset =
                select_asset(release, architecture).ok_or_else(|| CatalogError::NoDownload {
                    version: release.version.clone(),
                    architecture: architecture.to_string(),
                })?;
            (release.version.clone(), asset.download_url.clone())
        }
    };

    reporter.step(&format!("downloading frida-server {version} ({architecture})..."));
    let local = fetcher
        .fetch(&url)
        .with_context(|| format!("downloading {url}"))?;

    reporter.step(&format!("installing to {}...", controller::SERVER_BINARY_PATH));
    controller::install(shell, &local, &version).await?;
    reporter.success(&format!("frida-server {version} installed"));

    Ok(InstalledServer {
        version,
        architecture,
    })
}
