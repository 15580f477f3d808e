//! Release index infrastructure — implements `ReleaseIndex` over the
//! GitHub releases API with `ureq`.

use std::io::BufReader;
use std::io::Read as _;
use std::time::Duration;

use crate::application::services::catalog::{
    self, RELEASE_INDEX_ACCEPT, RELEASE_INDEX_URL, ReleaseIndex,
};
use crate::domain::error::CatalogError;
use crate::domain::release::{Architecture, Release};

/// Connect/read timeout for catalog requests.
const CATALOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on the feed payload; a feed this large is malformed.
const MAX_FEED_BYTES: u64 = 64 * 1024 * 1024;

/// Queries the fixed GitHub releases endpoint.
pub struct GithubReleaseIndex {
    agent: ureq::Agent,
    endpoint: String,
}

impl GithubReleaseIndex {
    /// Index client against the production endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(RELEASE_INDEX_URL)
    }

    /// Index client against an arbitrary endpoint (for testing).
    #[must_use]
    pub fn with_endpoint(endpoint: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CATALOG_TIMEOUT)
            .timeout_read(CATALOG_TIMEOUT)
            .build();
        Self {
            agent,
            endpoint: endpoint.to_string(),
        }
    }

    /// HEAD-check a constructed URL; HTTP success or a redirect status both
    /// count as confirmation that the artifact exists.
    fn head_confirms(&self, url: &str) -> bool {
        match self.agent.head(url).call() {
            Ok(_) => true,
            Err(ureq::Error::Status(code, _)) => (300..400).contains(&code),
            Err(ureq::Error::Transport(_)) => false,
        }
    }
}

impl Default for GithubReleaseIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(err: ureq::Error) -> CatalogError {
    match err {
        ureq::Error::Status(code, _) => CatalogError::Status(code),
        ureq::Error::Transport(transport) => CatalogError::Network(transport.to_string()),
    }
}

impl ReleaseIndex for GithubReleaseIndex {
    fn releases(&self) -> Result<Vec<Release>, CatalogError> {
        let response = self
            .agent
            .get(&self.endpoint)
            .set("Accept", RELEASE_INDEX_ACCEPT)
            .call()
            .map_err(classify)?;
        catalog::parse_feed(BufReader::new(response.into_reader().take(MAX_FEED_BYTES)))
    }

    fn resolve_download_url(
        &self,
        version: &str,
        architecture: Architecture,
    ) -> Result<String, CatalogError> {
        let releases = self.releases()?;
        if let Some(release) = releases.iter().find(|r| r.version == version)
            && let Some(asset) = catalog::select_asset(release, architecture)
        {
            return Ok(asset.download_url.clone());
        }
        // Asset matching came up empty (typically a user-entered version the
        // catalog does not list): fall back to the conventional URL,
        // confirmed reachable before anyone downloads it.
        let url = catalog::conventional_url(version, architecture);
        if self.head_confirms(&url) {
            Ok(url)
        } else {
            Err(CatalogError::NoDownload {
                version: version.to_string(),
                architecture: architecture.to_string(),
            })
        }
    }

    fn latest_download_url(&self, architecture: Architecture) -> Result<String, CatalogError> {
        let releases = self.releases()?;
        // Newest release is the first feed element; no URL fallback here.
        releases
            .first()
            .and_then(|release| catalog::select_asset(release, architecture))
            .map(|asset| asset.download_url.clone())
            .ok_or_else(|| CatalogError::NoDownload {
                version: "latest".to_string(),
                architecture: architecture.to_string(),
            })
    }
}
