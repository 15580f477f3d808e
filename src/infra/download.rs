//! Download infrastructure — implements `ArtifactFetcher` with `ureq`.

use std::io::Read as _;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::fetcher::{
    ArchiveKind, ArtifactFetcher, mark_executable, unpack,
};
use crate::domain::error::FetchError;
use crate::domain::release::SERVER_PROCESS;

/// Connect/read timeout for asset downloads (assets are tens of MB).
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on a downloaded body.
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// Name of the compressed intermediate while an `.xz` asset unpacks.
const COMPRESSED_NAME: &str = "frida-server.xz";

/// Streams release assets into a local working directory.
pub struct HttpFetcher {
    agent: ureq::Agent,
    work_dir: PathBuf,
}

impl HttpFetcher {
    /// Fetcher writing into `work_dir` (created on demand).
    #[must_use]
    pub fn new(work_dir: PathBuf) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(DOWNLOAD_TIMEOUT)
            .timeout_read(DOWNLOAD_TIMEOUT)
            .build();
        Self { agent, work_dir }
    }

    /// Path the fetched binary will land at.
    #[must_use]
    pub fn binary_path(&self) -> PathBuf {
        self.work_dir.join(SERVER_PROCESS)
    }
}

fn classify(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, _) => FetchError::Status(code),
        ureq::Error::Transport(transport) => FetchError::Network(transport.to_string()),
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<PathBuf, FetchError> {
        let kind = ArchiveKind::classify(url);
        let response = self.agent.get(url).call().map_err(classify)?;

        std::fs::create_dir_all(&self.work_dir)?;
        let dest = self.binary_path();
        let scratch = self.work_dir.join(COMPRESSED_NAME);

        let mut body = response.into_reader().take(MAX_BODY_BYTES);
        unpack(kind, &mut body, &dest, &scratch)?;
        mark_executable(&dest)?;
        Ok(dest)
    }
}
