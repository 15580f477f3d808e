//! Typed domain error enums.
//!
//! One enum per collaborator boundary, mirroring the failure taxonomy of the
//! lifecycle design: network, parse, decompression, privilege, command and
//! state-mismatch failures. All types implement `thiserror::Error` and
//! convert to `anyhow::Error` via the `?` operator. No failure escapes a
//! public operation as anything other than one of these tagged values.

use thiserror::Error;

// ── Release catalog errors ────────────────────────────────────────────────────

/// Errors from the release index client.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("release index returned HTTP {0}")]
    Status(u16),

    #[error("release index unreachable: {0}")]
    Network(String),

    #[error("malformed release feed: {0}")]
    Parse(String),

    #[error("no download found for version {version} ({architecture})")]
    NoDownload {
        version: String,
        architecture: String,
    },

    #[error("invalid version format: {0} (expected e.g. 16.7.19 or 16.5.9-rc1)")]
    InvalidVersion(String),
}

// ── Archive fetch errors ──────────────────────────────────────────────────────

/// Errors from downloading and unpacking a server asset.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download returned HTTP {0}")]
    Status(u16),

    #[error("download failed: {0}")]
    Network(String),

    #[error("corrupt archive: {0}")]
    Decompress(String),

    #[error("archive contains no server binary entry")]
    NoServerEntry,

    #[error("io error while writing binary: {0}")]
    Io(#[from] std::io::Error),
}

// ── Agent controller errors ───────────────────────────────────────────────────

/// Errors from lifecycle operations against the on-device agent server.
///
/// Every variant describes what the post-operation re-probe observed; the
/// probes are the sole source of truth, not the commands that preceded them.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("elevated shell unavailable (is the device rooted?)")]
    PrivilegeUnavailable,

    #[error("server binary not present after install")]
    InstallUnverified,

    #[error("server binary still present after uninstall")]
    RemovalUnverified,

    #[error("server did not come up after start")]
    NotRunningAfterStart,

    #[error("server still running after all termination strategies")]
    StillRunning,
}
