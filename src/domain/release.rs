//! Release domain types and pure validation functions.
//!
//! This module is intentionally free of I/O, async, and external layer
//! imports. All functions take data in and return data out.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Asset names must carry this prefix to qualify as server binaries.
pub const SERVER_ASSET_PREFIX: &str = "frida-server-";

/// Recognized archive suffixes for server assets.
pub const SERVER_ASSET_SUFFIXES: [&str; 2] = [".xz", ".zip"];

/// Process name of the agent server, used by every probe and kill command.
pub const SERVER_PROCESS: &str = "frida-server";

/// CPU architecture a server asset targets.
///
/// `arm64` is ordered before `arm` (and `x86_64` before `x86`) in the token
/// pattern so the longer token wins: `…-android-arm64.xz` is `Arm64`, not
/// `Arm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    Arm,
    Arm64,
    X86,
    X86_64,
    Unknown,
}

#[allow(clippy::expect_used)] // compile-time constant pattern
static ARCH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"android-(arm64|arm|x86_64|x86)").expect("valid arch pattern"));

#[allow(clippy::expect_used)] // compile-time constant pattern
static VERSION_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(-[a-zA-Z0-9]+)?$").expect("valid version pattern")
});

impl Architecture {
    /// Derive the architecture from an asset name.
    ///
    /// Returns `Unknown` when no `android-<arch>` token is present.
    #[must_use]
    pub fn from_asset_name(name: &str) -> Self {
        match ARCH_TOKEN.captures(name).map(|c| c.get(1)) {
            Some(Some(m)) => match m.as_str() {
                "arm" => Self::Arm,
                "arm64" => Self::Arm64,
                "x86" => Self::X86,
                "x86_64" => Self::X86_64,
                _ => Self::Unknown,
            },
            _ => Self::Unknown,
        }
    }

    /// Parse a user-supplied architecture string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "arm" => Some(Self::Arm),
            "arm64" => Some(Self::Arm64),
            "x86" => Some(Self::X86),
            "x86_64" => Some(Self::X86_64),
            _ => None,
        }
    }

    /// Detect the architecture of the device this process runs on.
    ///
    /// Mirrors the ABI mapping of the original launcher: anything
    /// unrecognized falls back to `arm`.
    #[must_use]
    pub fn host() -> Self {
        match std::env::consts::ARCH {
            "aarch64" => Self::Arm64,
            "x86" => Self::X86,
            "x86_64" => Self::X86_64,
            _ => Self::Arm,
        }
    }

    /// The token used in asset names and download URLs.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A downloadable server binary attached to a release.
#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    /// Asset file name, e.g. `frida-server-16.7.19-android-arm64.xz`.
    pub name: String,
    /// Direct download URL.
    pub download_url: String,
    /// Architecture derived from the asset name.
    pub architecture: Architecture,
    /// Asset size in bytes as reported by the feed.
    pub size_bytes: u64,
}

/// A published release with at least one qualifying server asset.
///
/// Releases preserve the feed's newest-first order; the latest release is
/// the first element of any list produced from the feed.
#[derive(Debug, Clone, Serialize)]
pub struct Release {
    /// Version tag, e.g. `16.7.19`.
    pub version: String,
    /// Date-only portion of the publish timestamp (substring before `T`).
    pub release_date: String,
    /// Qualifying assets, in feed order.
    pub assets: Vec<Asset>,
}

/// Whether an asset name qualifies as a server binary: fixed prefix plus
/// one of the recognized archive suffixes.
#[must_use]
pub fn is_server_asset(name: &str) -> bool {
    name.starts_with(SERVER_ASSET_PREFIX)
        && SERVER_ASSET_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Validates a user-entered version string.
///
/// Accepts `major.minor.patch` with an optional `-alphanumeric` suffix:
/// `16.7.19` and `16.5.9-rc1` pass; `16.7`, `v16.7.19` and `16.7.19.` do
/// not.
#[must_use]
pub fn is_valid_version(version: &str) -> bool {
    VERSION_FORMAT.is_match(version)
}
