//! Release catalog core — feed decoding and asset selection.
//!
//! The network round trip lives in `infra::github`; everything here works
//! on plain data or an `io::Read`, so it is testable from byte slices.

use std::fmt;
use std::io;

use serde::Deserialize;
use serde::de::{DeserializeSeed, Deserializer, SeqAccess, Visitor};

use crate::domain::error::CatalogError;
use crate::domain::release::{Architecture, Asset, Release, is_server_asset};

/// Fixed release-index endpoint.
pub const RELEASE_INDEX_URL: &str = "https://api.github.com/repos/frida/frida/releases";

/// Media type requested from the release index.
pub const RELEASE_INDEX_ACCEPT: &str = "application/vnd.github.v3+json";

/// Base URL for the conventional per-version download path.
pub const DOWNLOAD_BASE_URL: &str = "https://github.com/frida/frida/releases/download";

// ── Release index abstraction ─────────────────────────────────────────────────

/// Abstraction over the release index backend, enabling test doubles.
///
/// One fetch per call — there is no caching; re-invoke for fresh data.
pub trait ReleaseIndex {
    /// Fetch and decode the catalog, newest release first.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` when the index is unreachable, answers with
    /// a non-success status, or serves a malformed feed.
    fn releases(&self) -> Result<Vec<Release>, CatalogError>;

    /// Resolve the download URL for `version` on `architecture`.
    ///
    /// Preference: exact architecture match, then name-token match, then
    /// the conventional URL confirmed reachable by a HEAD request.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoDownload` when nothing resolves.
    fn resolve_download_url(
        &self,
        version: &str,
        architecture: Architecture,
    ) -> Result<String, CatalogError>;

    /// Resolve the download URL from the newest release only. No URL
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoDownload` when the newest release has no
    /// matching asset.
    fn latest_download_url(&self, architecture: Architecture) -> Result<String, CatalogError>;
}

// ── Feed rows ─────────────────────────────────────────────────────────────────

/// One raw release object as the index serves it. Unknown fields ignored.
#[derive(Deserialize)]
struct FeedRelease {
    tag_name: String,
    published_at: String,
    #[serde(default)]
    assets: Vec<FeedAsset>,
}

#[derive(Deserialize)]
struct FeedAsset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
}

impl FeedRelease {
    /// Keep qualifying assets and derive their architectures; a release
    /// with zero qualifying assets is dropped entirely.
    fn into_release(self) -> Option<Release> {
        let assets: Vec<Asset> = self
            .assets
            .into_iter()
            .filter(|a| is_server_asset(&a.name))
            .map(|a| Asset {
                architecture: Architecture::from_asset_name(&a.name),
                name: a.name,
                download_url: a.browser_download_url,
                size_bytes: a.size,
            })
            .collect();
        if assets.is_empty() {
            return None;
        }
        Some(Release {
            version: self.tag_name,
            // Date-only portion of the ISO timestamp.
            release_date: self
                .published_at
                .split('T')
                .next()
                .unwrap_or_default()
                .to_string(),
            assets,
        })
    }
}

// ── Streaming decode ──────────────────────────────────────────────────────────

/// Seed that decodes the feed array one element at a time.
///
/// The catalog is large; each raw row is converted (or dropped) as soon as
/// it is read instead of materializing the whole raw payload.
struct ReleaseFeed;

impl<'de> DeserializeSeed<'de> for ReleaseFeed {
    type Value = Vec<Release>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FeedVisitor;

        impl<'de> Visitor<'de> for FeedVisitor {
            type Value = Vec<Release>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of release objects")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut releases = Vec::new();
                while let Some(row) = seq.next_element::<FeedRelease>()? {
                    if let Some(release) = row.into_release() {
                        releases.push(release);
                    }
                }
                Ok(releases)
            }
        }

        deserializer.deserialize_seq(FeedVisitor)
    }
}

/// Decode a release feed from `reader`, preserving newest-first feed order.
///
/// # Errors
///
/// Returns `CatalogError::Parse` when the stream is not a well-formed array
/// of release objects.
pub fn parse_feed(reader: impl io::Read) -> Result<Vec<Release>, CatalogError> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    ReleaseFeed
        .deserialize(&mut de)
        .map_err(|e| CatalogError::Parse(e.to_string()))
}

// ── Asset selection ───────────────────────────────────────────────────────────

/// Pick the asset for `architecture` out of a release.
///
/// Preference order: exact architecture match, then an asset whose name
/// carries the `-android-<architecture>` token. Returns `None` when
/// neither matches.
#[must_use]
pub fn select_asset(release: &Release, architecture: Architecture) -> Option<&Asset> {
    release
        .assets
        .iter()
        .find(|a| a.architecture == architecture)
        .or_else(|| {
            let token = format!("-android-{architecture}");
            release.assets.iter().find(|a| a.name.contains(&token))
        })
}

/// Conventional download URL for a version the catalog does not list.
///
/// The URL must still be confirmed reachable (HEAD) before use.
#[must_use]
pub fn conventional_url(version: &str, architecture: Architecture) -> String {
    format!("{DOWNLOAD_BASE_URL}/{version}/frida-server-{version}-android-{architecture}.xz")
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    const FEED: &str = r#"[
      {
        "tag_name": "16.7.19",
        "published_at": "2025-04-01T10:23:45Z",
        "assets": [
          {
            "name": "frida-server-16.7.19-android-arm64.xz",
            "browser_download_url": "https://example.com/frida-server-16.7.19-android-arm64.xz",
            "size": 12345000
          },
          {
            "name": "frida-gadget-16.7.19-android-arm64.so.xz",
            "browser_download_url": "https://example.com/gadget.xz",
            "size": 99
          }
        ]
      },
      {
        "tag_name": "16.7.18",
        "published_at": "2025-03-20T08:00:00Z",
        "assets": [
          {
            "name": "frida-portal-16.7.18-linux-x86_64.xz",
            "browser_download_url": "https://example.com/portal.xz",
            "size": 1
          }
        ]
      }
    ]"#;

    // -----------------------------------------------------------------------
    // parse_feed
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_feed_end_to_end_scenario() {
        let releases = parse_feed(FEED.as_bytes()).expect("feed parses");
        // The second release has no qualifying asset and is dropped.
        assert_eq!(releases.len(), 1);
        let release = &releases[0];
        assert_eq!(release.version, "16.7.19");
        assert_eq!(release.release_date, "2025-04-01");
        assert_eq!(release.assets.len(), 1);
        let asset = &release.assets[0];
        assert_eq!(asset.architecture, Architecture::Arm64);
        assert_eq!(asset.size_bytes, 12_345_000);
        assert_eq!(
            asset.download_url,
            "https://example.com/frida-server-16.7.19-android-arm64.xz"
        );
    }

    #[test]
    fn test_parse_feed_preserves_feed_order() {
        let feed = r#"[
          {"tag_name":"17.0.0","published_at":"2025-06-01T00:00:00Z","assets":[
            {"name":"frida-server-17.0.0-android-arm.xz","browser_download_url":"u1","size":1}]},
          {"tag_name":"16.9.9","published_at":"2025-05-01T00:00:00Z","assets":[
            {"name":"frida-server-16.9.9-android-arm.xz","browser_download_url":"u2","size":2}]}
        ]"#;
        let releases = parse_feed(feed.as_bytes()).expect("feed parses");
        let versions: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, ["17.0.0", "16.9.9"], "newest-first order kept");
    }

    #[test]
    fn test_parse_feed_empty_array() {
        let releases = parse_feed(b"[]".as_slice()).expect("empty feed parses");
        assert!(releases.is_empty());
    }

    #[test]
    fn test_parse_feed_rejects_non_array() {
        let err = parse_feed(br#"{"message":"rate limited"}"#.as_slice())
            .expect_err("object is not a feed");
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_parse_feed_rejects_truncated_payload() {
        let err = parse_feed(br#"[{"tag_name":"16.7.19""#.as_slice())
            .expect_err("truncated payload");
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_parse_feed_missing_assets_field_drops_release() {
        let feed = r#"[{"tag_name":"16.0.0","published_at":"2025-01-01T00:00:00Z"}]"#;
        let releases = parse_feed(feed.as_bytes()).expect("feed parses");
        assert!(releases.is_empty());
    }

    // -----------------------------------------------------------------------
    // select_asset
    // -----------------------------------------------------------------------

    fn asset(name: &str, architecture: Architecture) -> Asset {
        Asset {
            name: name.to_string(),
            download_url: format!("https://example.com/{name}"),
            architecture,
            size_bytes: 1,
        }
    }

    #[test]
    fn test_select_asset_prefers_exact_architecture() {
        let release = Release {
            version: "16.7.19".to_string(),
            release_date: "2025-04-01".to_string(),
            assets: vec![
                asset("frida-server-16.7.19-android-arm.xz", Architecture::Arm),
                asset("frida-server-16.7.19-android-arm64.xz", Architecture::Arm64),
            ],
        };
        let picked = select_asset(&release, Architecture::Arm64).expect("asset found");
        assert!(picked.name.contains("arm64"));
    }

    #[test]
    fn test_select_asset_falls_back_to_name_token() {
        // Exact match misses (architecture recorded as Unknown), but the
        // name still carries the token.
        let release = Release {
            version: "16.7.19".to_string(),
            release_date: "2025-04-01".to_string(),
            assets: vec![asset(
                "frida-server-16.7.19-ANDROID-android-arm64.xz",
                Architecture::Unknown,
            )],
        };
        let picked = select_asset(&release, Architecture::Arm64).expect("token fallback");
        assert_eq!(picked.architecture, Architecture::Unknown);
    }

    #[test]
    fn test_select_asset_none_when_nothing_matches() {
        let release = Release {
            version: "16.7.19".to_string(),
            release_date: "2025-04-01".to_string(),
            assets: vec![asset("frida-server-16.7.19-android-arm.xz", Architecture::Arm)],
        };
        assert!(select_asset(&release, Architecture::X86_64).is_none());
    }

    // -----------------------------------------------------------------------
    // conventional_url
    // -----------------------------------------------------------------------

    #[test]
    fn test_conventional_url_shape() {
        assert_eq!(
            conventional_url("16.5.9-rc1", Architecture::Arm64),
            "https://github.com/frida/frida/releases/download/16.5.9-rc1/frida-server-16.5.9-rc1-android-arm64.xz"
        );
    }
}
