//! Archive fetcher core — container classification and streaming unpack.
//!
//! The HTTP transfer lives in `infra::download`; this module turns a byte
//! stream of a known container kind into the final server binary on disk.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use xz2::read::XzDecoder;

use crate::domain::error::FetchError;
use crate::domain::release::SERVER_PROCESS;

/// Abstraction over the artifact download backend, enabling test doubles.
pub trait ArtifactFetcher {
    /// Download `url` and produce the executable server binary locally.
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` when the transfer, the unpack stage, or the
    /// permission change fails. On failure no (possibly corrupt) binary is
    /// left behind by the unpack stage.
    fn fetch(&self, url: &str) -> Result<std::path::PathBuf, FetchError>;
}

/// Container format of a downloaded asset, decided once from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// The body is the binary itself.
    Raw,
    /// Single LZMA/XZ stream wrapping the binary.
    Xz,
    /// Zip archive; the binary is the first entry whose name contains
    /// the server process name.
    Zip,
}

impl ArchiveKind {
    /// Classify a download URL by its file extension.
    #[must_use]
    pub fn classify(url: &str) -> Self {
        if url.ends_with(".xz") {
            Self::Xz
        } else if url.ends_with(".zip") {
            Self::Zip
        } else {
            Self::Raw
        }
    }
}

/// Fixed-size copy buffer; decompression never buffers a whole payload.
const COPY_BUF_LEN: usize = 8 * 1024;

fn copy_bounded(reader: &mut impl Read, writer: &mut impl Write) -> io::Result<u64> {
    let mut buf = [0u8; COPY_BUF_LEN];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(total);
        }
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
}

/// Stream `body` through the strategy for `kind`, producing `dest`.
///
/// `scratch` is only used for `Xz`, which lands the compressed bytes on
/// disk before decompressing them.
///
/// # Errors
///
/// Propagates the per-strategy errors below; `Raw` fails only on I/O.
pub fn unpack(
    kind: ArchiveKind,
    body: &mut impl Read,
    dest: &Path,
    scratch: &Path,
) -> Result<(), FetchError> {
    match kind {
        ArchiveKind::Raw => write_raw(body, dest),
        ArchiveKind::Zip => unpack_zip(body, dest),
        ArchiveKind::Xz => {
            if let Err(e) = write_raw(body, scratch) {
                let _ = std::fs::remove_file(scratch);
                return Err(e);
            }
            unpack_xz(scratch, dest)
        }
    }
}

/// Copy the stream to `dest` unchanged.
///
/// # Errors
///
/// Returns `FetchError::Io` when the stream or the destination file fails.
pub fn write_raw(body: &mut impl Read, dest: &Path) -> Result<(), FetchError> {
    let mut out = File::create(dest)?;
    copy_bounded(body, &mut out)?;
    Ok(())
}

/// Decompress the XZ file at `compressed` into `dest`, byte for byte.
///
/// The compressed intermediate is deleted in every outcome. On failure the
/// partially-written `dest` is deleted too — a corrupt binary is never left
/// in place.
///
/// # Errors
///
/// Returns `FetchError::Decompress` for a corrupt stream, `FetchError::Io`
/// when the files cannot be opened or created.
pub fn unpack_xz(compressed: &Path, dest: &Path) -> Result<(), FetchError> {
    let outcome: Result<(), FetchError> = (|| {
        let src = File::open(compressed)?;
        let mut decoder = XzDecoder::new(BufReader::new(src));
        let mut out = File::create(dest)?;
        copy_bounded(&mut decoder, &mut out)
            .map_err(|e| FetchError::Decompress(e.to_string()))?;
        Ok(())
    })();
    let _ = std::fs::remove_file(compressed);
    if outcome.is_err() {
        let _ = std::fs::remove_file(dest);
    }
    outcome
}

/// Scan zip entries in stream order; the first entry whose name contains
/// the server process name is streamed out to `dest` and scanning stops.
///
/// # Errors
///
/// Returns `FetchError::NoServerEntry` when no entry matches, and
/// `FetchError::Decompress` for a malformed archive.
pub fn unpack_zip(body: &mut impl Read, dest: &Path) -> Result<(), FetchError> {
    loop {
        match zip::read::read_zipfile_from_stream(body) {
            Ok(Some(mut entry)) => {
                if entry.name().contains(SERVER_PROCESS) {
                    let mut out = File::create(dest)?;
                    copy_bounded(&mut entry, &mut out)
                        .map_err(|e| FetchError::Decompress(e.to_string()))?;
                    return Ok(());
                }
                // Dropping the entry skips its remaining bytes.
            }
            Ok(None) => return Err(FetchError::NoServerEntry),
            Err(e) => return Err(FetchError::Decompress(e.to_string())),
        }
    }
}

/// Mark the produced binary executable (`rwxr-xr-x`).
///
/// # Errors
///
/// Returns `FetchError::Io` when permissions cannot be set.
#[cfg(unix)]
pub fn mark_executable(path: &Path) -> Result<(), FetchError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn mark_executable(_path: &Path) -> Result<(), FetchError> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::io::Cursor;

    use super::*;

    // -----------------------------------------------------------------------
    // Fixture helpers
    // -----------------------------------------------------------------------

    fn xz_bytes(payload: &[u8]) -> Vec<u8> {
        use std::io::Write as _;
        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
        encoder.write_all(payload).expect("encode payload");
        encoder.finish().expect("finish xz stream")
    }

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        use std::io::Write as _;
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            writer.start_file(*name, options).expect("start entry");
            writer.write_all(data).expect("write entry");
        }
        writer.finish().expect("finish archive").into_inner()
    }

    // -----------------------------------------------------------------------
    // ArchiveKind::classify
    // -----------------------------------------------------------------------

    #[test]
    fn test_classify_xz() {
        let url = "https://example.com/frida-server-16.7.19-android-arm64.xz";
        assert_eq!(ArchiveKind::classify(url), ArchiveKind::Xz);
    }

    #[test]
    fn test_classify_zip() {
        let url = "https://example.com/frida-server-16.7.19-windows-x86_64.zip";
        assert_eq!(ArchiveKind::classify(url), ArchiveKind::Zip);
    }

    #[test]
    fn test_classify_bare_binary() {
        let url = "https://example.com/frida-server";
        assert_eq!(ArchiveKind::classify(url), ArchiveKind::Raw);
    }

    // -----------------------------------------------------------------------
    // unpack_xz
    // -----------------------------------------------------------------------

    #[test]
    fn test_unpack_xz_round_trip_removes_intermediate() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let compressed = dir.path().join("server.xz");
        let dest = dir.path().join("server");
        std::fs::write(&compressed, xz_bytes(b"ELF pretend binary")).expect("write fixture");

        unpack_xz(&compressed, &dest).expect("decompress");

        let produced = std::fs::read(&dest).expect("read dest");
        assert_eq!(produced, b"ELF pretend binary");
        assert!(!compressed.exists(), "intermediate must be deleted");
    }

    #[test]
    fn test_unpack_xz_corrupt_stream_leaves_nothing_behind() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let compressed = dir.path().join("server.xz");
        let dest = dir.path().join("server");
        std::fs::write(&compressed, b"definitely not an xz stream").expect("write fixture");

        let err = unpack_xz(&compressed, &dest).expect_err("corrupt stream must fail");
        assert!(matches!(err, FetchError::Decompress(_)));
        assert!(!compressed.exists(), "intermediate must be deleted on failure");
        assert!(!dest.exists(), "no corrupt binary may be left in place");
    }

    #[test]
    fn test_unpack_xz_truncated_stream_cleans_up_partial_output() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let compressed = dir.path().join("server.xz");
        let dest = dir.path().join("server");
        let mut bytes = xz_bytes(&[0xAA; 64 * 1024]);
        bytes.truncate(bytes.len() / 2);
        std::fs::write(&compressed, bytes).expect("write fixture");

        let err = unpack_xz(&compressed, &dest).expect_err("truncated stream must fail");
        assert!(matches!(err, FetchError::Decompress(_)));
        assert!(!dest.exists());
    }

    // -----------------------------------------------------------------------
    // unpack_zip
    // -----------------------------------------------------------------------

    #[test]
    fn test_unpack_zip_extracts_first_matching_entry() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let dest = dir.path().join("server");
        let archive = zip_bytes(&[
            ("README.txt", b"docs".as_slice()),
            ("frida-server", b"first match".as_slice()),
            ("extra/frida-server.bak", b"second match".as_slice()),
        ]);

        unpack_zip(&mut Cursor::new(archive), &dest).expect("extract");

        let produced = std::fs::read(&dest).expect("read dest");
        assert_eq!(produced, b"first match", "scan must stop at the first match");
    }

    #[test]
    fn test_unpack_zip_no_matching_entry() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let dest = dir.path().join("server");
        let archive = zip_bytes(&[("README.txt", b"docs".as_slice())]);

        let err = unpack_zip(&mut Cursor::new(archive), &dest).expect_err("no entry");
        assert!(matches!(err, FetchError::NoServerEntry));
        assert!(!dest.exists(), "no output file on a miss");
    }

    #[test]
    fn test_unpack_zip_garbage_is_decompress_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let dest = dir.path().join("server");
        let err = unpack_zip(&mut Cursor::new(b"not a zip".to_vec()), &dest)
            .expect_err("garbage archive");
        assert!(matches!(err, FetchError::Decompress(_)));
    }

    // -----------------------------------------------------------------------
    // unpack dispatch + raw path
    // -----------------------------------------------------------------------

    #[test]
    fn test_unpack_raw_copies_body_verbatim() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let dest = dir.path().join("server");
        let scratch = dir.path().join("server.xz");

        unpack(
            ArchiveKind::Raw,
            &mut Cursor::new(b"raw body".to_vec()),
            &dest,
            &scratch,
        )
        .expect("raw copy");

        assert_eq!(std::fs::read(&dest).expect("read dest"), b"raw body");
        assert!(!scratch.exists(), "raw path never touches scratch");
    }

    #[test]
    fn test_unpack_xz_dispatch_uses_scratch_then_removes_it() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let dest = dir.path().join("server");
        let scratch = dir.path().join("server.xz");

        unpack(
            ArchiveKind::Xz,
            &mut Cursor::new(xz_bytes(b"payload")),
            &dest,
            &scratch,
        )
        .expect("xz dispatch");

        assert_eq!(std::fs::read(&dest).expect("read dest"), b"payload");
        assert!(!scratch.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_mark_executable_sets_rwxr_xr_x() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("server");
        std::fs::write(&path, b"bin").expect("write file");

        mark_executable(&path).expect("chmod");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
