//! Content-addressed media storage under `<root>/media`
//!
//! Files live at `<category>/<sha256>.<ext>`. Identical uploads share one
//! file; rows referencing them stay distinct.

use bantay_common::models::{MediaCategory, MediaKind};
use bantay_common::{Error, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of sniffing an upload's magic bytes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SniffedMedia {
    pub mime_type: &'static str,
    pub extension: &'static str,
    pub kind: MediaKind,
}

/// Identify an image or audio upload from its content
pub fn sniff_media(bytes: &[u8]) -> Result<SniffedMedia> {
    let detected = infer::get(bytes)
        .ok_or_else(|| Error::Validation("Unrecognized file type".to_string()))?;

    let kind = match detected.matcher_type() {
        infer::MatcherType::Image => MediaKind::Image,
        infer::MatcherType::Audio => MediaKind::Audio,
        _ => {
            return Err(Error::Validation(format!(
                "Unsupported file type {}",
                detected.mime_type()
            )))
        }
    };

    Ok(SniffedMedia {
        mime_type: detected.mime_type(),
        extension: detected.extension(),
        kind,
    })
}

/// Like `sniff_media` but only images pass
pub fn sniff_image(bytes: &[u8]) -> Result<SniffedMedia> {
    let sniffed = sniff_media(bytes)?;
    if sniffed.kind != MediaKind::Image {
        return Err(Error::Validation(format!(
            "Expected an image, got {}",
            sniffed.mime_type
        )));
    }
    Ok(sniffed)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    /// Path relative to the media root
    pub relative_path: String,
    pub sha256: String,
    pub byte_size: i64,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` unless an identical file is already stored
    pub async fn store(&self, category: MediaCategory, bytes: &[u8], extension: &str) -> Result<StoredMedia> {
        let sha256 = hex_digest(bytes);
        let relative_path = format!("{}/{}.{}", category.as_str(), sha256, extension);
        let path = self.root.join(&relative_path);

        if tokio::fs::try_exists(&path).await? {
            debug!(path = %path.display(), "Media already stored");
        } else {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            write_atomically(&path, bytes, extension).await?;
            debug!(path = %path.display(), bytes = bytes.len(), "Media stored");
        }

        Ok(StoredMedia {
            relative_path,
            sha256,
            byte_size: bytes.len() as i64,
        })
    }

    /// Absolute path of a stored file
    pub fn resolve(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write to a sibling temp file, then rename into place
///
/// The final path never holds a truncated file; the temp file is removed
/// when either step fails.
async fn write_atomically(path: &Path, bytes: &[u8], extension: &str) -> std::io::Result<()> {
    let tmp = path.with_extension(format!("{}.tmp-{}", extension, uuid::Uuid::new_v4()));

    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp.display(), "Failed to remove temp media file: {}", cleanup);
            }
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Smallest valid PNG header the sniffer recognizes
    pub const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    ];
}

#[cfg(test)]
mod tests {
    use super::test_support::PNG_BYTES;
    use super::*;

    #[test]
    fn test_sniff_png() {
        let sniffed = sniff_image(PNG_BYTES).unwrap();
        assert_eq!(sniffed.mime_type, "image/png");
        assert_eq!(sniffed.extension, "png");
        assert_eq!(sniffed.kind, MediaKind::Image);
    }

    #[test]
    fn test_sniff_rejects_text() {
        assert!(matches!(sniff_media(b"hello world"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_sniff_image_rejects_audio() {
        // "ID3" header marks an MP3
        let mp3 = b"ID3\x03\x00\x00\x00\x00\x00\x00";
        assert_eq!(sniff_media(mp3).unwrap().kind, MediaKind::Audio);
        assert!(matches!(sniff_image(mp3), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_store_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let first = store.store(MediaCategory::CctvDetection, PNG_BYTES, "png").await.unwrap();
        let second = store.store(MediaCategory::CctvDetection, PNG_BYTES, "png").await.unwrap();

        assert_eq!(first, second);
        assert!(first.relative_path.starts_with("cctv_detection/"));
        assert!(first.relative_path.ends_with(".png"));
        assert_eq!(first.sha256.len(), 64);
        let on_disk = std::fs::read(store.resolve(&first.relative_path)).unwrap();
        assert_eq!(on_disk, PNG_BYTES);
    }

    #[test]
    fn test_hex_digest_is_lowercase_sha256() {
        assert_eq!(
            hex_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the final path makes the rename fail
        let target = dir.path().join("occupied.png");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let result = write_atomically(&target, PNG_BYTES, "png").await;
        assert!(result.is_err());

        let leftovers: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
    }
}
