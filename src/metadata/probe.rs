use anyhow::{Context, Result};
use nom_exif::MediaSource;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected by the signature fallback.
const SIGNATURE_LEN: u64 = 16;

/// The media kind of a file, determined from its content.
///
/// Only images and videos are organized; everything else is skipped. Detection looks at
/// the content of the file, never at its extension.
///
/// # Example
///
/// ```rust
/// use photo_mover::metadata::MediaKind;
///
/// let gif = b"GIF89a\x01\x00\x01\x00";
/// assert_eq!(MediaKind::from_signature(gif), Some(MediaKind::Image));
/// assert_eq!(MediaKind::from_signature(b"hello world"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify the file at `path`.
    ///
    /// Formats known to nom-exif (JPEG, TIFF and RAW, HEIF/HEIC, ISO-BMFF and QuickTime
    /// video, Matroska) are classified by whether they carry tracks. Anything nom-exif
    /// does not recognize goes through [`MediaKind::from_signature`].
    ///
    /// Returns `Ok(None)` for content that is neither an image nor a video.
    pub fn probe(path: &Path) -> Result<Option<Self>> {
        std::fs::metadata(path)
            .with_context(|| format!("Failed to read file attributes of {}", path.display()))?;

        match MediaSource::file_path(path) {
            Ok(ms) if ms.has_track() => Ok(Some(Self::Video)),
            Ok(ms) if ms.has_exif() => Ok(Some(Self::Image)),
            Ok(_) => Ok(None),
            Err(e) => {
                log::debug!("nom-exif does not recognize {}: {e}", path.display());
                Self::sniff(path)
            }
        }
    }

    fn sniff(path: &Path) -> Result<Option<Self>> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut head = Vec::new();
        file.take(SIGNATURE_LEN)
            .read_to_end(&mut head)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_signature(&head))
    }

    /// Classify by leading bytes, for the formats nom-exif leaves out: PNG, GIF, BMP,
    /// WebP and AVI.
    pub fn from_signature(head: &[u8]) -> Option<Self> {
        if head.starts_with(b"\x89PNG\r\n\x1a\n")
            || head.starts_with(b"GIF87a")
            || head.starts_with(b"GIF89a")
            || head.starts_with(b"BM")
        {
            return Some(Self::Image);
        }
        if head.len() >= 12 && &head[0..4] == b"RIFF" {
            return match &head[8..12] {
                b"WEBP" => Some(Self::Image),
                b"AVI " => Some(Self::Video),
                _ => None,
            };
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── from_signature ───────────────────────────────────────────────

    #[test]
    fn signature_images() {
        assert_eq!(MediaKind::from_signature(b"\x89PNG\r\n\x1a\n...."), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_signature(b"GIF87a"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_signature(b"BM\x36\0\0\0"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_signature(b"RIFF\0\0\0\0WEBPVP8 "), Some(MediaKind::Image));
    }

    #[test]
    fn signature_avi_is_video() {
        assert_eq!(MediaKind::from_signature(b"RIFF\0\0\0\0AVI LIST"), Some(MediaKind::Video));
    }

    #[test]
    fn signature_unrecognized() {
        assert_eq!(MediaKind::from_signature(b""), None);
        assert_eq!(MediaKind::from_signature(b"plain text notes"), None);
        assert_eq!(MediaKind::from_signature(b"%PDF-1.7"), None);
        assert_eq!(MediaKind::from_signature(b"RIFF\0\0\0\0WAVEfmt "), None);
    }

    // ── classify file ────────────────────────────────────────────────

    #[test]
    fn content_not_extension_decides() {
        let dir = TempDir::new().unwrap();
        let disguised = dir.path().join("photo.jpg");
        fs::write(&disguised, b"not really a photo").unwrap();
        assert_eq!(MediaKind::probe(&disguised).unwrap(), None);

        let renamed = dir.path().join("notes.txt");
        fs::write(&renamed, include_bytes!("../../tests/fixtures/acme_x1_2022-03-15.jpg")).unwrap();
        assert_eq!(MediaKind::probe(&renamed).unwrap(), Some(MediaKind::Image));
    }

    #[test]
    fn mp4_fixture_is_video() {
        let dir = TempDir::new().unwrap();
        let clip = dir.path().join("clip");
        fs::write(&clip, include_bytes!("../../tests/fixtures/clip_2020-12-25.mp4")).unwrap();
        assert_eq!(MediaKind::probe(&clip).unwrap(), Some(MediaKind::Video));
    }

    #[test]
    fn unknown_container_uses_signature() {
        let dir = TempDir::new().unwrap();
        let gif = dir.path().join("anim");
        fs::write(&gif, b"GIF89a\x01\x00\x01\x00\x00\x00\x00;").unwrap();
        assert_eq!(MediaKind::probe(&gif).unwrap(), Some(MediaKind::Image));
    }

    #[test]
    fn missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(MediaKind::probe(&dir.path().join("absent")).is_err());
    }
}
