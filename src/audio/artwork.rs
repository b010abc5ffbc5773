//! Cover art transplanting
//!
//! Runs after a successful transcode. Opens the finished output file, swaps
//! its cover art for the source's first picture (or the placeholder) and
//! saves it back. Failures here never undo the conversion.

use std::fmt;
use std::path::Path;

use lofty::{MimeType, Picture, PictureType, Probe, Tag, TagExt, TaggedFileExt};

use super::metadata::read_artwork;
use crate::error::PipelineError;

/// Built-in JPEG used when a source has no picture
pub const PLACEHOLDER_JPEG: &[u8] = include_bytes!("../../resources/placeholder.jpg");

/// Where a cover came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkSource {
    /// First picture embedded in the source file
    Source,
    /// Placeholder image
    Placeholder,
}

impl fmt::Display for ArtworkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtworkSource::Source => write!(f, "source artwork"),
            ArtworkSource::Placeholder => write!(f, "placeholder artwork"),
        }
    }
}

/// Raw image bytes ready to be written into a cover slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkPayload {
    pub data: Vec<u8>,
    pub source: ArtworkSource,
}

/// Result of the artwork step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkOutcome {
    /// Cover written; `source` says whether it is real or the placeholder
    Embedded { source: ArtworkSource, bytes: usize },
    /// Cover could not be written. The audio is still fine.
    Failed(String),
}

impl ArtworkOutcome {
    pub fn is_embedded(&self) -> bool {
        matches!(self, ArtworkOutcome::Embedded { .. })
    }

    #[cfg(test)]
    pub fn used_placeholder(&self) -> bool {
        matches!(
            self,
            ArtworkOutcome::Embedded {
                source: ArtworkSource::Placeholder,
                ..
            }
        )
    }
}

/// Placeholder bytes: the configured image if readable, else the built-in one
pub fn load_placeholder(override_path: Option<&Path>) -> Vec<u8> {
    if let Some(path) = override_path {
        match std::fs::read(path) {
            Ok(data) if !data.is_empty() => return data,
            Ok(_) => log::warn!("Placeholder {} is empty, using built-in", path.display()),
            Err(e) => log::warn!(
                "Could not read placeholder {}: {}, using built-in",
                path.display(),
                e
            ),
        }
    }
    PLACEHOLDER_JPEG.to_vec()
}

/// Pick the cover for a source: its first embedded picture, else the placeholder
pub fn select_artwork(source: &Path, placeholder: Option<&Path>) -> ArtworkPayload {
    match read_artwork(source) {
        Ok(Some(data)) => {
            return ArtworkPayload {
                data,
                source: ArtworkSource::Source,
            };
        }
        Ok(None) => log::info!("No embedded artwork in {}", source.display()),
        Err(e) => log::warn!("Could not extract artwork from {}: {}", source.display(), e),
    }

    ArtworkPayload {
        data: load_placeholder(placeholder),
        source: ArtworkSource::Placeholder,
    }
}

/// Replace every picture in `dest`'s primary tag with `payload` as the front cover
pub fn write_cover(dest: &Path, payload: &ArtworkPayload) -> Result<(), String> {
    let mut tagged_file = Probe::open(dest)
        .map_err(|e| format!("Failed to open file: {}", e))?
        .read()
        .map_err(|e| format!("Failed to read file: {}", e))?;

    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .primary_tag_mut()
        .ok_or_else(|| "Failed to create tag".to_string())?;

    let existing: Vec<PictureType> = tag.pictures().iter().map(|p| p.pic_type()).collect();
    for pic_type in existing {
        tag.remove_picture_type(pic_type);
    }

    // Bytes are copied as-is; the MP4 cover slot is always labelled JPEG
    tag.push_picture(Picture::new_unchecked(
        PictureType::CoverFront,
        Some(MimeType::Jpeg),
        None,
        payload.data.clone(),
    ));

    tag.save_to_path(dest)
        .map_err(|e| format!("Failed to save file: {}", e))?;

    Ok(())
}

/// Copy the source's cover (or the placeholder) into the converted file
pub fn embed_artwork(source: &Path, dest: &Path, placeholder: Option<&Path>) -> ArtworkOutcome {
    let payload = select_artwork(source, placeholder);

    match write_cover(dest, &payload) {
        Ok(()) => {
            log::info!(
                "Embedded {} ({} bytes) into {}",
                payload.source,
                payload.data.len(),
                dest.display()
            );
            ArtworkOutcome::Embedded {
                source: payload.source,
                bytes: payload.data.len(),
            }
        }
        Err(reason) => {
            let err = PipelineError::ArtworkEmbedFailed {
                path: dest.to_path_buf(),
                reason,
            };
            log::warn!("{}", err);
            ArtworkOutcome::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_placeholder_is_jpeg() {
        assert_eq!(&PLACEHOLDER_JPEG[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(&PLACEHOLDER_JPEG[PLACEHOLDER_JPEG.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_load_placeholder_override() {
        let temp_dir = TempDir::new().unwrap();
        let custom = temp_dir.path().join("custom.jpg");
        std::fs::write(&custom, test_fixtures::cover_jpeg()).unwrap();

        assert_eq!(load_placeholder(Some(&custom)), test_fixtures::cover_jpeg());
    }

    #[test]
    fn test_load_placeholder_missing_override_uses_builtin() {
        let missing = PathBuf::from("/nonexistent/cover.jpg");
        assert_eq!(load_placeholder(Some(&missing)), PLACEHOLDER_JPEG);
        assert_eq!(load_placeholder(None), PLACEHOLDER_JPEG);
    }

    #[test]
    fn test_select_artwork_unreadable_source_uses_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.flac");
        std::fs::write(&source, b"garbage").unwrap();

        let payload = select_artwork(&source, None);
        assert_eq!(payload.source, ArtworkSource::Placeholder);
        assert_eq!(payload.data, PLACEHOLDER_JPEG);
    }

    #[test]
    fn test_embed_into_missing_destination_fails_softly() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.flac");
        std::fs::write(&source, b"garbage").unwrap();

        let outcome = embed_artwork(&source, &temp_dir.path().join("missing.m4a"), None);
        match outcome {
            ArtworkOutcome::Failed(message) => assert!(message.contains("missing.m4a")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_helpers() {
        let placeholder = ArtworkOutcome::Embedded {
            source: ArtworkSource::Placeholder,
            bytes: 10,
        };
        assert!(placeholder.is_embedded());
        assert!(placeholder.used_placeholder());

        let failed = ArtworkOutcome::Failed("nope".to_string());
        assert!(!failed.is_embedded());
        assert!(!failed.used_placeholder());
    }

    #[test]
    fn test_embed_placeholder_when_source_has_no_picture() {
        let temp_dir = TempDir::new().unwrap();
        let source = test_fixtures::titled_flac(temp_dir.path());
        let dest = test_fixtures::plain_m4a(temp_dir.path(), "bare");
        assert_eq!(read_artwork(&dest).unwrap(), None);

        let outcome = embed_artwork(&source, &dest, None);
        assert!(outcome.used_placeholder(), "{:?}", outcome);

        let cover = read_artwork(&dest).unwrap();
        assert_eq!(cover.as_deref(), Some(PLACEHOLDER_JPEG));
    }

    #[test]
    fn test_embed_copies_source_picture() {
        let temp_dir = TempDir::new().unwrap();
        let source = test_fixtures::covered_flac(temp_dir.path());
        let dest = test_fixtures::plain_m4a(temp_dir.path(), "covered");

        let outcome = embed_artwork(&source, &dest, None);
        assert_eq!(
            outcome,
            ArtworkOutcome::Embedded {
                source: ArtworkSource::Source,
                bytes: test_fixtures::cover_jpeg().len(),
            }
        );

        let cover = read_artwork(&dest).unwrap();
        assert_eq!(cover.as_deref(), Some(test_fixtures::cover_jpeg()));
    }

    #[test]
    fn test_embed_replaces_existing_cover() {
        let temp_dir = TempDir::new().unwrap();
        let covered = test_fixtures::covered_flac(temp_dir.path());
        let bare = test_fixtures::titled_flac(temp_dir.path());
        let dest = test_fixtures::plain_m4a(temp_dir.path(), "twice");

        assert!(embed_artwork(&covered, &dest, None).is_embedded());
        assert!(embed_artwork(&bare, &dest, None).used_placeholder());

        let tagged_file = Probe::open(&dest).unwrap().read().unwrap();
        let pictures: usize = tagged_file.tags().iter().map(|t| t.pictures().len()).sum();
        assert_eq!(pictures, 1);
        assert_eq!(read_artwork(&dest).unwrap().as_deref(), Some(PLACEHOLDER_JPEG));
    }

    #[test]
    fn test_write_cover_keeps_non_jpeg_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let dest = test_fixtures::plain_m4a(temp_dir.path(), "webp");
        let mut webp = b"RIFF\x24\x00\x00\x00WEBPVP8 ".to_vec();
        webp.extend_from_slice(&[0x18, 0x00, 0x00, 0x00, 0x30, 0x01, 0x00, 0x9d, 0x01, 0x2a]);
        let payload = ArtworkPayload {
            data: webp.clone(),
            source: ArtworkSource::Source,
        };

        write_cover(&dest, &payload).unwrap();
        assert_eq!(read_artwork(&dest).unwrap(), Some(webp));
    }

    #[test]
    fn test_write_cover_into_flac() {
        let temp_dir = TempDir::new().unwrap();
        let dest = test_fixtures::covered_flac(temp_dir.path());
        let payload = ArtworkPayload {
            data: PLACEHOLDER_JPEG.to_vec(),
            source: ArtworkSource::Placeholder,
        };

        write_cover(&dest, &payload).unwrap();

        let tagged_file = Probe::open(&dest).unwrap().read().unwrap();
        let pictures: Vec<_> = tagged_file.tags().iter().flat_map(|t| t.pictures()).collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].pic_type(), PictureType::CoverFront);
        assert_eq!(pictures[0].data(), PLACEHOLDER_JPEG);
    }
}
