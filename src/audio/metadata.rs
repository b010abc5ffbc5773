//! Best-effort metadata reading for source and converted files
//!
//! None of these readers fail the pipeline. Missing or unreadable data turns
//! into a `Lookup::Fallback` carrying the reason, and the caller carries on
//! with the default value.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use lofty::{Accessor, AudioFile, FileType, Probe, TaggedFile, TaggedFileExt};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::PipelineError;

/// Bitrate used when the source's own bitrate can't be read (bps)
pub const FALLBACK_BITRATE: u32 = 320_000;

/// Result of a best-effort lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Read from the file
    Found(T),
    /// Substituted because the file had nothing usable
    Fallback { value: T, reason: String },
}

impl<T> Lookup<T> {
    pub fn value(&self) -> &T {
        match self {
            Lookup::Found(value) => value,
            Lookup::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Lookup::Found(value) => value,
            Lookup::Fallback { value, .. } => value,
        }
    }

    #[cfg(test)]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Lookup::Fallback { .. })
    }

    /// Why the default was used, if it was
    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            Lookup::Found(_) => None,
            Lookup::Fallback { reason, .. } => Some(reason),
        }
    }
}

fn read_tagged_file(path: &Path) -> Result<TaggedFile, String> {
    Probe::open(path)
        .map_err(|e| format!("Failed to open file: {}", e))?
        .read()
        .map_err(|e| format!("Failed to read file: {}", e))
}

fn metadata_unavailable(path: &Path, reason: String) -> String {
    let err = PipelineError::MetadataUnavailable {
        path: path.to_path_buf(),
        reason,
    };
    log::warn!("{}", err);
    err.to_string()
}

/// Read the source's audio bitrate in bits per second
///
/// Falls back to `FALLBACK_BITRATE` when the header can't be parsed.
pub fn read_bitrate(path: &Path) -> Lookup<u32> {
    let tagged_file = match read_tagged_file(path) {
        Ok(f) => f,
        Err(e) => {
            return Lookup::Fallback {
                value: FALLBACK_BITRATE,
                reason: metadata_unavailable(path, e),
            };
        }
    };

    let properties = tagged_file.properties();
    match properties
        .audio_bitrate()
        .or_else(|| properties.overall_bitrate())
        .filter(|kbps| *kbps > 0)
    {
        Some(kbps) => match kbps.checked_mul(1000) {
            Some(bps) => {
                log::debug!("{}: {} kbps", path.display(), kbps);
                Lookup::Found(bps)
            }
            None => Lookup::Fallback {
                value: FALLBACK_BITRATE,
                reason: metadata_unavailable(
                    path,
                    format!("Bitrate of {} kbps is out of range", kbps),
                ),
            },
        },
        None => Lookup::Fallback {
            value: FALLBACK_BITRATE,
            reason: metadata_unavailable(path, "No bitrate in stream header".to_string()),
        },
    }
}

/// Read the title tag, falling back to the file name without extension
pub fn read_title(path: &Path) -> Lookup<String> {
    let fallback = || {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    let tagged_file = match read_tagged_file(path) {
        Ok(f) => f,
        Err(e) => {
            return Lookup::Fallback {
                value: fallback(),
                reason: metadata_unavailable(path, e),
            };
        }
    };

    let title = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .and_then(|tag| tag.title().map(|t| t.trim().to_string()))
        .filter(|t| !t.is_empty());

    match title {
        Some(title) => Lookup::Found(title),
        None => Lookup::Fallback {
            value: fallback(),
            reason: "No title tag".to_string(),
        },
    }
}

/// Read the first embedded picture's raw bytes
///
/// Tries the tag reader first, then the container's visuals. Absence is not
/// an error; `Ok(None)` means the file has no picture.
pub fn read_artwork(path: &Path) -> Result<Option<Vec<u8>>, String> {
    let tagged_file = read_tagged_file(path)?;

    for tag in tagged_file.tags() {
        if let Some(picture) = tag.pictures().first() {
            log::debug!(
                "Found {} byte picture in {:?} tag",
                picture.data().len(),
                tag.tag_type()
            );
            return Ok(Some(picture.data().to_vec()));
        }
    }

    Ok(read_visual(path))
}

/// Look for album art in the container's metadata, the way a decoder sees it
fn read_visual(path: &Path) -> Option<Vec<u8>> {
    let file = File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .ok()?;

    if let Some(metadata) = probed.metadata.get() {
        if let Some(rev) = metadata.current() {
            if let Some(visual) = rev.visuals().first() {
                return Some(visual.data.to_vec());
            }
        }
    }

    let mut format = probed.format;
    let visual = format
        .metadata()
        .current()
        .and_then(|rev| rev.visuals().first().map(|v| v.data.to_vec()));
    visual
}

/// Container and codec of a file, as the tag reader and decoder see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Container, e.g. "mp4" or "flac"
    pub container: String,
    /// Codec short name, e.g. "alac"
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub bits_per_sample: Option<u32>,
    pub channels: Option<usize>,
}

impl StreamInfo {
    pub fn is_mp4_alac(&self) -> bool {
        self.container == "mp4" && self.codec == "alac"
    }
}

fn container_name(file_type: FileType) -> String {
    match file_type {
        FileType::Mp4 => "mp4".to_string(),
        FileType::Flac => "flac".to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// Describe a file's container and audio codec
///
/// Used to confirm a converted file really is ALAC in MP4.
pub fn describe_output(path: &Path) -> Result<StreamInfo, String> {
    let container = container_name(read_tagged_file(path)?.file_type());

    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| format!("Failed to probe audio format: {}", e))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| "No default track found".to_string())?;
    let params = &track.codec_params;

    let codec = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|descriptor| descriptor.short_name.to_string())
        .unwrap_or_else(|| format!("{:?}", params.codec));

    Ok(StreamInfo {
        container,
        codec,
        sample_rate: params.sample_rate,
        bits_per_sample: params.bits_per_sample,
        channels: params.channels.map(|c| c.count()),
    })
}

/// Where the artwork preview image is written
pub fn preview_path() -> PathBuf {
    std::env::temp_dir()
        .join("fempeg_artwork")
        .join("preview_cover.jpg")
}

/// Write artwork bytes to the preview file, replacing the previous preview
pub fn save_artwork_preview(data: &[u8]) -> Result<PathBuf, String> {
    let path = preview_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create temp directory: {}", e))?;
    }
    fs::write(&path, data).map_err(|e| format!("Failed to write artwork preview: {}", e))?;
    log::debug!("Saved artwork preview to {:?}", path);
    Ok(path)
}
