//! FFmpeg subprocess handling for FLAC -> ALAC conversion

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::audio::ArtworkOutcome;
use crate::error::PipelineError;

/// One conversion to run. Built per file and consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Audio bitrate in bps, echoed from the source
    pub bitrate: u32,
}

/// Result of a file conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    /// Original input file path
    pub source: PathBuf,
    /// Path to the converted file; only set when conversion succeeded
    pub destination: Option<PathBuf>,
    /// Whether the audio conversion succeeded
    pub success: bool,
    /// Human-readable result, shown in the summary
    pub message: String,
    /// What happened to the cover, if the artwork step ran
    pub artwork: Option<ArtworkOutcome>,
}

impl ConversionOutcome {
    pub fn succeeded(source: &Path, destination: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: Some(destination.to_path_buf()),
            success: true,
            message: format!("Conversion completed: {}", destination.display()),
            artwork: None,
        }
    }

    pub fn failed(source: &Path, error: &PipelineError) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: None,
            success: false,
            message: error.to_string(),
            artwork: None,
        }
    }
}

/// Build the ffmpeg argument list for a request
///
/// -y                : Overwrite output file without asking
/// -i <input>        : Input file
/// -b:a <bitrate>    : Source bitrate, in bps
/// -acodec alac      : Apple Lossless
/// -f mp4            : MP4 container
/// -map 0:a          : Audio streams only; attached pictures are dropped
/// -map_metadata 0   : Copy all global tags from the input
/// -vf <filter>      : Legacy scale filter (no-op since video isn't mapped)
pub fn build_args(request: &ConversionRequest, scale_filter: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        request.source.to_string_lossy().into_owned(),
        "-b:a".to_string(),
        request.bitrate.to_string(),
        "-acodec".to_string(),
        "alac".to_string(),
        "-f".to_string(),
        "mp4".to_string(),
        "-map".to_string(),
        "0:a".to_string(),
        "-map_metadata".to_string(),
        "0".to_string(),
    ];

    if let Some(filter) = scale_filter {
        args.push("-vf".to_string());
        args.push(filter.to_string());
    }

    args.push(request.destination.to_string_lossy().into_owned());
    args
}

/// Convert a single FLAC file to ALAC/MP4 using ffmpeg
///
/// On a non-zero exit the partially written destination is removed so it
/// can't be mistaken for a finished file.
pub fn convert_file(
    ffmpeg_path: &Path,
    request: &ConversionRequest,
    scale_filter: Option<&str>,
) -> ConversionOutcome {
    let args = build_args(request, scale_filter);

    log::debug!("Running {} {}", ffmpeg_path.display(), args.join(" "));

    let result = Command::new(ffmpeg_path)
        .args(&args)
        .stdin(Stdio::null())
        .output();

    match result {
        Ok(output) => {
            if output.status.success() {
                log::info!("Successfully converted: {}", request.source.display());
                ConversionOutcome::succeeded(&request.source, &request.destination)
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let error = PipelineError::TranscodeFailed(format!(
                    "ffmpeg exited with status {}: {}",
                    output.status,
                    stderr
                        .lines()
                        .rev()
                        .find(|l| !l.trim().is_empty())
                        .unwrap_or("Unknown error")
                ));
                log::error!("{}", error);

                if request.destination.exists() {
                    if let Err(e) = std::fs::remove_file(&request.destination) {
                        log::warn!(
                            "Could not remove partial output {}: {}",
                            request.destination.display(),
                            e
                        );
                    }
                }

                ConversionOutcome::failed(&request.source, &error)
            }
        }
        Err(e) => {
            let error = PipelineError::TranscodeFailed(format!(
                "Failed to spawn ffmpeg at {}: {}",
                ffmpeg_path.display(),
                e
            ));
            log::error!("{}", error);
            ConversionOutcome::failed(&request.source, &error)
        }
    }
}
