//! Single-file pipeline
//!
//! read bitrate -> transcode -> transplant artwork -> report. Each stage
//! emits a `PipelineEvent`; only a failed transcode ends the run early.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use crate::audio::{
    embed_artwork, read_artwork, read_bitrate, read_title, save_artwork_preview, ArtworkOutcome,
    ArtworkSource, Lookup,
};
use crate::core::{ConverterSettings, Selection};
use crate::error::PipelineError;

use super::events::PipelineEvent;
use super::ffmpeg::{convert_file, ConversionOutcome, ConversionRequest};
use super::get_ffmpeg_path;

/// Everything a pipeline run needs, owned by the front end and passed down
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub settings: ConverterSettings,
    /// Resolved transcoder; None when it couldn't be found
    pub ffmpeg_path: Option<PathBuf>,
}

impl PipelineContext {
    /// Build a context, locating ffmpeg from the settings
    pub fn new(settings: ConverterSettings) -> Self {
        let ffmpeg_path = match get_ffmpeg_path(&settings) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };
        Self {
            settings,
            ffmpeg_path,
        }
    }

    #[cfg(test)]
    pub fn with_ffmpeg(settings: ConverterSettings, ffmpeg_path: PathBuf) -> Self {
        Self {
            settings,
            ffmpeg_path: Some(ffmpeg_path),
        }
    }
}

pub(crate) fn emit(events: &Sender<PipelineEvent>, event: PipelineEvent) {
    log::log!(event.level(), "{}", event);
    // Receiver may be gone if the front end stopped listening
    let _ = events.send(event);
}

fn fail(source: &Path, error: PipelineError, events: &Sender<PipelineEvent>) -> ConversionOutcome {
    debug_assert!(error.is_fatal(), "recoverable error ended a pipeline: {}", error);
    let outcome = ConversionOutcome::failed(source, &error);
    let event = match error {
        PipelineError::InputMissing(message) => PipelineEvent::NothingToDo { message },
        other => PipelineEvent::Failed {
            source: source.to_path_buf(),
            message: other.to_string(),
        },
    };
    emit(events, event);
    outcome
}

/// Convert one FLAC file next to itself as .m4a
pub fn convert_single(
    ctx: &PipelineContext,
    source: &Path,
    events: &Sender<PipelineEvent>,
) -> ConversionOutcome {
    if !source.is_file() {
        return fail(
            source,
            PipelineError::InputMissing(format!("Source file not found: {}", source.display())),
            events,
        );
    }

    let destination = ctx.settings.output_path_for(source);
    if destination == source {
        return fail(
            source,
            PipelineError::InputMissing(format!(
                "{} already has the .{} extension, nothing to convert",
                source.display(),
                ctx.settings.output_extension
            )),
            events,
        );
    }

    let bitrate = read_bitrate(source);
    if let Some(reason) = bitrate.fallback_reason() {
        emit(
            events,
            PipelineEvent::MetadataFallback {
                source: source.to_path_buf(),
                reason: reason.to_string(),
            },
        );
    }

    let request = ConversionRequest {
        source: source.to_path_buf(),
        destination,
        bitrate: bitrate.into_value(),
    };

    emit(
        events,
        PipelineEvent::Started {
            source: request.source.clone(),
            destination: request.destination.clone(),
            bitrate: request.bitrate,
        },
    );

    let Some(ffmpeg_path) = &ctx.ffmpeg_path else {
        return fail(
            source,
            PipelineError::TranscodeFailed("ffmpeg binary not found".to_string()),
            events,
        );
    };

    let mut outcome = convert_file(ffmpeg_path, &request, ctx.settings.scale_filter.as_deref());
    if !outcome.success {
        emit(
            events,
            PipelineEvent::Failed {
                source: request.source.clone(),
                message: outcome.message.clone(),
            },
        );
        return outcome;
    }

    emit(
        events,
        PipelineEvent::Converted {
            destination: request.destination.clone(),
        },
    );

    if ctx.settings.embed_artwork {
        let artwork = embed_artwork(
            source,
            &request.destination,
            ctx.settings.placeholder_artwork.as_deref(),
        );
        let event = match &artwork {
            ArtworkOutcome::Embedded { source, .. } => PipelineEvent::ArtworkEmbedded {
                destination: request.destination.clone(),
                source: *source,
            },
            ArtworkOutcome::Failed(message) => PipelineEvent::ArtworkFailed {
                destination: request.destination.clone(),
                message: message.clone(),
            },
        };
        emit(events, event);
        outcome.artwork = Some(artwork);
    }

    outcome
}

/// Convert whatever the front end currently has selected
///
/// Records the destination in the selection before converting, the way the
/// output field is filled in before the transcode starts.
pub fn convert_selection(
    ctx: &PipelineContext,
    selection: &mut Selection,
    events: &Sender<PipelineEvent>,
) -> ConversionOutcome {
    let Some(source) = selection.source.clone() else {
        return fail(
            Path::new(""),
            PipelineError::InputMissing("Please select a FLAC file.".to_string()),
            events,
        );
    };

    selection.destination = Some(ctx.settings.output_path_for(&source));
    convert_single(ctx, &source, events)
}

/// What a front end shows for a selected source before converting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePreview {
    pub title: Lookup<String>,
    pub bitrate: Lookup<u32>,
    pub artwork: ArtworkSource,
    /// Image written for display; None if it couldn't be saved
    pub artwork_path: Option<PathBuf>,
}

/// Gather title, bitrate and cover for a source without converting it
pub fn preview_source(ctx: &PipelineContext, source: &Path) -> SourcePreview {
    let (artwork, data) = match read_artwork(source) {
        Ok(Some(data)) => (ArtworkSource::Source, data),
        Ok(None) => (
            ArtworkSource::Placeholder,
            crate::audio::artwork::load_placeholder(ctx.settings.placeholder_artwork.as_deref()),
        ),
        Err(e) => {
            log::warn!("Could not extract artwork from {}: {}", source.display(), e);
            (
                ArtworkSource::Placeholder,
                crate::audio::artwork::load_placeholder(ctx.settings.placeholder_artwork.as_deref()),
            )
        }
    };

    let artwork_path = match save_artwork_preview(&data) {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    };

    SourcePreview {
        title: read_title(source),
        bitrate: read_bitrate(source),
        artwork,
        artwork_path,
    }
}
