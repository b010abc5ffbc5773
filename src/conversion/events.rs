//! Status events emitted by the pipeline
//!
//! Every stage reports what it did as a `PipelineEvent`. The front end turns
//! each one into a log line with `Display`.

use std::fmt;
use std::path::PathBuf;

use crate::audio::ArtworkSource;

/// Events emitted while converting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Folder mode found files to convert
    BatchStarted { folder: PathBuf, files_total: usize },
    /// A file's transcode is about to start
    Started {
        source: PathBuf,
        destination: PathBuf,
        bitrate: u32,
    },
    /// Metadata couldn't be read; a default is being used
    MetadataFallback { source: PathBuf, reason: String },
    /// The transcode finished
    Converted { destination: PathBuf },
    /// Cover art was written into the output
    ArtworkEmbedded {
        destination: PathBuf,
        source: ArtworkSource,
    },
    /// Cover art couldn't be written; the conversion still counts
    ArtworkFailed { destination: PathBuf, message: String },
    /// The file's pipeline stopped
    Failed { source: PathBuf, message: String },
    /// Nothing was selected or the folder had no matching files
    NothingToDo { message: String },
    /// Folder mode finished
    BatchFinished { converted: usize, failed: usize },
}

impl PipelineEvent {
    /// Log level matching the event's severity
    pub fn level(&self) -> log::Level {
        match self {
            PipelineEvent::MetadataFallback { .. } | PipelineEvent::ArtworkFailed { .. } => {
                log::Level::Warn
            }
            PipelineEvent::Failed { .. } | PipelineEvent::NothingToDo { .. } => log::Level::Error,
            _ => log::Level::Info,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level() == log::Level::Error
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::BatchStarted { folder, files_total } => write!(
                f,
                "Found {} file(s) in {}",
                files_total,
                folder.display()
            ),
            PipelineEvent::Started {
                source,
                destination,
                bitrate,
            } => write!(
                f,
                "Converting: {} -> {} at {} bps",
                source.display(),
                destination.display(),
                bitrate
            ),
            PipelineEvent::MetadataFallback { reason, .. } => write!(f, "Warning: {}", reason),
            PipelineEvent::Converted { .. } => write!(f, "Conversion completed successfully!"),
            PipelineEvent::ArtworkEmbedded {
                destination,
                source,
            } => write!(f, "Embedded {} into {}", source, destination.display()),
            PipelineEvent::ArtworkFailed { message, .. } => write!(f, "Warning: {}", message),
            PipelineEvent::Failed { message, .. } => write!(f, "Error: {}", message),
            PipelineEvent::NothingToDo { message } => write!(f, "Error: {}", message),
            PipelineEvent::BatchFinished { converted, failed } => write!(
                f,
                "Folder done: {} converted, {} failed",
                converted, failed
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_status_line() {
        let event = PipelineEvent::Started {
            source: PathBuf::from("/music/track.flac"),
            destination: PathBuf::from("/music/track.m4a"),
            bitrate: 320_000,
        };
        assert_eq!(
            event.to_string(),
            "Converting: /music/track.flac -> /music/track.m4a at 320000 bps"
        );
        assert_eq!(event.level(), log::Level::Info);
    }

    #[test]
    fn test_failure_status_line() {
        let event = PipelineEvent::Failed {
            source: PathBuf::from("/music/track.flac"),
            message: "Conversion failed: boom".to_string(),
        };
        assert_eq!(event.to_string(), "Error: Conversion failed: boom");
        assert!(event.is_error());
    }

    #[test]
    fn test_degradations_are_warnings() {
        let event = PipelineEvent::ArtworkFailed {
            destination: PathBuf::from("/music/track.m4a"),
            message: "read-only".to_string(),
        };
        assert_eq!(event.level(), log::Level::Warn);
        assert!(!event.is_error());
    }
}
