//! Error types for the conversion pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure categories a pipeline run can report
///
/// Only `TranscodeFailed` and `InputMissing` end a file's pipeline. The other
/// variants describe degradations that are logged and then recovered from.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Tag reading failed; a default value is used instead
    #[error("Could not read metadata from {path}: {reason}")]
    MetadataUnavailable { path: PathBuf, reason: String },

    /// The external transcoder could not be run or exited non-zero
    #[error("Conversion failed: {0}")]
    TranscodeFailed(String),

    /// The cover could not be extracted or written
    #[error("Could not embed artwork into {path}: {reason}")]
    ArtworkEmbedFailed { path: PathBuf, reason: String },

    /// No source selected, or no matching files in a folder
    #[error("{0}")]
    InputMissing(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether this error stops the current file's pipeline
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::TranscodeFailed(_) | PipelineError::InputMissing(_) | PipelineError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradations_are_not_fatal() {
        let metadata = PipelineError::MetadataUnavailable {
            path: PathBuf::from("track.flac"),
            reason: "bad header".to_string(),
        };
        let artwork = PipelineError::ArtworkEmbedFailed {
            path: PathBuf::from("track.m4a"),
            reason: "read-only".to_string(),
        };
        assert!(!metadata.is_fatal());
        assert!(!artwork.is_fatal());
    }

    #[test]
    fn test_transcode_failure_is_fatal() {
        let err = PipelineError::TranscodeFailed("ffmpeg exited with status 1".to_string());
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Conversion failed: ffmpeg exited with status 1");
    }

    #[test]
    fn test_input_missing_message_is_verbatim() {
        let err = PipelineError::InputMissing("Please select a FLAC file.".to_string());
        assert_eq!(err.to_string(), "Please select a FLAC file.");
    }
}
