//! Folder mode
//!
//! Converts every matching file directly inside a folder, one after another.
//! A failed file is reported and the loop moves on to the next one.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use crate::core::{find_source_files, Selection};
use crate::error::PipelineError;

use super::events::PipelineEvent;
use super::ffmpeg::ConversionOutcome;
use super::pipeline::{convert_selection, emit, PipelineContext};

/// Summary of a folder run
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub folder: PathBuf,
    /// One outcome per file, in processing order
    pub outcomes: Vec<ConversionOutcome>,
    /// RFC 3339 timestamps
    pub started_at: String,
    pub finished_at: String,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> Vec<&ConversionOutcome> {
        self.outcomes.iter().filter(|o| !o.success).collect()
    }

    #[cfg(test)]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }
}

fn nothing_to_do(message: String, events: &Sender<PipelineEvent>) -> PipelineError {
    emit(
        events,
        PipelineEvent::NothingToDo {
            message: message.clone(),
        },
    );
    PipelineError::InputMissing(message)
}

/// Run `convert` over every `extension` file in `dir`
///
/// `selection` is pointed at each file before `convert` runs, so afterwards it
/// holds the last file processed.
pub fn convert_folder_with<F>(
    dir: &Path,
    extension: &str,
    selection: &mut Selection,
    events: &Sender<PipelineEvent>,
    mut convert: F,
) -> Result<BatchReport, PipelineError>
where
    F: FnMut(&mut Selection) -> ConversionOutcome,
{
    let started_at = chrono::Utc::now().to_rfc3339();

    let files = match find_source_files(dir, extension) {
        Ok(files) if !files.is_empty() => files,
        Ok(_) => {
            let message = format!("No {} files found in the selected folder.", extension.to_uppercase());
            return Err(nothing_to_do(message, events));
        }
        Err(message) => return Err(nothing_to_do(message, events)),
    };

    emit(
        events,
        PipelineEvent::BatchStarted {
            folder: dir.to_path_buf(),
            files_total: files.len(),
        },
    );

    let mut outcomes = Vec::with_capacity(files.len());
    for file in &files {
        selection.select(file);
        outcomes.push(convert(selection));
    }

    let report = BatchReport {
        folder: dir.to_path_buf(),
        outcomes,
        started_at,
        finished_at: chrono::Utc::now().to_rfc3339(),
    };

    emit(
        events,
        PipelineEvent::BatchFinished {
            converted: report.converted(),
            failed: report.failed().len(),
        },
    );

    Ok(report)
}

/// Convert every source file in a folder with the full pipeline
pub fn convert_folder(
    ctx: &PipelineContext,
    dir: &Path,
    selection: &mut Selection,
    events: &Sender<PipelineEvent>,
) -> Result<BatchReport, PipelineError> {
    convert_folder_with(dir, &ctx.settings.source_extension, selection, events, |selection| {
        convert_selection(ctx, selection, events)
    })
}
