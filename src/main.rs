//! FemPEG - FLAC to ALAC converter
//!
//! Converts FLAC files (one at a time or a whole folder) to ALAC in an MP4
//! container with ffmpeg, then copies the cover art across.

mod audio;
mod conversion;
mod core;
mod error;
mod logging;
mod test_fixtures;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};
use std::thread;

use clap::{Parser, Subcommand};

use crate::audio::{describe_output, ArtworkSource};
use crate::conversion::{
    convert_folder, convert_selection, preview_source, verify_ffmpeg, PipelineContext,
    PipelineEvent,
};
use crate::core::{ConverterSettings, Selection};

#[derive(Parser)]
#[command(name = "fempeg")]
#[command(about = "FemPEG: FLAC to ALAC Converter", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this ffmpeg for this run only
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,

    /// Don't copy cover art into converted files
    #[arg(long, global = true)]
    no_artwork: bool,

    /// Show debug logging in the terminal
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one FLAC file to .m4a next to it
    Convert {
        /// FLAC file
        file: PathBuf,
    },

    /// Convert every FLAC file directly inside a folder
    Folder {
        /// Folder to scan (subfolders are ignored)
        dir: PathBuf,
    },

    /// Show title, bitrate and cover of a file without converting it
    Inspect {
        file: PathBuf,
    },

    /// Remember where ffmpeg lives
    SetFfmpeg {
        path: PathBuf,
    },

    /// Print the effective settings
    Settings,
}

/// Run a pipeline job on a worker thread, printing its status lines as they arrive
fn run_with_status<T, F>(job: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce(&Sender<PipelineEvent>) -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || job(&tx));

    // Ends when the worker drops its sender
    for event in rx {
        if event.is_error() {
            eprintln!("{}", event);
        } else {
            println!("{}", event);
        }
    }

    match handle.join() {
        Ok(result) => Some(result),
        Err(_) => {
            log::error!("Conversion worker panicked");
            eprintln!("Error: conversion worker stopped unexpectedly");
            None
        }
    }
}

fn convert_command(ctx: PipelineContext, file: PathBuf) -> ExitCode {
    let outcome = run_with_status(move |events| {
        let mut selection = Selection::new(file);
        convert_selection(&ctx, &mut selection, events)
    });

    let Some(outcome) = outcome else {
        return ExitCode::FAILURE;
    };

    // The failure was already printed as an event
    if !outcome.success {
        return ExitCode::FAILURE;
    }

    println!("Success: {}", outcome.message);
    match &outcome.artwork {
        Some(artwork) if !artwork.is_embedded() => println!("Note: cover art was not copied"),
        _ => {}
    }
    ExitCode::SUCCESS
}

fn folder_command(ctx: PipelineContext, dir: PathBuf) -> ExitCode {
    let result = run_with_status(move |events| {
        let mut selection = Selection::default();
        let report = convert_folder(&ctx, &dir, &mut selection, events);
        (report, selection)
    });

    let Some((report, selection)) = result else {
        return ExitCode::FAILURE;
    };

    // Errors here were already printed as events
    let Ok(report) = report else {
        return ExitCode::FAILURE;
    };

    if let Some(last) = &selection.destination {
        log::debug!("Last output: {}", last.display());
    }

    let failed = report.failed();
    println!(
        "Converted {} of {} file(s) in {}",
        report.converted(),
        report.outcomes.len(),
        report.folder.display()
    );
    println!("Started:  {}", report.started_at);
    println!("Finished: {}", report.finished_at);
    for outcome in &failed {
        eprintln!("  {}: {}", outcome.source.display(), outcome.message);
    }

    if failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn inspect_command(ctx: &PipelineContext, file: PathBuf) -> ExitCode {
    if !file.is_file() {
        eprintln!("Error: File not found: {}", file.display());
        return ExitCode::FAILURE;
    }

    let preview = preview_source(ctx, &file);

    println!("File:    {}", file.display());
    match preview.title.fallback_reason() {
        None => println!("Title:   {}", preview.title.value()),
        Some(reason) => println!("Title:   {} ({})", preview.title.value(), reason),
    }
    match preview.bitrate.fallback_reason() {
        None => println!("Bitrate: {} bps", preview.bitrate.value()),
        Some(_) => println!("Bitrate: {} bps (default)", preview.bitrate.value()),
    }
    match preview.artwork {
        ArtworkSource::Source => println!("Artwork: embedded"),
        ArtworkSource::Placeholder => println!("Artwork: none (placeholder will be used)"),
    }
    if let Some(path) = &preview.artwork_path {
        println!("Preview: {}", path.display());
    }

    match describe_output(&file) {
        Ok(info) => {
            let mut format = format!("{}/{}", info.container, info.codec);
            if let Some(rate) = info.sample_rate {
                format.push_str(&format!(", {} Hz", rate));
            }
            if let Some(bits) = info.bits_per_sample {
                format.push_str(&format!(", {}-bit", bits));
            }
            if let Some(channels) = info.channels {
                format.push_str(&format!(", {} ch", channels));
            }
            if info.is_mp4_alac() {
                format.push_str(" (converted)");
            }
            println!("Format:  {}", format);
        }
        Err(e) => log::debug!("Could not probe {}: {}", file.display(), e),
    }

    ExitCode::SUCCESS
}

fn set_ffmpeg_command(path: PathBuf) -> ExitCode {
    let verified = match verify_ffmpeg(&path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Start from what's on disk so per-run flags aren't persisted
    let mut settings = ConverterSettings::load();
    settings.ffmpeg_path = Some(verified);

    match settings.save() {
        Ok(saved_to) => {
            println!("FFmpeg path set to {}", path.display());
            log::info!("Saved ffmpeg path to {}", saved_to.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn settings_command(ctx: &PipelineContext, log_path: Option<PathBuf>) -> ExitCode {
    let settings = &ctx.settings;

    match &ctx.ffmpeg_path {
        Some(path) => println!("FFmpeg path:      {}", path.display()),
        None => println!("FFmpeg path:      (not found)"),
    }
    println!("Embed artwork:    {}", settings.embed_artwork);
    match &settings.placeholder_artwork {
        Some(path) => println!("Placeholder:      {}", path.display()),
        None => println!("Placeholder:      (built-in)"),
    }
    println!("Source extension: .{}", settings.source_extension);
    println!("Output extension: .{}", settings.output_extension);
    println!(
        "Scale filter:     {}",
        settings.scale_filter.as_deref().unwrap_or("(none)")
    );
    if let Ok(path) = ConverterSettings::settings_path() {
        println!("Settings file:    {}", path.display());
    }
    if let Some(path) = log_path.or_else(logging::get_log_file_path) {
        println!("Log file:         {}", path.display());
    }

    ExitCode::SUCCESS
}

/// Saved settings with this run's flags applied, and ffmpeg located
fn build_context(ffmpeg: Option<PathBuf>, no_artwork: bool) -> PipelineContext {
    let mut settings = ConverterSettings::load();
    if let Some(path) = ffmpeg {
        settings.ffmpeg_path = Some(path);
    }
    if no_artwork {
        settings.embed_artwork = false;
    }
    PipelineContext::new(settings)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log_path = logging::init_logging(cli.verbose);
    let context = || build_context(cli.ffmpeg.clone(), cli.no_artwork);

    match cli.command {
        Commands::Convert { file } => convert_command(context(), file),
        Commands::Folder { dir } => folder_command(context(), dir),
        Commands::Inspect { file } => inspect_command(&context(), file),
        Commands::SetFfmpeg { path } => set_ffmpeg_command(path),
        Commands::Settings => settings_command(&context(), log_path),
    }
}
