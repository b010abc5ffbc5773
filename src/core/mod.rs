//! Core application state and source discovery
//!
//! This module contains:
//! - Converter settings (persisted preferences)
//! - The current source/destination selection
//! - Folder scanning for folder mode

mod scanning;
mod state;

pub use scanning::find_source_files;
pub use state::{ConverterSettings, Selection};
