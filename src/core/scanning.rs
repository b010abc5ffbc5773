//! Source file discovery for folder mode
//!
//! Only the folder's immediate entries are considered. Files come back in
//! directory-listing order; nothing is sorted.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::audio::has_extension;

/// List the files directly inside `dir` whose extension matches `extension`
pub fn find_source_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, String> {
    if !dir.is_dir() {
        return Err(format!("Not a folder: {}", dir.display()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| format!("Failed to read folder {}: {}", dir.display(), e))?;
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            files.push(entry.into_path());
        }
    }

    log::debug!(
        "Found {} .{} file(s) in {}",
        files.len(),
        extension,
        dir.display()
    );
    Ok(files)
}
