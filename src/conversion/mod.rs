//! Audio conversion module
//!
//! Handles transcoding FLAC files to ALAC/MP4 using ffmpeg, the single-file
//! pipeline around it and the folder-mode batch driver.

mod batch;
mod events;
mod ffmpeg;
mod pipeline;

pub use batch::convert_folder;
pub use events::PipelineEvent;
pub use pipeline::{convert_selection, preview_source, PipelineContext};

use std::path::{Path, PathBuf};

use crate::core::ConverterSettings;

#[cfg(windows)]
const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BINARY: &str = "ffmpeg";

/// Find the ffmpeg binary
///
/// Search order:
/// 1. `ffmpeg_path` from settings (returned as-is, even if missing)
/// 2. `FFMPEG` environment variable
/// 3. CARGO_MANIFEST_DIR/resources/bin/ffmpeg (development)
/// 4. bin/ffmpeg or resources/bin/ffmpeg next to the executable
/// 5. every directory on PATH
pub fn get_ffmpeg_path(settings: &ConverterSettings) -> Result<PathBuf, String> {
    if let Some(path) = &settings.ffmpeg_path {
        return Ok(path.clone());
    }

    if let Some(path) = std::env::var_os("FFMPEG").map(PathBuf::from) {
        if path.is_file() {
            log::debug!("Found ffmpeg from FFMPEG variable: {:?}", path);
            return Ok(path);
        }
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let dev_path = PathBuf::from(manifest_dir)
            .join("resources")
            .join("bin")
            .join(FFMPEG_BINARY);

        if dev_path.is_file() {
            log::debug!("Found ffmpeg at development path: {:?}", dev_path);
            return Ok(dev_path);
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let candidates = [
                exe_dir.join("bin").join(FFMPEG_BINARY),
                exe_dir.join("resources").join("bin").join(FFMPEG_BINARY),
            ];
            for candidate in candidates {
                if candidate.is_file() {
                    log::debug!("Found ffmpeg next to executable: {:?}", candidate);
                    return Ok(candidate);
                }
            }
        }
    }

    if let Some(path) = find_on_path(FFMPEG_BINARY) {
        log::debug!("Found ffmpeg on PATH: {:?}", path);
        return Ok(path);
    }

    Err(format!(
        "ffmpeg binary not found. Set it with `fempeg set-ffmpeg <PATH>` or put {} on PATH",
        FFMPEG_BINARY
    ))
}

fn find_on_path(binary: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Verify that ffmpeg exists and is executable
pub fn verify_ffmpeg(path: &Path) -> Result<PathBuf, String> {
    if !path.is_file() {
        return Err(format!("ffmpeg not found at {:?}", path));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path)
            .map_err(|e| format!("Failed to get ffmpeg metadata: {}", e))?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(format!("ffmpeg at {:?} is not executable", path));
        }
    }

    log::debug!("ffmpeg verified at: {:?}", path);
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configured_path_wins() {
        let settings = ConverterSettings {
            ffmpeg_path: Some(PathBuf::from("/opt/custom/ffmpeg")),
            ..Default::default()
        };
        assert_eq!(
            get_ffmpeg_path(&settings).unwrap(),
            PathBuf::from("/opt/custom/ffmpeg")
        );
    }

    #[test]
    fn test_verify_missing_ffmpeg() {
        let result = verify_ffmpeg(Path::new("/nonexistent/ffmpeg"));
        assert!(result.unwrap_err().contains("not found"));
    }

    #[test]
    fn test_verify_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(verify_ffmpeg(temp_dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_non_executable() {
        let temp_dir = TempDir::new().unwrap();
        let fake = temp_dir.path().join("ffmpeg");
        std::fs::write(&fake, b"not a program").unwrap();

        let result = verify_ffmpeg(&fake);
        assert!(result.unwrap_err().contains("not executable"));
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let fake = temp_dir.path().join("ffmpeg");
        std::fs::write(&fake, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(verify_ffmpeg(&fake).unwrap(), fake);
    }
}
