//! Test fixtures for conversion tests
//!
//! Small FLAC and ALAC/MP4 files are committed under `resources/` and copied
//! into a temp dir per test. Tests that need a real transcode generate their
//! input with ffmpeg and are `#[ignore]`d. A stub "transcoder" script records
//! how it was called.

#![cfg(test)]

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::conversion::{get_ffmpeg_path, verify_ffmpeg};
use crate::core::ConverterSettings;

/// 1 s of 44.1 kHz stereo, `TITLE=Song A`, no picture, 32 kbps by its header
const TITLED_FLAC: &[u8] = include_bytes!("../resources/test_titled.flac");
/// `TITLE=Covered` with `cover_jpeg()` as its front cover
const COVERED_FLAC: &[u8] = include_bytes!("../resources/test_covered.flac");
/// ALAC in MP4 with no tags at all
const PLAIN_M4A: &[u8] = include_bytes!("../resources/test_plain.m4a");

/// A JPEG that differs from the built-in placeholder
pub fn cover_jpeg() -> &'static [u8] {
    include_bytes!("../resources/test_cover.jpg")
}

fn copy_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write fixture");
    path
}

/// `track.flac` titled "Song A", without artwork
pub fn titled_flac(dir: &Path) -> PathBuf {
    copy_fixture(dir, "track.flac", TITLED_FLAC)
}

/// `art.flac` carrying `cover_jpeg()`
pub fn covered_flac(dir: &Path) -> PathBuf {
    copy_fixture(dir, "art.flac", COVERED_FLAC)
}

/// `<name>_plain.m4a`, an untagged ALAC file
pub fn plain_m4a(dir: &Path, name: &str) -> PathBuf {
    copy_fixture(dir, &format!("{}_plain.m4a", name), PLAIN_M4A)
}

/// Locate a working ffmpeg for the ignored end-to-end tests
pub fn require_ffmpeg() -> PathBuf {
    let path = get_ffmpeg_path(&ConverterSettings::default())
        .and_then(|p| verify_ffmpeg(&p))
        .expect("ffmpeg is required for this test");
    let runs = Command::new(&path)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    assert!(runs, "{} -version failed", path.display());
    path
}

fn run(cmd: &mut Command) {
    let output = cmd.output().expect("Failed to execute ffmpeg");
    if !output.status.success() {
        panic!("ffmpeg failed: {}", String::from_utf8_lossy(&output.stderr));
    }
}

/// Generate a one-second FLAC sine tone
///
/// # Arguments
/// * `name` - File name without extension
/// * `title` - Title tag to write, if any
/// * `with_picture` - Attach `cover_jpeg()` as the front cover
pub fn generate_flac(
    ffmpeg: &Path,
    dir: &Path,
    name: &str,
    title: Option<&str>,
    with_picture: bool,
) -> PathBuf {
    let output_path = dir.join(format!("{}.flac", name));

    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-y")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg("sine=frequency=440:duration=1");

    if with_picture {
        let cover = dir.join(format!("{}_cover.jpg", name));
        std::fs::write(&cover, cover_jpeg()).expect("Failed to write cover");
        cmd.arg("-i")
            .arg(&cover)
            .arg("-map")
            .arg("0:a")
            .arg("-map")
            .arg("1:v")
            .arg("-c:v")
            .arg("copy")
            .arg("-disposition:v")
            .arg("attached_pic");
    }

    cmd.arg("-codec:a").arg("flac");

    if let Some(title) = title {
        cmd.arg("-metadata").arg(format!("title={}", title));
    }

    cmd.arg(&output_path);
    run(&mut cmd);

    output_path
}

/// Stand-in transcoder that logs its arguments
pub struct StubTranscoder {
    pub path: PathBuf,
    log: PathBuf,
}

impl StubTranscoder {
    /// One line per call, arguments joined by spaces
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Write a shell script that records its arguments, writes a few bytes to
/// its last argument and exits with `exit_code`
#[cfg(unix)]
pub fn stub_transcoder(dir: &Path, exit_code: i32) -> StubTranscoder {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stub-ffmpeg");
    let log = dir.join("stub-ffmpeg.log");
    let script = format!(
        "#!/bin/sh\n\
         echo \"$*\" >> \"{log}\"\n\
         for last; do :; done\n\
         printf 'partial' > \"$last\"\n\
         if [ {code} -ne 0 ]; then\n\
         \x20 echo \"stub transcoder failed\" >&2\n\
         fi\n\
         exit {code}\n",
        log = log.display(),
        code = exit_code
    );
    std::fs::write(&path, script).expect("Failed to write stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make stub executable");

    StubTranscoder { path, log }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cover_differs_from_placeholder() {
        assert_ne!(cover_jpeg(), crate::audio::artwork::PLACEHOLDER_JPEG);
        assert_eq!(&cover_jpeg()[..2], &[0xFF, 0xD8]);
    }

    #[cfg(unix)]
    #[test]
    fn test_stub_records_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let stub = stub_transcoder(temp_dir.path(), 0);
        let out = temp_dir.path().join("out.m4a");

        let status = Command::new(&stub.path)
            .arg("-i")
            .arg("in.flac")
            .arg(&out)
            .status()
            .unwrap();

        assert!(status.success());
        assert_eq!(stub.invocations(), vec![format!("-i in.flac {}", out.display())]);
        assert_eq!(std::fs::read(&out).unwrap(), b"partial");
    }

    #[test]
    fn test_committed_fixtures_are_well_formed() {
        assert_eq!(&TITLED_FLAC[..4], b"fLaC");
        assert_eq!(&COVERED_FLAC[..4], b"fLaC");
        assert_eq!(&PLAIN_M4A[4..8], b"ftyp");
        assert!(COVERED_FLAC
            .windows(cover_jpeg().len())
            .any(|w| w == cover_jpeg()));
    }

    #[test]
    #[ignore = "needs a working ffmpeg"]
    fn test_generate_flac_file() {
        let ffmpeg = require_ffmpeg();
        let temp_dir = TempDir::new().unwrap();
        let path = generate_flac(&ffmpeg, temp_dir.path(), "gen_test", Some("Title"), true);
        assert!(path.exists(), "Generated file should exist");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
