use std::path::Path;

/// Check whether a path has the given extension, ignoring case
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_flac() {
        assert!(has_extension(Path::new("test.flac"), "flac"));
        assert!(has_extension(Path::new("/music/Test.FLAC"), "flac"));
    }

    #[test]
    fn test_rejects_other_files() {
        assert!(!has_extension(Path::new("test.m4a"), "flac"));
        assert!(!has_extension(Path::new("test"), "flac"));
        assert!(!has_extension(Path::new("flac"), "flac"));
    }

    #[test]
    fn test_has_extension_custom() {
        assert!(has_extension(Path::new("song.wav"), "wav"));
        assert!(!has_extension(Path::new("song.wav.bak"), "wav"));
    }
}
