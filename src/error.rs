use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("end time must be greater than start time ({start} -> {end})")]
    EmptyWindow { start: String, end: String },

    #[error("invalid URL provided: {0}")]
    InvalidUrl(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("no files found in the directory: {0}")]
    EmptyDir(PathBuf),

    #[error("unsupported file type: {path} (expected one of {expected})")]
    UnsupportedExtension { path: PathBuf, expected: String },

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    #[error("no duration found for {0}")]
    NoDuration(PathBuf),

    #[error("no usable quote after {0} attempts")]
    NoQuote(u32),

    #[error("font error: {0}")]
    Font(String),
}

/// Case-insensitive extension check against a list of bare extensions.
pub(crate) fn has_extension(path: &std::path::Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| allowed.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_extension(Path::new("clip.MP4"), &["mp4", "mkv"]));
        assert!(!has_extension(Path::new("clip.mov"), &["mp4", "mkv"]));
        assert!(!has_extension(Path::new("noext"), &["mp4"]));
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = MediaError::InvalidTimeFormat("7:5".into());
        assert_eq!(err.to_string(), "invalid time format: 7:5");
        let err = MediaError::NoQuote(3);
        assert!(err.to_string().contains('3'));
    }
}
