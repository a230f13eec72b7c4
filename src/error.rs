use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised by the path normalizer and the format codecs.
///
/// Service-level code wraps these in `anyhow::Error` with file context; use
/// `downcast_ref::<ModError>()` to branch on the kind.
#[derive(Error, Debug)]
pub enum ModError {
    #[error("Input file not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("Invalid file format: {0}")]
    Format(String),

    #[error("Checksum unavailable, file not found: {0}")]
    ChecksumUnavailable(Utf8PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),

    #[error("Path is not valid UTF-8: {0}")]
    InvalidPath(String),

    #[error("Project name cannot be used as a file name: '{0}'")]
    InvalidProjectName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Build a `Format` error for a required element that is absent.
    pub(crate) fn missing(what: &str) -> Self {
        Self::Format(format!("required element missing: {}", what))
    }
}

pub type Result<T, E = ModError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ModError::missing("Properties/Name");
        assert_eq!(
            err.to_string(),
            "Invalid file format: required element missing: Properties/Name"
        );

        let err = ModError::UnsupportedExtension(".txt".to_string());
        assert_eq!(err.to_string(), "Unsupported file type: .txt");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ModError = io.into();
        assert!(matches!(err, ModError::Io(_)));
    }
}
