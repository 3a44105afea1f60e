use std::path::PathBuf;

use thiserror::Error;

/// Error type for every operation on the routing document.
///
/// The `Display` output is the short message handed back to callers, so
/// variants keep it to one line.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EditorError {
    /// Missing or unusable input; raised before any file is touched
    #[error("{0}")]
    Validation(String),

    /// Malformed YAML, either submitted content or the stored document
    #[error("Invalid YAML in {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Reading, backing up or writing a file failed
    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EditorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn parse(context: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Whether the failure was caused by the caller's input rather than the
    /// environment.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Parse { .. })
    }
}

/// Result type alias for document operations
pub type EditorResult<T> = Result<T, EditorError>;
