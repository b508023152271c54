use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the repo-digest library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The repository lister could not enumerate files.
    #[error("File discovery failed: {message}")]
    Discovery {
        /// Error message
        message: String,
    },

    /// A path could not be folded into the directory tree.
    #[error("Tree construction failed for '{path}': {reason}")]
    TreeConstruction {
        /// Offending path
        path: String,
        /// Why the path was rejected
        reason: String,
    },

    /// The lister reported a path this tool does not handle.
    #[error("Unsupported path '{path}': {reason}")]
    UnsupportedPath {
        /// Offending path
        path: String,
        /// Why the path was rejected
        reason: String,
    },

    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The output document could not be persisted.
    #[error("Failed to write output to '{path}': {message}")]
    Write {
        /// Output file path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Invalid exclude pattern.
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The invalid pattern
        pattern: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates a discovery error.
    #[must_use]
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Creates a tree construction error.
    #[must_use]
    pub fn tree_construction(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TreeConstruction {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported path error.
    #[must_use]
    pub fn unsupported_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a write error from the underlying fault.
    #[must_use]
    pub fn write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a discovery error.
    #[must_use]
    pub const fn is_discovery(&self) -> bool {
        matches!(self, Self::Discovery { .. })
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a write error.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Short description of the underlying fault, without path context.
    ///
    /// Used for inline error markers where the label already names the file.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Io { message, .. } | Self::Write { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
