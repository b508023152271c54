use crate::{error::Result, storage::Storage};
use std::path::Path;
use tracing::debug;

/// Smallest prefix the classifier will sniff.
pub const MIN_SNIFF_BYTES: usize = 1024;

/// How a file's content is treated in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Content is emitted verbatim
    Text,
    /// Content is replaced with a skip marker
    Binary,
}

/// Decides whether a file is text by sniffing a bounded prefix.
///
/// # Algorithm
///
/// 1. Reads the first `sniff_bytes` of the file (or all of it if shorter)
/// 2. A NUL byte anywhere in that prefix marks the file as binary
/// 3. A file that cannot be read is treated as binary
///
/// Empty files are text.
#[derive(Debug, Clone, Copy)]
pub struct BinaryClassifier {
    sniff_bytes: usize,
}

impl Default for BinaryClassifier {
    fn default() -> Self {
        Self::new(MIN_SNIFF_BYTES)
    }
}

impl BinaryClassifier {
    /// Creates a classifier reading `sniff_bytes` bytes, never fewer than [`MIN_SNIFF_BYTES`].
    #[must_use]
    pub fn new(sniff_bytes: usize) -> Self {
        Self {
            sniff_bytes: sniff_bytes.max(MIN_SNIFF_BYTES),
        }
    }

    /// Classifies the file at `path`, treating an unreadable file as binary.
    pub fn classify(&self, storage: &dyn Storage, path: &Path) -> FileKind {
        self.sniff(storage, path).unwrap_or_else(|e| {
            debug!("Treating unreadable file as binary: {}", e);
            FileKind::Binary
        })
    }

    /// Classifies the file at `path`, reporting a failed prefix read.
    ///
    /// # Errors
    ///
    /// Returns the [`Storage`] error if the prefix cannot be read.
    pub fn sniff(&self, storage: &dyn Storage, path: &Path) -> Result<FileKind> {
        let sample = storage.read_prefix(path, self.sniff_bytes)?;
        Ok(if memchr::memchr(0, &sample).is_some() {
            FileKind::Binary
        } else {
            FileKind::Text
        })
    }
}
