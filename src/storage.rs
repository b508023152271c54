//! Byte-level storage collaborator.
//!
//! The pipeline never touches the filesystem directly; every read, the
//! final write and the current-directory lookup go through [`Storage`] so
//! tests can substitute an in-memory implementation.

use crate::error::{Error, Result};
use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, trace};

/// Storage operations needed to produce one output document.
pub trait Storage {
    /// Reads the whole file.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Io`] if the file cannot be opened or read.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Reads at most `limit` bytes from the start of the file.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Io`] if the file cannot be opened or read.
    fn read_prefix(&self, path: &Path, limit: usize) -> Result<Vec<u8>>;

    /// Replaces the file at `path` with `bytes` in a single operation.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Write`] if the content cannot be persisted.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Returns true if `path` exists but is not a regular file, such as a
    /// directory or a submodule checkout (symlinks are followed).
    ///
    /// Missing paths are not special: reading them reports the fault.
    fn is_special_file(&self, path: &Path) -> bool;

    /// Returns the absolute current directory of the process.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Io`] if the directory cannot be determined.
    fn current_directory(&self) -> Result<PathBuf>;
}

/// [`Storage`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl FsStorage {
    /// Creates a filesystem storage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Hidden sibling that [`FsStorage`] stages a write in before the rename.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "output".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        trace!("Reading {}", path.display());
        fs::read(path).map_err(|e| Error::io(path, e))
    }

    fn read_prefix(&self, path: &Path, limit: usize) -> Result<Vec<u8>> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut buffer = Vec::with_capacity(limit);
        file.take(limit as u64)
            .read_to_end(&mut buffer)
            .map_err(|e| Error::io(path, e))?;
        Ok(buffer)
    }

    /// Writes atomically.
    ///
    /// # Process
    ///
    /// 1. Writes content to a hidden temporary file next to the target
    /// 2. Syncs the temporary file to disk
    /// 3. Renames the temporary file over the target path
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let temp_path = temp_path(path);
        let fail = |e: std::io::Error| Error::write(path, e.to_string());

        let mut temp_file = File::create(&temp_path).map_err(fail)?;
        let written = temp_file
            .write_all(bytes)
            .and_then(|()| temp_file.sync_all());
        drop(temp_file);

        if let Err(e) = written.and_then(|()| fs::rename(&temp_path, path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(fail(e));
        }

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn is_special_file(&self, path: &Path) -> bool {
        matches!(fs::metadata(path), Ok(m) if !m.is_file())
    }

    fn current_directory(&self) -> Result<PathBuf> {
        std::env::current_dir().map_err(|e| Error::io(".", e))
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryStorage;
