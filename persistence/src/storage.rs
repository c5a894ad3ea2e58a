use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

/// File name used for the single save slot.
pub const DEFAULT_SAVE_FILE_NAME: &str = "savedgame.dat";

/// Errors raised by a [`Storage`] provider.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing has been persisted yet.
    #[error("no saved game is present")]
    Missing,
    /// The backing file could not be written or read.
    #[error("save file {path} could not be accessed: {source}")]
    Io {
        /// File the provider was accessing.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

/// Destination that holds the bytes of one saved game.
///
/// Every call opens, fully transfers, and releases the underlying resource
/// before returning, whether it succeeds or fails.
pub trait Storage {
    /// Replaces the persisted bytes.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Returns the persisted bytes.
    fn read_all(&self) -> Result<Vec<u8>, StorageError>;

    /// Reports whether a saved game is present.
    fn exists(&self) -> bool;
}

/// Storage backed by a single file on disk.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Creates storage that persists to the provided file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates storage that persists to [`DEFAULT_SAVE_FILE_NAME`] inside the directory.
    #[must_use]
    pub fn in_directory(directory: impl AsRef<Path>) -> Self {
        Self::new(directory.as_ref().join(DEFAULT_SAVE_FILE_NAME))
    }

    /// Location of the save file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Storage for FileStorage {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        write_bytes_atomic(&self.path, bytes).map_err(|source| self.io_error(source))?;
        debug!("wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<u8>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                debug!("read {} bytes from {}", bytes.len(), self.path.display());
                Ok(bytes)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Err(StorageError::Missing),
            Err(error) => Err(self.io_error(error)),
        }
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Storage that keeps the saved game in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    bytes: Option<Vec<u8>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: None }
    }

    /// Creates storage pre-populated with a saved game.
    #[must_use]
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// Persisted bytes, if any.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl Storage for MemoryStorage {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<u8>, StorageError> {
        self.bytes.clone().ok_or(StorageError::Missing)
    }

    fn exists(&self) -> bool {
        self.bytes.is_some()
    }
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    if let Err(error) = fs::write(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    replace_file(&tmp_path, path)
}

/// Moves the temp file over the save. The rename replaces the target in one
/// step, so a failure leaves the previous save as it was.
fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    let result = match fs::rename(tmp_path, final_path) {
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists && final_path.is_file() => {
            // Platforms that refuse to rename over an existing file.
            fs::remove_file(final_path).and_then(|()| fs::rename(tmp_path, final_path))
        }
        other => other,
    };

    if result.is_err() {
        let _ = fs::remove_file(tmp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_SAVE_FILE_NAME);
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_rename_keeps_the_existing_save() {
        let directory = tempfile::tempdir().expect("temp dir");
        let final_path = directory.path().join(DEFAULT_SAVE_FILE_NAME);
        fs::write(&final_path, [3, 1, 4]).expect("seed save");

        let missing = directory.path().join("never-written.tmp");
        assert!(replace_file(&missing, &final_path).is_err());

        assert_eq!(fs::read(&final_path).expect("read"), vec![3, 1, 4]);
    }

    #[test]
    fn rename_replaces_the_existing_save() {
        let directory = tempfile::tempdir().expect("temp dir");
        let final_path = directory.path().join(DEFAULT_SAVE_FILE_NAME);
        let tmp_path = temp_path_for(&final_path);
        fs::write(&final_path, [1]).expect("seed save");
        fs::write(&tmp_path, [2, 2]).expect("seed temp");

        replace_file(&tmp_path, &final_path).expect("replace");

        assert_eq!(fs::read(&final_path).expect("read"), vec![2, 2]);
        assert!(!tmp_path.exists());
    }
}
