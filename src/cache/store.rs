//! Durable on-disk byte store keyed by URL.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::LoadError;

/// Durable key-value store: one file per URL under the cache directory.
///
/// Survives process restarts. Entries are opaque blobs, so no schema
/// versioning is needed.
pub struct ByteStore {
    dir: PathBuf,
}

impl ByteStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self, LoadError> {
        fs::create_dir_all(&dir).map_err(|e| LoadError::StorageWrite(e.to_string()))?;
        Ok(Self { dir })
    }

    /// Stable, filesystem-safe name for a URL.
    fn file_name(url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(Self::file_name(url))
    }

    /// Check whether an entry exists for `url`.
    pub fn contains(&self, url: &str) -> bool {
        self.path_for(url).is_file()
    }

    /// Read the bytes for `url`.
    ///
    /// Read failures degrade to a miss; a subsequent fetch repairs the entry.
    pub fn read(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.path_for(url);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read cache file {}: {e}", path.display());
                None
            }
        }
    }

    /// Write the bytes for `url`, replacing any previous entry.
    ///
    /// The write goes through a temp file in the same directory and is
    /// persisted into place, so readers never observe a partial entry.
    pub fn write(&self, url: &str, bytes: &[u8]) -> Result<(), LoadError> {
        let mut temp =
            NamedTempFile::new_in(&self.dir).map_err(|e| LoadError::StorageWrite(e.to_string()))?;
        temp.write_all(bytes)
            .map_err(|e| LoadError::StorageWrite(e.to_string()))?;
        temp.persist(self.path_for(url))
            .map_err(|e| LoadError::StorageWrite(e.error.to_string()))?;
        Ok(())
    }

    /// Remove the entry for `url`. No-op if absent.
    pub fn remove(&self, url: &str) {
        let path = self.path_for(url);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove cache file {}: {e}", path.display());
            }
        }
    }

    /// Remove every entry in the store.
    pub fn clear(&self) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to list cache directory {}: {e}", self.dir.display());
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!("Failed to remove cache file {}: {e}", path.display());
                }
            }
        }
    }
}
