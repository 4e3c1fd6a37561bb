//! Key-value persistence
//!
//! The history store talks to a [`Storage`] trait so it can run against an
//! in-memory map in tests and a file-per-key directory in the binary.
//! Writes are allowed to fail; callers treat persistence as best effort.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    /// No usable data directory on this platform.
    NoDataDir,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage i/o error: {}", e),
            StorageError::NoDataDir => write!(f, "no data directory available"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::NoDataDir => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl Storage for Box<dyn Storage> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Volatile storage for tests and `--no-persist` runs.
#[derive(Default)]
pub struct MemoryStorage {
    entries: std::collections::BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under the platform data directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at the standard per-user data directory.
    pub fn new() -> Result<Self, StorageError> {
        let dirs = directories::ProjectDirs::from("", "", "steplab")
            .ok_or(StorageError::NoDataDir)?;
        Self::at(dirs.data_dir().to_path_buf())
    }

    pub fn at(dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir)?;
        Ok(FileStorage { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_roundtrip() {
        let mut s = MemoryStorage::new();
        assert!(s.get("k").is_none());
        s.set("k", "v").unwrap();
        assert_eq!(s.get("k").as_deref(), Some("v"));
        s.remove("k").unwrap();
        assert!(s.get("k").is_none());
    }

    #[test]
    fn file_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = FileStorage::at(tmp.path().join("store")).unwrap();
        s.set("history", "{\"a\":1}").unwrap();
        assert_eq!(s.get("history").as_deref(), Some("{\"a\":1}"));
        s.remove("history").unwrap();
        assert!(s.get("history").is_none());
        // Removing a missing key is not an error.
        s.remove("history").unwrap();
    }
}
