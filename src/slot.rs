use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::limits::MAX_SLOT_KEY_LEN;

#[derive(Debug)]
pub enum SlotError {
    Io(io::Error),
    InvalidKey(String),
}

impl std::fmt::Display for SlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotError::Io(e) => write!(f, "slot I/O error: {e}"),
            SlotError::InvalidKey(key) => write!(f, "invalid slot key: {key:?}"),
        }
    }
}

impl std::error::Error for SlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SlotError::Io(e) => Some(e),
            SlotError::InvalidKey(_) => None,
        }
    }
}

impl From<io::Error> for SlotError {
    fn from(e: io::Error) -> Self {
        SlotError::Io(e)
    }
}

/// Client-local key-value storage. Each key holds one text blob.
pub trait Storage {
    /// `Ok(None)` when nothing was ever stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, SlotError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), SlotError>;
    fn remove_item(&self, key: &str) -> Result<(), SlotError>;
}

/// Volatile storage, gone when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.items.get(key).map(|e| e.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SlotError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SlotError> {
        self.items.remove(key);
        Ok(())
    }
}

/// One file per key inside a data directory.
///
/// Writes go to `<key>.json.tmp`, are fsynced, then renamed over `<key>.json`,
/// so a reader sees either the old blob or the new one, never a torn write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SlotError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a key to its file, stripping anything that could escape the directory.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, SlotError> {
        if key.len() > MAX_SLOT_KEY_LEN {
            return Err(SlotError::InvalidKey(key.to_string()));
        }
        let safe_name: String = key
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if safe_name.is_empty() {
            return Err(SlotError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{safe_name}.json")))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 bytes are as good as garbage; the store treats garbage as empty.
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SlotError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
