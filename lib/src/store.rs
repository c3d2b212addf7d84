//! String key/value persistence for client-side state (`progress`,
//! `pendingUpdates`, onboarding flags).

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::helpers::{read_data, write_data};

pub const PROGRESS_KEY: &str = "progress";
pub const PENDING_UPDATES_KEY: &str = "pendingUpdates";

pub trait LocalStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All keys live in one JSON object file. Every call goes to disk, so two
/// stores over the same path observe each other's writes.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match read_data(&self.path)? {
            Some(raw_data) => Ok(serde_json::from_slice(&raw_data)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        write_data(&self.path, serde_json::to_string_pretty(entries)?)
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value);

        self.write(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.load()?;

        if entries.remove(key).is_some() {
            self.write(&entries)?;
        }

        Ok(())
    }
}
