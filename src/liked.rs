//! Liked songs, persisted under a single key of a local key-value store.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

/// Storage key holding the JSON array of liked track ids.
pub const LIKED_SONGS_KEY: &str = "likedSongs";

/// Key-value store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Keeps one `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Ordered set of liked track ids. Every mutation is flushed to the store.
pub struct LikedSongs {
    ids: Vec<String>,
    store: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for LikedSongs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikedSongs").field("ids", &self.ids).finish()
    }
}

impl LikedSongs {
    /// Read the liked ids from `store`. Missing or unreadable data starts empty.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let ids = match store.get(LIKED_SONGS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => dedup(ids),
                Err(e) => {
                    warn!("Ignoring corrupt liked songs data: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read liked songs: {}", e);
                Vec::new()
            }
        };
        debug!("Loaded {} liked songs", ids.len());

        Self { ids, store }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Like `id` if it is not liked, unlike it otherwise. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.contains(id) {
            self.remove(id)?;
            Ok(false)
        } else {
            self.insert(id)?;
            Ok(true)
        }
    }

    pub fn insert(&mut self, id: &str) -> Result<(), StoreError> {
        if self.contains(id) {
            return Ok(());
        }
        self.ids.push(id.to_string());
        if let Err(e) = self.flush() {
            self.ids.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let Some(pos) = self.ids.iter().position(|i| i == id) else {
            return Ok(());
        };
        let removed = self.ids.remove(pos);
        if let Err(e) = self.flush() {
            self.ids.insert(pos, removed);
            return Err(e);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.ids)?;
        self.store.set(LIKED_SONGS_KEY, &raw)
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
