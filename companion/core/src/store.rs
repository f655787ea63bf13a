//! Persisted Key/Value Store
//!
//! Flat string→string storage standing in for the host's local storage.
//! Settings, the chosen sprite and every saved surface position live here.
//!
//! # Keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `content.source_kind` | `rss`, `author_a` or `author_b` |
//! | `content.feed_url` | feed URL |
//! | `content.author_a` / `content.author_b` | author handles |
//! | `speech.voice_id` | integer, default `1` |
//! | `sprite.path` | last selected sprite |
//! | `position.<surface>` | JSON `{"x":..,"y":..}` |
//! | `region.<region>` | JSON `{"left":..,"top":..}` |

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;

/// Well-known store keys
pub mod keys {
    /// Selected content source kind
    pub const SOURCE_KIND: &str = "content.source_kind";
    /// RSS feed URL
    pub const FEED_URL: &str = "content.feed_url";
    /// Handle for the first author feed
    pub const AUTHOR_A: &str = "content.author_a";
    /// Handle for the second author feed
    pub const AUTHOR_B: &str = "content.author_b";
    /// Speech voice id
    pub const VOICE_ID: &str = "speech.voice_id";
    /// Last selected sprite image
    pub const SPRITE_PATH: &str = "sprite.path";

    /// Key for a surface's window position
    #[must_use]
    pub fn position(surface: &str) -> String {
        format!("position.{surface}")
    }

    /// Key for an in-surface region's origin
    #[must_use]
    pub fn region(region: &str) -> String {
        format!("region.{region}")
    }
}

/// Flat key/value persistence
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a group of values; either all of them land or none do
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError>;

    /// Delete a value (absent keys are fine)
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Write a single value
    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.set_many(&[(key, value)])
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut map = self.entries.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Write a group of values on the blocking thread pool
///
/// Surface loops and the orchestrator persist through this rather than
/// calling [`KeyValueStore::set_many`] on a runtime worker.
pub async fn persist(
    store: Arc<dyn KeyValueStore>,
    entries: Vec<(String, String)>,
) -> Result<(), StoreError> {
    tokio::task::spawn_blocking(move || {
        let entries: Vec<(&str, String)> = entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        store.set_many(&entries)
    })
    .await
    .map_err(|e| StoreError::Task(e.to_string()))?
}

/// Store backed by a flat TOML table on disk
///
/// Every write rewrites the whole file through a temp file and a rename, so
/// a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open a store, loading the file if it exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened state store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let text = toml::to_string(entries)?;
        let tmp_path = self.path.with_extension("toml.tmp");
        let mut file = std::fs::File::create(&tmp_path).map_err(io_err(&tmp_path))?;
        file.write_all(text.as_bytes()).map_err(io_err(&tmp_path))?;
        file.sync_all().map_err(io_err(&tmp_path))?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_err(&self.path))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut map = self.entries.lock();
        let mut next = map.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), value.clone());
        }
        self.write_atomic(&next)?;
        *map = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.entries.lock();
        if !map.contains_key(key) {
            return Ok(());
        }
        let mut next = map.clone();
        next.remove(key);
        self.write_atomic(&next)?;
        *map = next;
        Ok(())
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set(keys::VOICE_ID, "3".to_string()).unwrap();
        assert_eq!(store.get(keys::VOICE_ID).as_deref(), Some("3"));

        store.remove(keys::VOICE_ID).unwrap();
        store.remove(keys::VOICE_ID).unwrap();
        assert_eq!(store.get(keys::VOICE_ID), None);
    }

    #[test]
    fn test_file_store_persists_group() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("companion-state.toml");

        let store = FileStore::open(&path).unwrap();
        store
            .set_many(&[
                (keys::SOURCE_KIND, "author_a".to_string()),
                (keys::AUTHOR_A, "alice".to_string()),
                (keys::position("bubble").as_str(), r#"{"x":10,"y":20}"#.to_string()),
            ])
            .unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::SOURCE_KIND).as_deref(), Some("author_a"));
        assert_eq!(reopened.get(keys::AUTHOR_A).as_deref(), Some("alice"));
        assert_eq!(
            reopened.get("position.bubble").as_deref(),
            Some(r#"{"x":10,"y":20}"#)
        );
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_failed_write_keeps_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("blocked");
        let store = FileStore::open(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), "x").unwrap();

        assert!(store.set(keys::FEED_URL, "http://x".to_string()).is_err());
        assert_eq!(store.get(keys::FEED_URL), None);
    }

    #[tokio::test]
    async fn test_persist_writes_file_off_the_runtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.toml");
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());

        persist(
            store.clone(),
            vec![(keys::SPRITE_PATH.to_string(), "/sprites/cat.png".to_string())],
        )
        .await
        .unwrap();

        assert_eq!(store.get(keys::SPRITE_PATH).as_deref(), Some("/sprites/cat.png"));
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::SPRITE_PATH).as_deref(), Some("/sprites/cat.png"));
    }

    #[tokio::test]
    async fn test_persist_reports_write_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blocked");
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), "x").unwrap();

        let result = persist(store.clone(), vec![(keys::VOICE_ID.to_string(), "2".to_string())]).await;
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(store.get(keys::VOICE_ID), None);
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(keys::position("character"), "position.character");
        assert_eq!(keys::region("settings-dialog"), "region.settings-dialog");
    }
}
