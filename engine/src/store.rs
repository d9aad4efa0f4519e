//! Persistence port and backends
//!
//! The warehouse is persisted as a flat map from a handful of fixed keys to
//! JSON text. Backends only move strings; (de)serialization happens in the
//! repository.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Logical collections kept in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    Products,
    Purchases,
    Outbound,
    Categories,
    StoreroomNames,
    ProductIdCounter,
}

impl StoreKey {
    pub const ALL: [StoreKey; 6] = [
        StoreKey::Products,
        StoreKey::Purchases,
        StoreKey::Outbound,
        StoreKey::Categories,
        StoreKey::StoreroomNames,
        StoreKey::ProductIdCounter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Products => "products",
            StoreKey::Purchases => "purchases",
            StoreKey::Outbound => "outbound",
            StoreKey::Categories => "categories",
            StoreKey::StoreroomNames => "storeroomNames",
            StoreKey::ProductIdCounter => "productIdCounter",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key to JSON-text map
pub trait KeyValueStore {
    /// Raw value for `key`, `None` when it was never written
    fn get(&self, key: StoreKey) -> AppResult<Option<String>>;

    fn set(&mut self, key: StoreKey, value: &str) -> AppResult<()>;

    fn remove(&mut self, key: StoreKey) -> AppResult<()>;
}

/// In-process store, used by tests and as a scratch backend
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<StoreKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with raw JSON text, e.g. legacy data
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (StoreKey, String)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn raw(&self, key: StoreKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: StoreKey) -> AppResult<Option<String>> {
        Ok(self.entries.get(&key).cloned())
    }

    fn set(&mut self, key: StoreKey, value: &str) -> AppResult<()> {
        self.entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: StoreKey) -> AppResult<()> {
        self.entries.remove(&key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Storage(format!("cannot create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: StoreKey) -> AppResult<Option<String>> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("read {}: {}", path.display(), e))),
        }
    }

    fn set(&mut self, key: StoreKey, value: &str) -> AppResult<()> {
        let path = self.path(key);
        // written to a sibling file, then renamed over the target
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .map_err(|e| AppError::Storage(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| AppError::Storage(format!("replace {}: {}", path.display(), e)))
    }

    fn remove(&mut self, key: StoreKey) -> AppResult<()> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("remove {}: {}", path.display(), e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(StoreKey::Products).unwrap(), None);
        store.set(StoreKey::Products, "[]").unwrap();
        assert_eq!(store.get(StoreKey::Products).unwrap().as_deref(), Some("[]"));
        store.remove(StoreKey::Products).unwrap();
        assert_eq!(store.raw(StoreKey::Products), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("data")).unwrap();

        assert_eq!(store.get(StoreKey::Categories).unwrap(), None);
        store.set(StoreKey::Categories, r#"["食品"]"#).unwrap();
        assert!(store.dir().join("categories.json").exists());
        assert_eq!(
            store.get(StoreKey::Categories).unwrap().as_deref(),
            Some(r#"["食品"]"#)
        );

        store.remove(StoreKey::Categories).unwrap();
        store.remove(StoreKey::Categories).unwrap();
        assert_eq!(store.get(StoreKey::Categories).unwrap(), None);
    }

    #[test]
    fn test_key_names() {
        let names: Vec<_> = StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            ["products", "purchases", "outbound", "categories", "storeroomNames", "productIdCounter"]
        );
    }
}
