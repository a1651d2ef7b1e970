//! In-process key/value backend

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use crate::error::{PassgenError, Result};
use super::{build_listing, folder_prefix, KvBackend, KvEntry, KvListing};

/// Backend keeping every entry in a map; contents die with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, KvEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, KvEntry>>> {
        self.entries
            .lock()
            .map_err(|_| PassgenError::Backend("memory store lock poisoned".to_string()))
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvBackend for MemoryStore {
    fn exists_raw(&self, key: &str) -> Result<bool> {
        let entries = self.entries()?;
        let prefix = folder_prefix(key);
        Ok(entries.contains_key(key) || entries.keys().any(|k| k.starts_with(&prefix)))
    }

    fn get_raw(&self, key: &str) -> Result<Option<KvEntry>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn put_raw(&self, key: &str, entry: &KvEntry) -> Result<()> {
        self.entries()?.insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn list_raw(&self, folder: &str) -> Result<Option<KvListing>> {
        let entries = self.entries()?;
        Ok(build_listing(
            folder,
            entries.iter().map(|(k, v)| (k.clone(), v.clone())),
        ))
    }

    fn delete_subtree_raw(&self, folder: &str) -> Result<()> {
        let prefix = folder_prefix(folder);
        self.entries()?
            .retain(|k, _| k != folder && !k.starts_with(&prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KvOptions, KvStore};
    use serde_json::{json, Map};

    #[test]
    fn test_put_get_exists() {
        let store = MemoryStore::new();
        let options = KvOptions::new("production");

        assert!(!store.exists("gen_passwd/a", &options).unwrap());
        store.put("gen_passwd/a", &json!("v"), &Map::new(), &options).unwrap();

        assert!(store.exists("gen_passwd/a", &options).unwrap());
        assert!(store.exists("gen_passwd", &options).unwrap());
        assert!(!store.exists("gen_passwd/a", &KvOptions::new("dev")).unwrap());
        assert_eq!(store.get("gen_passwd/a", &options).unwrap().unwrap().value, json!("v"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_replaces_metadata() {
        let store = MemoryStore::new();
        let options = KvOptions::default();
        let mut metadata = Map::new();
        metadata.insert("complexity".to_string(), json!(1));

        store.put("k", &json!(1), &metadata, &options).unwrap();
        store.put("k", &json!(2), &Map::new(), &options).unwrap();

        let entry = store.get("k", &options).unwrap().unwrap();
        assert_eq!(entry.value, json!(2));
        assert!(entry.metadata.is_empty());
    }

    #[test]
    fn test_delete_subtree() {
        let store = MemoryStore::new();
        let options = KvOptions::default();
        store.put("gen_passwd/a", &json!(1), &Map::new(), &options).unwrap();
        store.put("gen_passwd/b/c", &json!(2), &Map::new(), &options).unwrap();
        store.put("gen_passwd_other", &json!(3), &Map::new(), &options).unwrap();

        store.delete_subtree("gen_passwd", &options).unwrap();
        assert!(!store.exists("gen_passwd", &options).unwrap());
        assert!(store.exists("gen_passwd_other", &options).unwrap());
    }

    #[test]
    fn test_list() {
        let store = MemoryStore::new();
        let options = KvOptions::new("production");
        store.put("gen_passwd/a", &json!(1), &Map::new(), &options).unwrap();
        store.put("gen_passwd/sub/b", &json!(2), &Map::new(), &options).unwrap();

        let listing = store.list("gen_passwd", &options).unwrap().unwrap();
        assert_eq!(listing.keys.keys().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(listing.folders, vec!["sub".to_string()]);

        assert!(store.list("missing", &options).unwrap().is_none());

        let top = store.list("/", &KvOptions::default()).unwrap().unwrap();
        assert_eq!(top.folders, vec!["production".to_string()]);
    }
}
