//! File-backed key/value backend
//!
//! Each key is a JSON document at `<root>/<key>`; folders are
//! directories. Writes go through a temporary file and an atomic rename
//! so readers never observe a partially written entry.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use crate::error::{PassgenError, Result};
use super::{KvBackend, KvEntry, KvListing};

/// Prefix of in-flight temporary files, hidden from listings
const TEMP_PREFIX: &str = ".kvtmp";

/// Backend storing one JSON document per key below a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        if key.is_empty() {
            self.root.clone()
        } else {
            self.root.join(key)
        }
    }

    fn read_entry(path: &Path) -> Result<KvEntry> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            PassgenError::Backend(format!("corrupt entry {}: {}", path.display(), e))
        })
    }
}

impl KvBackend for FileStore {
    fn exists_raw(&self, key: &str) -> Result<bool> {
        Ok(self.path_for(key).exists())
    }

    fn get_raw(&self, key: &str) -> Result<Option<KvEntry>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_entry(&path).map(Some)
    }

    fn put_raw(&self, key: &str, entry: &KvEntry) -> Result<()> {
        let path = self.path_for(key);
        let parent = path
            .parent()
            .ok_or_else(|| PassgenError::Backend(format!("no parent folder for '{}'", key)))?;
        fs::create_dir_all(parent)?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(parent)?;
        let json = serde_json::to_string_pretty(entry)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&path)
            .map_err(|e| PassgenError::Backend(format!("failed to store '{}': {}", key, e)))?;
        Ok(())
    }

    fn list_raw(&self, folder: &str) -> Result<Option<KvListing>> {
        let dir = self.path_for(folder);
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut listing = KvListing::default();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }

            let path = entry.path();
            if path.is_dir() {
                listing.folders.push(name);
            } else if path.is_file() {
                listing.keys.insert(name, Self::read_entry(&path)?);
            }
        }

        listing.folders.sort();
        Ok(Some(listing))
    }

    fn delete_subtree_raw(&self, folder: &str) -> Result<()> {
        let path = self.path_for(folder);
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else if path.is_file() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
