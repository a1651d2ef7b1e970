//! Key/value storage for password records
//!
//! Provides:
//! - The [`KvStore`] interface consumed by the password lifecycle
//! - Opaque per-call [`KvOptions`] (environment prefixing, softfail)
//! - In-memory, file and SQLite backends

pub mod models;
pub mod memory;
pub mod file;
pub mod sqlite;

pub use models::{KvEntry, KvListing, PasswordMetadata, PasswordRecord};
pub use memory::MemoryStore;
pub use file::FileStore;
pub use sqlite::SqliteStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::error::{PassgenError, Result};

/// Default application name forwarded to backends
pub const DEFAULT_APP_ID: &str = "passgen";

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

/// Per-call backend configuration.
///
/// The password lifecycle forwards these options untouched; only
/// backends interpret them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvOptions {
    /// Application name, used by callers to tell their stores apart
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Folder prepended to every key; empty for global keys
    #[serde(default)]
    pub environment: String,
    /// Return empty results instead of failing
    #[serde(default)]
    pub softfail: bool,
}

impl Default for KvOptions {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            environment: String::new(),
            softfail: false,
        }
    }
}

impl KvOptions {
    /// Options scoped to an environment
    pub fn new(environment: &str) -> Self {
        Self {
            environment: environment.to_string(),
            ..Default::default()
        }
    }

    pub fn with_softfail(mut self, softfail: bool) -> Self {
        self.softfail = softfail;
        self
    }

    /// Fully qualified key: the environment folder followed by `key`
    pub fn full_key(&self, key: &str) -> String {
        let key = key.trim_matches('/');
        let environment = self.environment.trim_matches('/');
        match (environment.is_empty(), key.is_empty()) {
            (true, _) => key.to_string(),
            (false, true) => environment.to_string(),
            (false, false) => format!("{}/{}", environment, key),
        }
    }
}

/// Reject keys whose segments could escape the key space
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Ok(());
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(PassgenError::Backend(format!("invalid key '{}'", key)));
    }
    Ok(())
}

/// Storage primitives over fully qualified keys.
///
/// Backends implement this; the blanket [`KvStore`] implementation adds
/// environment prefixing, key validation and softfail handling.
pub trait KvBackend: Send + Sync {
    /// True for a stored key or a folder containing keys
    fn exists_raw(&self, key: &str) -> Result<bool>;
    fn get_raw(&self, key: &str) -> Result<Option<KvEntry>>;
    /// Replace the value and metadata stored at `key`
    fn put_raw(&self, key: &str, entry: &KvEntry) -> Result<()>;
    /// Immediate children of `folder`, or `None` when it does not exist
    fn list_raw(&self, folder: &str) -> Result<Option<KvListing>>;
    fn delete_subtree_raw(&self, folder: &str) -> Result<()>;
}

/// Key/value store consumed by the password lifecycle
pub trait KvStore: Send + Sync {
    fn exists(&self, key: &str, options: &KvOptions) -> Result<bool>;
    fn get(&self, key: &str, options: &KvOptions) -> Result<Option<KvEntry>>;
    fn put(&self, key: &str, value: &Value, metadata: &Map<String, Value>, options: &KvOptions) -> Result<()>;
    fn list(&self, folder: &str, options: &KvOptions) -> Result<Option<KvListing>>;
    fn delete_subtree(&self, folder: &str, options: &KvOptions) -> Result<()>;
}

/// Report IO failures inside a backend as backend errors, then turn a
/// failure into an empty result when softfail is requested
fn softfail<T: Default>(options: &KvOptions, operation: &str, key: &str, result: Result<T>) -> Result<T> {
    let result = result.map_err(|err| match err {
        PassgenError::Io(e) => PassgenError::Backend(format!("{} of '{}': {}", operation, key, e)),
        other => other,
    });
    match result {
        Err(err) if options.softfail => {
            log::warn!(
                "{} of '{}' failed for app '{}', returning empty result: {}",
                operation, key, options.app_id, err
            );
            Ok(T::default())
        }
        other => other,
    }
}

impl<B: KvBackend> KvStore for B {
    fn exists(&self, key: &str, options: &KvOptions) -> Result<bool> {
        let key = options.full_key(key);
        let result = validate_key(&key).and_then(|_| self.exists_raw(&key));
        softfail(options, "exists", &key, result)
    }

    fn get(&self, key: &str, options: &KvOptions) -> Result<Option<KvEntry>> {
        let key = options.full_key(key);
        let result = validate_key(&key).and_then(|_| self.get_raw(&key));
        softfail(options, "get", &key, result)
    }

    fn put(&self, key: &str, value: &Value, metadata: &Map<String, Value>, options: &KvOptions) -> Result<()> {
        let key = options.full_key(key);
        let entry = KvEntry {
            value: value.clone(),
            metadata: metadata.clone(),
        };
        let result = if key.is_empty() {
            Err(PassgenError::Backend("cannot store a value at the root folder".to_string()))
        } else {
            validate_key(&key).and_then(|_| self.put_raw(&key, &entry))
        };
        softfail(options, "put", &key, result)
    }

    fn list(&self, folder: &str, options: &KvOptions) -> Result<Option<KvListing>> {
        let folder = options.full_key(folder);
        let result = validate_key(&folder).and_then(|_| self.list_raw(&folder));
        softfail(options, "list", &folder, result)
    }

    fn delete_subtree(&self, folder: &str, options: &KvOptions) -> Result<()> {
        let folder = options.full_key(folder);
        let result = validate_key(&folder).and_then(|_| self.delete_subtree_raw(&folder));
        softfail(options, "delete_subtree", &folder, result)
    }
}

/// Prefix selecting the descendants of `folder`
pub(crate) fn folder_prefix(folder: &str) -> String {
    if folder.is_empty() {
        String::new()
    } else {
        format!("{}/", folder)
    }
}

/// Group flat `(key, entry)` pairs into the immediate children of `folder`
pub(crate) fn build_listing<I>(folder: &str, entries: I) -> Option<KvListing>
where
    I: IntoIterator<Item = (String, KvEntry)>,
{
    let prefix = folder_prefix(folder);
    let mut listing = KvListing::default();
    let mut found = false;

    for (key, entry) in entries {
        let Some(rest) = key.strip_prefix(&prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        found = true;
        match rest.split_once('/') {
            Some((child, _)) => {
                if !listing.folders.iter().any(|f| f == child) {
                    listing.folders.push(child.to_string());
                }
            }
            None => {
                listing.keys.insert(rest.to_string(), entry);
            }
        }
    }

    listing.folders.sort();
    found.then_some(listing)
}
