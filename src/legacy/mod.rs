//! Legacy flat-file password storage
//!
//! Before the key/value store, passwords lived in one directory per
//! environment: `<identifier>` and `<identifier>.salt` held the current
//! password and salt, `<identifier>.last` and `<identifier>.salt.last`
//! the previous generation. Each file holds its value on the first line.
//!
//! This module reads that layout and migrates it into a [`KvStore`].
//!
//! [`KvStore`]: crate::store::KvStore

mod lock;
mod migrate;

pub use lock::{LockError, MigrationLock};
pub use migrate::{LegacyMigrator, MigrationReport};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::utils::read_first_line;
use crate::LAST_SUFFIX;

/// Suffix of salt files
pub const SALT_SUFFIX: &str = ".salt";

/// Location of an environment's password files below the legacy root
pub const LEGACY_ENV_SUBDIR: &str = "simp_autofiles/gen_passwd";

/// A password and salt read from legacy files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    pub password: String,
    /// Empty when the salt file is missing
    pub salt: String,
}

/// Whether a file name is a salt file (`*.salt` or `*.salt.last`)
fn is_salt_file(name: &str) -> bool {
    name.ends_with(SALT_SUFFIX) || name.ends_with(".salt.last")
}

/// Names of password files directly inside `dir`; hidden files,
/// salt files and sub-directories are skipped
fn password_file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if !dir.is_dir() {
        return Ok(names);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') || is_salt_file(&name) {
            continue;
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// Read adapter over one environment's legacy password directory
#[derive(Debug, Clone)]
pub struct LegacyFileStore {
    dir: PathBuf,
}

impl LegacyFileStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the password file for an identifier (which may end in `.last`)
    pub fn password_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(identifier)
    }

    /// Path of the salt file paired with an identifier's password file
    pub fn salt_path(&self, identifier: &str) -> PathBuf {
        match identifier.strip_suffix(LAST_SUFFIX) {
            Some(base) => self.dir.join(format!("{}{}{}", base, SALT_SUFFIX, LAST_SUFFIX)),
            None => self.dir.join(format!("{}{}", identifier, SALT_SUFFIX)),
        }
    }

    /// True when any regular file whose name begins with the identifier exists
    pub fn has_files_for(&self, identifier: &str) -> Result<bool> {
        let path = self.password_path(identifier);
        let (Some(parent), Some(prefix)) = (path.parent(), path.file_name()) else {
            return Ok(false);
        };
        let Some(prefix) = prefix.to_str() else {
            return Ok(false);
        };
        if !parent.is_dir() {
            return Ok(false);
        }

        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && entry.file_name().to_str().is_some_and(|n| n.starts_with(prefix))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Read the password and salt for an identifier.
    ///
    /// Returns `None` when the password file does not exist. A missing salt
    /// file reads as an empty salt; nothing is repaired here.
    pub fn get(&self, identifier: &str) -> Result<Option<LegacyRecord>> {
        let Some(password) = read_first_line(&self.password_path(identifier))? else {
            return Ok(None);
        };
        let salt = read_first_line(&self.salt_path(identifier))?.unwrap_or_default();
        Ok(Some(LegacyRecord { password, salt }))
    }

    /// Every password file in the directory, current and `.last` alike
    pub fn list(&self) -> Result<BTreeMap<String, LegacyRecord>> {
        let mut records = BTreeMap::new();
        for name in password_file_names(&self.dir)? {
            if let Some(record) = self.get(&name)? {
                records.insert(name, record);
            }
        }
        Ok(records)
    }
}

/// Legacy password directory of `environment` below `legacy_root`
pub fn legacy_key_dir(legacy_root: &Path, environment: &str) -> PathBuf {
    legacy_root.join(environment).join(LEGACY_ENV_SUBDIR)
}

/// Environments below `legacy_root` whose directory holds password files
pub fn legacy_environments(legacy_root: &Path) -> Result<Vec<String>> {
    let mut environments = Vec::new();
    if !legacy_root.is_dir() {
        return Ok(environments);
    }

    for entry in fs::read_dir(legacy_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !password_file_names(&legacy_key_dir(legacy_root, &name))?.is_empty() {
            environments.push(name);
        }
    }

    environments.sort();
    Ok(environments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_dir() -> (LegacyFileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("gen_passwd");
        fs::create_dir_all(&dir).unwrap();
        (LegacyFileStore::new(&dir), temp_dir)
    }

    #[test]
    fn test_salt_paths() {
        let store = LegacyFileStore::new(Path::new("/legacy"));
        assert_eq!(store.salt_path("db"), Path::new("/legacy/db.salt"));
        assert_eq!(store.salt_path("db.last"), Path::new("/legacy/db.salt.last"));
    }

    #[test]
    fn test_get_with_and_without_salt() {
        let (store, _temp_dir) = setup_dir();
        fs::write(store.dir().join("db"), "password1\n").unwrap();
        fs::write(store.dir().join("db.salt"), "salt1\n").unwrap();
        fs::write(store.dir().join("db.last"), "password0\n").unwrap();

        assert_eq!(
            store.get("db").unwrap(),
            Some(LegacyRecord { password: "password1".into(), salt: "salt1".into() })
        );
        assert_eq!(
            store.get("db.last").unwrap(),
            Some(LegacyRecord { password: "password0".into(), salt: String::new() })
        );
        assert_eq!(store.get("web").unwrap(), None);
        assert!(!store.dir().join("db.salt.last").exists());
    }

    #[test]
    fn test_list_skips_salts_dirs_and_hidden() {
        let (store, _temp_dir) = setup_dir();
        fs::write(store.dir().join("db"), "p1\n").unwrap();
        fs::write(store.dir().join("db.salt"), "s1\n").unwrap();
        fs::write(store.dir().join("db.last"), "p0\n").unwrap();
        fs::write(store.dir().join("db.salt.last"), "s0\n").unwrap();
        fs::write(store.dir().join(".migrate"), "").unwrap();
        fs::create_dir_all(store.dir().join("subdir")).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.keys().collect::<Vec<_>>(), vec!["db", "db.last"]);
        assert_eq!(records["db.last"].salt, "s0");
    }

    #[test]
    fn test_has_files_for() {
        let (store, _temp_dir) = setup_dir();
        assert!(!store.has_files_for("db").unwrap());

        fs::write(store.dir().join("db.salt"), "s\n").unwrap();
        assert!(store.has_files_for("db").unwrap());
        assert!(!store.has_files_for("web").unwrap());
        assert!(!store.has_files_for("host/root").unwrap());
    }

    #[test]
    fn test_legacy_environments() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let production = legacy_key_dir(root, "production");
        fs::create_dir_all(&production).unwrap();
        fs::write(production.join("db"), "p\n").unwrap();

        let salts_only = legacy_key_dir(root, "salts_only");
        fs::create_dir_all(&salts_only).unwrap();
        fs::write(salts_only.join("db.salt"), "s\n").unwrap();

        fs::create_dir_all(legacy_key_dir(root, "empty")).unwrap();

        assert_eq!(legacy_environments(root).unwrap(), vec!["production".to_string()]);
        assert!(legacy_environments(&root.join("missing")).unwrap().is_empty());
    }
}
