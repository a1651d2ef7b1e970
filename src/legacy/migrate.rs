//! One-time import of legacy password files into a key/value store

use std::path::{Path, PathBuf};
use crate::business::PasswordOptions;
use crate::crypto::{GenerateError, RandomGenerator};
use crate::error::{PassgenError, Result};
use crate::store::{KvOptions, KvStore, PasswordRecord};
use crate::utils::{current_key, last_key, read_first_line, remove_if_exists, write_line};
use crate::LAST_SUFFIX;
use super::{LegacyFileStore, LockError, MigrationLock};

/// What a migration did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// Backend keys written
    pub stored: Vec<String>,
    /// Backend keys already holding the legacy password and salt
    pub unchanged: Vec<String>,
    /// Unusable legacy files deleted
    pub removed: Vec<PathBuf>,
    /// Salt files regenerated
    pub salts_repaired: Vec<PathBuf>,
}

impl MigrationReport {
    /// True when neither the backend nor the legacy directory was touched
    pub fn is_noop(&self) -> bool {
        self.stored.is_empty() && self.removed.is_empty() && self.salts_repaired.is_empty()
    }
}

/// Imports the legacy pairs of an identifier into a store
pub struct LegacyMigrator<'a> {
    files: LegacyFileStore,
    store: &'a dyn KvStore,
    generator: &'a dyn RandomGenerator,
    key_root_dir: &'a str,
}

impl<'a> LegacyMigrator<'a> {
    pub fn new(
        files: LegacyFileStore,
        store: &'a dyn KvStore,
        generator: &'a dyn RandomGenerator,
        key_root_dir: &'a str,
    ) -> Self {
        Self {
            files,
            store,
            generator,
            key_root_dir,
        }
    }

    /// Migrate the current and last pairs of `identifier`.
    ///
    /// Does nothing unless a file starting with the identifier exists.
    /// Otherwise holds the directory's migration lock for the whole run.
    pub fn migrate(
        &self,
        identifier: &str,
        options: &PasswordOptions,
        kv: &KvOptions,
    ) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();
        if !self.files.has_files_for(identifier)? {
            return Ok(report);
        }

        let _lock = match MigrationLock::acquire(self.files.dir(), options.gen_timeout_seconds) {
            Ok(lock) => lock,
            Err(LockError::Io(e)) => return Err(e.into()),
            Err(e) => {
                log::warn!("migration of '{}' could not take the lock: {}", identifier, e);
                return Err(PassgenError::Timeout(identifier.to_string()));
            }
        };

        let last_identifier = format!("{}{}", identifier, LAST_SUFFIX);
        self.migrate_pair(
            identifier,
            &current_key(self.key_root_dir, identifier),
            identifier,
            options,
            kv,
            &mut report,
        )?;
        self.migrate_pair(
            &last_identifier,
            &last_key(self.key_root_dir, identifier),
            identifier,
            options,
            kv,
            &mut report,
        )?;

        Ok(report)
    }

    fn migrate_pair(
        &self,
        file_identifier: &str,
        key: &str,
        identifier: &str,
        options: &PasswordOptions,
        kv: &KvOptions,
        report: &mut MigrationReport,
    ) -> Result<()> {
        let password_path = self.files.password_path(file_identifier);
        let salt_path = self.files.salt_path(file_identifier);

        let password = match read_first_line(&password_path)? {
            Some(password) if !password.is_empty() => password,
            _ => {
                self.remove_unusable(&password_path, &salt_path, report)?;
                return Ok(());
            }
        };

        let salt = match read_first_line(&salt_path)? {
            Some(salt) if !salt.is_empty() => salt,
            _ => {
                let salt = self
                    .generator
                    .generate(&options.salt_request())
                    .map_err(|_: GenerateError| PassgenError::Timeout(identifier.to_string()))?;
                write_line(&salt_path, &salt)?;
                log::info!("regenerated missing salt {}", salt_path.display());
                report.salts_repaired.push(salt_path);
                salt
            }
        };

        let stored = self
            .store
            .get(key, kv)?
            .as_ref()
            .and_then(PasswordRecord::from_entry);
        if stored.is_some_and(|record| record.same_secret(&password, &salt)) {
            log::debug!("'{}' already matches its legacy files", key);
            report.unchanged.push(key.to_string());
            return Ok(());
        }

        let record = PasswordRecord::new(password, salt, Some(options.metadata()));
        self.store.put(key, &record.value(), &record.metadata_map(), kv)?;
        log::info!("imported legacy password into '{}'", key);
        report.stored.push(key.to_string());
        Ok(())
    }

    fn remove_unusable(
        &self,
        password_path: &Path,
        salt_path: &Path,
        report: &mut MigrationReport,
    ) -> Result<()> {
        for path in [password_path, salt_path] {
            if remove_if_exists(path)? {
                log::warn!("removed unusable legacy file {}", path.display());
                report.removed.push(path.to_path_buf());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::crypto::CharsetGenerator;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    struct Fixture {
        files: LegacyFileStore,
        store: MemoryStore,
        generator: CharsetGenerator,
        _temp_dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let dir = temp_dir.path().join("gen_passwd");
            fs::create_dir_all(&dir).unwrap();
            Self {
                files: LegacyFileStore::new(&dir),
                store: MemoryStore::new(),
                generator: CharsetGenerator::new(),
                _temp_dir: temp_dir,
            }
        }

        fn write(&self, name: &str, content: &str) {
            fs::write(self.files.dir().join(name), content).unwrap();
        }

        fn migrate(&self, identifier: &str) -> MigrationReport {
            LegacyMigrator::new(self.files.clone(), &self.store, &self.generator, "gen_passwd")
                .migrate(identifier, &PasswordOptions::default(), &KvOptions::default())
                .unwrap()
        }

        fn record(&self, key: &str) -> Option<PasswordRecord> {
            self.store
                .get(key, &KvOptions::default())
                .unwrap()
                .as_ref()
                .and_then(PasswordRecord::from_entry)
        }
    }

    #[test]
    fn test_no_files_is_noop() {
        let fixture = Fixture::new();
        let report = fixture.migrate("db");
        assert!(report.is_noop());
        assert!(fixture.store.is_empty());
        assert!(!fixture.files.dir().join(".migrate").exists());
    }

    #[test]
    fn test_imports_both_pairs() {
        let fixture = Fixture::new();
        fixture.write("db", "password1\n");
        fixture.write("db.salt", "salt1\n");
        fixture.write("db.last", "password0\n");
        fixture.write("db.salt.last", "salt0\n");

        let report = fixture.migrate("db");
        assert_eq!(report.stored, vec!["gen_passwd/db", "gen_passwd/db.last"]);

        let current = fixture.record("gen_passwd/db").unwrap();
        assert!(current.same_secret("password1", "salt1"));
        let last = fixture.record("gen_passwd/db.last").unwrap();
        assert!(last.same_secret("password0", "salt0"));

        // imported files stay on disk
        assert!(fixture.files.dir().join("db").exists());
    }

    #[test]
    fn test_second_run_writes_nothing() {
        let fixture = Fixture::new();
        fixture.write("db", "password1\n");
        fixture.write("db.salt", "salt1\n");

        fixture.migrate("db");
        let report = fixture.migrate("db");
        assert!(report.is_noop());
        assert_eq!(report.unchanged, vec!["gen_passwd/db"]);
    }

    #[test]
    fn test_repairs_missing_salt() {
        let fixture = Fixture::new();
        fixture.write("db", "password1\n");
        fixture.write("db.salt", "\n");

        let report = fixture.migrate("db");
        assert_eq!(report.salts_repaired.len(), 1);

        let salt = read_first_line(&fixture.files.dir().join("db.salt")).unwrap().unwrap();
        assert_eq!(salt.len(), 16);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(fixture.record("gen_passwd/db").unwrap().salt, salt);
    }

    #[test]
    fn test_removes_unusable_pairs() {
        let fixture = Fixture::new();
        fixture.write("db", "\n");
        fixture.write("db.salt", "salt1\n");
        fixture.write("db.salt.last", "salt0\n");

        let report = fixture.migrate("db");
        assert_eq!(report.removed.len(), 3);
        assert!(report.stored.is_empty());
        assert!(fixture.store.is_empty());
        assert!(!fixture.files.dir().join("db").exists());
        assert!(!fixture.files.dir().join("db.salt.last").exists());
    }

    #[test]
    fn test_overwrites_different_record() {
        let fixture = Fixture::new();
        fixture.write("db", "password1\n");
        fixture.write("db.salt", "salt1\n");
        let stale = PasswordRecord::new("other".into(), "salt1".into(), None);
        fixture
            .store
            .put("gen_passwd/db", &stale.value(), &stale.metadata_map(), &KvOptions::default())
            .unwrap();

        let report = fixture.migrate("db");
        assert_eq!(report.stored, vec!["gen_passwd/db"]);
        assert_eq!(fixture.record("gen_passwd/db").unwrap().password, "password1");
    }
}
