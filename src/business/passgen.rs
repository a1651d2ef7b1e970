//! Main password lifecycle API
//!
//! [`Passgen`] ties a key/value store, a random generator and the legacy
//! directory of one environment together. Its operations are spread over
//! the sibling modules the same way: lifecycle, records, environments.

use std::sync::Arc;
use crate::config::PassgenConfig;
use crate::crypto::{crypt, CharsetGenerator, GenerateError, GenerateRequest, RandomGenerator};
use crate::error::{PassgenError, Result};
use crate::legacy::{LegacyFileStore, LegacyMigrator, MigrationReport};
use crate::store::{KvEntry, KvOptions, KvStore, PasswordRecord};
use crate::utils::validate_identifier;
use super::options::PasswordOptions;

/// Password lifecycle manager
pub struct Passgen {
    pub(crate) config: PassgenConfig,
    pub(crate) store: Arc<dyn KvStore>,
    pub(crate) generator: Arc<dyn RandomGenerator>,
}

impl Passgen {
    /// Manager over `store` using the default character-pool generator
    pub fn new(config: PassgenConfig, store: Arc<dyn KvStore>) -> Self {
        Self {
            config,
            store,
            generator: Arc::new(CharsetGenerator::new()),
        }
    }

    /// Replace the random generator
    pub fn with_generator(mut self, generator: Arc<dyn RandomGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &PassgenConfig {
        &self.config
    }

    /// Backend options for the configured environment
    pub fn kv_options(&self) -> KvOptions {
        self.config.kv_options()
    }

    /// Read adapter over the configured legacy directory
    pub fn legacy_files(&self) -> LegacyFileStore {
        LegacyFileStore::new(&self.config.legacy_key_dir())
    }

    /// Return the password for `identifier`, generating it on first use.
    ///
    /// Legacy files for the identifier are migrated first. With
    /// `options.last` the previous generation is returned instead. When
    /// `options.hash` is set the result is a modular crypt string built
    /// from the password and its salt.
    pub fn passgen(&self, identifier: &str, options: &PasswordOptions, kv: &KvOptions) -> Result<String> {
        validate_identifier(identifier)?;
        self.migrate(identifier, options, kv)?;

        let record = if options.last {
            self.get_last_password(identifier, options, kv)?
        } else {
            self.get_current_password(identifier, options, kv)?
        };

        Ok(match options.hash {
            Some(algorithm) => crypt(&record.password, &record.salt, algorithm),
            None => record.password,
        })
    }

    /// Import the legacy files of `identifier`, if any
    pub fn migrate(&self, identifier: &str, options: &PasswordOptions, kv: &KvOptions) -> Result<MigrationReport> {
        validate_identifier(identifier)?;
        LegacyMigrator::new(
            self.legacy_files(),
            self.store.as_ref(),
            self.generator.as_ref(),
            &self.config.key_root_dir,
        )
        .migrate(identifier, options, kv)
    }

    /// Stored record at `key`; softfail results read as absent
    pub(crate) fn read_record(&self, key: &str, kv: &KvOptions) -> Result<Option<PasswordRecord>> {
        Ok(self.read_stored(key, kv)?.map(|(_, record)| record))
    }

    /// Raw entry at `key` together with its decoded record
    pub(crate) fn read_stored(&self, key: &str, kv: &KvOptions) -> Result<Option<(KvEntry, PasswordRecord)>> {
        Ok(self.store.get(key, kv)?.and_then(|entry| {
            let record = PasswordRecord::from_entry(&entry)?;
            Some((entry, record))
        }))
    }

    /// Write an entry as stored, value and metadata map untouched
    pub(crate) fn store_entry(&self, key: &str, entry: &KvEntry, kv: &KvOptions) -> Result<()> {
        self.store.put(key, &entry.value, &entry.metadata, kv)
    }

    pub(crate) fn store_record(&self, key: &str, record: &PasswordRecord, kv: &KvOptions) -> Result<()> {
        self.store.put(key, &record.value(), &record.metadata_map(), kv)
    }

    fn generate(&self, identifier: &str, request: &GenerateRequest) -> Result<String> {
        self.generator.generate(request).map_err(|e: GenerateError| {
            log::warn!("generation for '{}' failed: {}", identifier, e);
            PassgenError::Timeout(identifier.to_string())
        })
    }

    /// Generate a password and salt and store them at `key`.
    ///
    /// Both values are generated before anything is written.
    pub(crate) fn generate_record(
        &self,
        key: &str,
        identifier: &str,
        options: &PasswordOptions,
        kv: &KvOptions,
    ) -> Result<PasswordRecord> {
        let password = self.generate(identifier, &options.password_request())?;
        let salt = self.generate(identifier, &options.salt_request())?;
        let record = PasswordRecord::new(password, salt, Some(options.metadata()));
        self.store_record(key, &record, kv)?;
        Ok(record)
    }
}
