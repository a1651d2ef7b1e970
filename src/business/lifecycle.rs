//! Current/last password state machine

use crate::error::Result;
use crate::store::{KvOptions, PasswordRecord};
use crate::utils::{current_key, last_key, validate_identifier};
use super::options::PasswordOptions;
use super::passgen::Passgen;

impl Passgen {
    /// Current password and salt of `identifier`.
    ///
    /// Generates and stores a record on first use. An existing record is
    /// kept unless the caller explicitly asked for a different length; in
    /// that case it is copied to `.last` and replaced.
    pub fn get_current_password(
        &self,
        identifier: &str,
        options: &PasswordOptions,
        kv: &KvOptions,
    ) -> Result<PasswordRecord> {
        validate_identifier(identifier)?;
        let root = &self.config.key_root_dir;
        let key = current_key(root, identifier);

        match self.read_stored(&key, kv)? {
            None => self.generate_record(&key, identifier, options, kv),
            Some((entry, record))
                if options.length_configured
                    && record.password.chars().count() != options.length =>
            {
                log::info!(
                    "rotating password for '{}': stored length {} differs from requested {}",
                    identifier,
                    record.password.chars().count(),
                    options.length
                );
                self.store_entry(&last_key(root, identifier), &entry, kv)?;
                self.generate_record(&key, identifier, options, kv)
            }
            Some((_, record)) => Ok(record),
        }
    }

    /// Previous password and salt of `identifier`.
    ///
    /// Falls back to the current record without copying it. With nothing
    /// stored, a record is generated directly under `.last` so that the
    /// next call returns the same value.
    pub fn get_last_password(
        &self,
        identifier: &str,
        options: &PasswordOptions,
        kv: &KvOptions,
    ) -> Result<PasswordRecord> {
        validate_identifier(identifier)?;
        let root = &self.config.key_root_dir;
        let key = last_key(root, identifier);

        if let Some(record) = self.read_record(&key, kv)? {
            return Ok(record);
        }
        if let Some(record) = self.read_record(&current_key(root, identifier), kv)? {
            return Ok(record);
        }

        log::warn!(
            "no password stored for '{}', generating its last password; \
             declare the resource using the current password earlier in the manifest",
            identifier
        );
        self.generate_record(&key, identifier, options, kv)
    }
}
