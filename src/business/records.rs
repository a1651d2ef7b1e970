//! Direct record access: lookup, explicit set and listing

use std::collections::BTreeMap;
use crate::error::{PassgenError, Result};
use crate::store::{KvOptions, PasswordRecord};
use crate::utils::{current_key, last_key, validate_identifier};
use crate::LAST_SUFFIX;
use super::options::PasswordOptions;
use super::passgen::Passgen;

/// Passwords and sub-folders stored below a folder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswordListing {
    /// Current records keyed by identifier; `.last` records are left out
    pub passwords: BTreeMap<String, PasswordRecord>,
    pub folders: Vec<String>,
}

impl Passgen {
    /// Stored record of `identifier`, without generating or migrating
    pub fn get(&self, identifier: &str, kv: &KvOptions) -> Result<Option<PasswordRecord>> {
        validate_identifier(identifier)?;
        self.read_record(&current_key(&self.config.key_root_dir, identifier), kv)
    }

    /// Store an explicit password and salt for `identifier`.
    ///
    /// With `backup`, an existing current record is copied to `.last`
    /// first. The stored metadata comes from `options`.
    pub fn set(
        &self,
        identifier: &str,
        password: &str,
        salt: &str,
        options: &PasswordOptions,
        backup: bool,
        kv: &KvOptions,
    ) -> Result<()> {
        validate_identifier(identifier)?;
        if password.is_empty() {
            return Err(PassgenError::InvalidOption("password must not be empty".to_string()));
        }
        if salt.is_empty() {
            return Err(PassgenError::InvalidOption("salt must not be empty".to_string()));
        }

        let root = &self.config.key_root_dir;
        let key = current_key(root, identifier);

        if backup {
            if let Some((entry, _)) = self.read_stored(&key, kv)? {
                self.store_entry(&last_key(root, identifier), &entry, kv)?;
            }
        }

        let record = PasswordRecord::new(password.to_string(), salt.to_string(), Some(options.metadata()));
        self.store_record(&key, &record, kv)?;
        log::info!("stored password for '{}'", identifier);
        Ok(())
    }

    /// Passwords directly below the key root, or below `folder` inside it.
    ///
    /// A missing folder gives an empty listing.
    pub fn list(&self, folder: Option<&str>, kv: &KvOptions) -> Result<PasswordListing> {
        let root = &self.config.key_root_dir;
        let folder_key = match folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
            Some(folder) => {
                validate_identifier(folder)?;
                format!("{}/{}", root, folder)
            }
            None => root.clone(),
        };

        let mut listing = PasswordListing::default();
        if !self.store.exists(&folder_key, kv)? {
            return Ok(listing);
        }
        let Some(entries) = self.store.list(&folder_key, kv)? else {
            return Ok(listing);
        };

        listing.passwords = entries
            .keys
            .iter()
            .filter(|(name, _)| !name.ends_with(LAST_SUFFIX))
            .filter_map(|(name, entry)| PasswordRecord::from_entry(entry).map(|r| (name.clone(), r)))
            .collect();
        listing.folders = entries.folders;
        Ok(listing)
    }
}
