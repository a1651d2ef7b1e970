//! Discovery of environments holding passwords

use crate::error::Result;
use crate::legacy::legacy_environments;
use crate::store::KvOptions;
use super::passgen::Passgen;

/// Which storage to scan for environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvironmentKind {
    #[default]
    All,
    /// Top-level folders of the key/value store
    Kv,
    /// Sub-directories of the legacy root
    Legacy,
}

impl Passgen {
    /// Sorted names of environments that hold at least one password
    pub fn environments(&self, kind: EnvironmentKind, kv: &KvOptions) -> Result<Vec<String>> {
        let mut environments = Vec::new();

        if matches!(kind, EnvironmentKind::All | EnvironmentKind::Legacy) {
            environments.extend(legacy_environments(&self.config.legacy_root)?);
        }
        if matches!(kind, EnvironmentKind::All | EnvironmentKind::Kv) {
            environments.extend(self.kv_environments(kv)?);
        }

        environments.sort();
        environments.dedup();
        Ok(environments)
    }

    /// Environments are discovered from the store's root, so lookups are
    /// made unscoped and never fail the scan
    fn kv_environments(&self, kv: &KvOptions) -> Result<Vec<String>> {
        let mut global = kv.clone();
        global.environment = String::new();
        global.softfail = true;

        let folders = self
            .store
            .list("", &global)?
            .map(|listing| listing.folders)
            .unwrap_or_default();

        let mut environments = Vec::new();
        for folder in folders {
            let mut scoped = global.clone();
            scoped.environment = folder.clone();
            let has_keys = self
                .store
                .list(&self.config.key_root_dir, &scoped)?
                .is_some_and(|listing| !listing.keys.is_empty());
            if has_keys {
                environments.push(folder);
            }
        }
        Ok(environments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use crate::business::PasswordOptions;
    use crate::config::PassgenConfig;
    use crate::legacy::legacy_key_dir;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_environments_by_kind() {
        let temp_dir = TempDir::new().unwrap();
        let config = PassgenConfig::new(temp_dir.path(), "production");
        let passgen = Passgen::new(config, Arc::new(MemoryStore::new()));

        let legacy = legacy_key_dir(temp_dir.path(), "staging");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("db"), "password\n").unwrap();

        let options = PasswordOptions::default();
        passgen.set("db", "password1", "salt1", &options, false, &KvOptions::new("production")).unwrap();
        passgen.set("db", "password1", "salt1", &options, false, &KvOptions::new("staging")).unwrap();
        passgen.set("host/root", "password2", "salt2", &options, false, &KvOptions::new("dev")).unwrap();

        let kv = passgen.kv_options();
        assert_eq!(passgen.environments(EnvironmentKind::Legacy, &kv).unwrap(), vec!["staging"]);
        assert_eq!(
            passgen.environments(EnvironmentKind::Kv, &kv).unwrap(),
            vec!["production", "staging"]
        );
        assert_eq!(
            passgen.environments(EnvironmentKind::All, &kv).unwrap(),
            vec!["production", "staging"]
        );
    }
}
