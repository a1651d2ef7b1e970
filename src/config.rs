//! Explicit configuration for the password lifecycle

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{PassgenError, Result};
use crate::legacy::legacy_key_dir;
use crate::store::KvOptions;
use crate::KEY_ROOT_DIR;

/// Default environment name
pub const DEFAULT_ENVIRONMENT: &str = "production";

fn default_key_root_dir() -> String {
    KEY_ROOT_DIR.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

/// Where passwords live and which environment is being served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassgenConfig {
    /// Leading key folder for every stored password
    #[serde(default = "default_key_root_dir")]
    pub key_root_dir: String,
    /// Directory holding one legacy sub-directory per environment
    pub legacy_root: PathBuf,
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Use this directory for legacy files instead of the per-environment default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_key_dir: Option<PathBuf>,
}

impl PassgenConfig {
    pub fn new(legacy_root: &Path, environment: &str) -> Self {
        Self {
            key_root_dir: default_key_root_dir(),
            legacy_root: legacy_root.to_path_buf(),
            environment: environment.to_string(),
            legacy_key_dir: None,
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PassgenError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Legacy password directory of the configured environment
    pub fn legacy_key_dir(&self) -> PathBuf {
        match &self.legacy_key_dir {
            Some(dir) => dir.clone(),
            None => legacy_key_dir(&self.legacy_root, &self.environment),
        }
    }

    /// Backend options scoped to the configured environment
    pub fn kv_options(&self) -> KvOptions {
        KvOptions::new(&self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_legacy_key_dir() {
        let mut config = PassgenConfig::new(Path::new("/var/passgen"), "dev");
        assert_eq!(
            config.legacy_key_dir(),
            PathBuf::from("/var/passgen/dev/simp_autofiles/gen_passwd")
        );

        config.legacy_key_dir = Some(PathBuf::from("/tmp/keys"));
        assert_eq!(config.legacy_key_dir(), PathBuf::from("/tmp/keys"));
    }

    #[test]
    fn test_from_json_file_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("passgen.json");
        fs::write(&path, r#"{"legacy_root": "/var/passgen"}"#).unwrap();

        let config = PassgenConfig::from_json_file(&path).unwrap();
        assert_eq!(config.key_root_dir, "gen_passwd");
        assert_eq!(config.environment, "production");
        assert_eq!(config.legacy_key_dir, None);
        assert_eq!(config.kv_options().environment, "production");
    }

    #[test]
    fn test_from_json_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("passgen.json");

        let err = PassgenConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, PassgenError::Io(_)));

        fs::write(&path, "{\"environment\": \"dev\"}").unwrap();
        let err = PassgenConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, PassgenError::Config(_)));
    }
}
