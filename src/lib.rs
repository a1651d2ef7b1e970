//! # passgen
//!
//! Lifecycle management for machine-generated passwords.
//!
//! ## Features
//!
//! - Current/last password generations per identifier
//! - Rotation only when an explicit length changes
//! - One-time migration of legacy flat files under an advisory lock
//! - Pluggable key/value backends (memory, files, SQLite) with softfail
//! - MD5-crypt and SHA-crypt output in modular crypt format
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use passgen::{Passgen, PassgenConfig, PasswordOptions, SqliteStore};
//!
//! let config = PassgenConfig::new(Path::new("/var/lib/passgen/legacy"), "production");
//! let store = Arc::new(SqliteStore::open(Path::new("/var/lib/passgen/passgen.db")).unwrap());
//! let passgen = Passgen::new(config, store);
//!
//! let kv = passgen.kv_options();
//! let password = passgen.passgen("mysql_root", &PasswordOptions::default(), &kv).unwrap();
//! println!("{}", password.len());
//! ```

pub mod crypto;
pub mod business;
pub mod config;
pub mod legacy;
pub mod store;
pub mod utils;
pub mod error;

// Re-export main types
pub use error::{PassgenError, Result};
pub use business::{EnvironmentKind, Passgen, PasswordListing, PasswordOptions};
pub use config::PassgenConfig;
pub use crypto::{crypt, CharsetGenerator, Complexity, HashAlgorithm, RandomGenerator};
pub use legacy::{LegacyFileStore, LegacyMigrator, MigrationReport};
pub use store::{FileStore, KvOptions, KvStore, MemoryStore, PasswordRecord, SqliteStore};

/// Leading key folder of stored passwords
pub const KEY_ROOT_DIR: &str = "gen_passwd";

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password length used when none is configured
pub const DEFAULT_PASSWORD_LENGTH: usize = 32;

/// Salt length
pub const SALT_LENGTH: usize = 16;

/// Default bound on a generation call, in seconds
pub const DEFAULT_GEN_TIMEOUT_SECONDS: f64 = 30.0;

/// Lock file serializing migrations in a legacy directory
pub const MIGRATION_LOCK_FILENAME: &str = ".migrate";

/// Suffix of the previous generation's key
pub const LAST_SUFFIX: &str = ".last";
