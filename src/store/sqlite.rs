//! SQLite key/value backend
//!
//! One row per key. Prefix matching uses `substr` rather than `LIKE`
//! because identifiers may contain `_`, which `LIKE` treats as a wildcard.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use crate::error::{PassgenError, Result};
use super::{build_listing, folder_prefix, KvBackend, KvEntry, KvListing};

/// Timestamp format used in the `updated_at` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CREATE_KV_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS passgen_kv (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        metadata TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

/// Format a DateTime for storage
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    chrono::NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Backend persisting entries in a SQLite database
pub struct SqliteStore {
    /// Path to the database file, `None` for in-memory databases
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the table exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute(CREATE_KV_TABLE, [])?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    /// Private database living as long as the store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(CREATE_KV_TABLE, [])?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PassgenError::Backend("sqlite connection lock poisoned".to_string()))
    }

    /// Time of the last write to a fully qualified key
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.connection()?;
        let stamp: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM passgen_kv WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stamp.as_deref().and_then(parse_timestamp))
    }

    fn decode_row(value: &str, metadata: &str) -> Result<KvEntry> {
        let value: Value = serde_json::from_str(value)?;
        let metadata: Map<String, Value> = serde_json::from_str(metadata)?;
        Ok(KvEntry { value, metadata })
    }
}

impl KvBackend for SqliteStore {
    fn exists_raw(&self, key: &str) -> Result<bool> {
        let conn = self.connection()?;
        let prefix = folder_prefix(key);
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM passgen_kv
             WHERE key = ?1 OR substr(key, 1, length(?2)) = ?2",
            params![key, prefix],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn get_raw(&self, key: &str) -> Result<Option<KvEntry>> {
        let conn = self.connection()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT value, metadata FROM passgen_kv WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((value, metadata)) => Self::decode_row(&value, &metadata).map(Some),
            None => Ok(None),
        }
    }

    fn put_raw(&self, key: &str, entry: &KvEntry) -> Result<()> {
        let value = serde_json::to_string(&entry.value)?;
        let metadata = serde_json::to_string(&entry.metadata)?;
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO passgen_kv (key, value, metadata, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                metadata = excluded.metadata,
                updated_at = excluded.updated_at",
            params![key, value, metadata, format_timestamp(&Utc::now())],
        )?;
        Ok(())
    }

    fn list_raw(&self, folder: &str) -> Result<Option<KvListing>> {
        let conn = self.connection()?;
        let prefix = folder_prefix(folder);
        let mut stmt = conn.prepare(
            "SELECT key, value, metadata FROM passgen_kv
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key",
        )?;

        let rows = stmt.query_map([&prefix], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (key, value, metadata) = row?;
            entries.push((key, Self::decode_row(&value, &metadata)?));
        }

        Ok(build_listing(folder, entries))
    }

    fn delete_subtree_raw(&self, folder: &str) -> Result<()> {
        let conn = self.connection()?;
        let prefix = folder_prefix(folder);
        conn.execute(
            "DELETE FROM passgen_kv WHERE key = ?1 OR substr(key, 1, length(?2)) = ?2",
            params![folder, prefix],
        )?;
        Ok(())
    }
}
