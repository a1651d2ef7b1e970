//! Data models for stored entries and password records

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A value and its metadata as held by a backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KvEntry {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Immediate children of a folder
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KvListing {
    /// Entries stored directly in the folder, keyed by name
    pub keys: BTreeMap<String, KvEntry>,
    /// Names of sub-folders
    pub folders: Vec<String>,
}

/// Generation settings persisted alongside a password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PasswordMetadata {
    pub complexity: u8,
    pub complex_only: bool,
}

#[derive(Serialize, Deserialize)]
struct PasswordValue {
    password: String,
    #[serde(default)]
    salt: String,
}

/// A password, its salt and the settings it was generated with
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordRecord {
    pub password: String,
    pub salt: String,
    /// Absent for records imported from legacy files or stored without metadata
    pub metadata: Option<PasswordMetadata>,
}

impl PasswordRecord {
    pub fn new(password: String, salt: String, metadata: Option<PasswordMetadata>) -> Self {
        Self { password, salt, metadata }
    }

    /// Decode a stored entry.
    ///
    /// Returns `None` when the entry carries no password, which is how an
    /// empty softfail result shows up.
    pub fn from_entry(entry: &KvEntry) -> Option<Self> {
        let value: PasswordValue = serde_json::from_value(entry.value.clone()).ok()?;
        let metadata = if entry.metadata.is_empty() {
            None
        } else {
            serde_json::from_value(Value::Object(entry.metadata.clone())).ok()
        };
        Some(Self {
            password: value.password,
            salt: value.salt,
            metadata,
        })
    }

    /// Value half of the stored encoding: `{password, salt}`
    pub fn value(&self) -> Value {
        serde_json::json!({
            "password": self.password,
            "salt": self.salt,
        })
    }

    /// Metadata half of the stored encoding; empty when there is none
    pub fn metadata_map(&self) -> Map<String, Value> {
        match self.metadata {
            Some(metadata) => {
                let mut map = Map::new();
                map.insert("complexity".to_string(), Value::from(metadata.complexity));
                map.insert("complex_only".to_string(), Value::from(metadata.complex_only));
                map
            }
            None => Map::new(),
        }
    }

    /// True when password and salt match, whatever the metadata
    pub fn same_secret(&self, password: &str, salt: &str) -> bool {
        self.password == password && self.salt == salt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_entry() {
        let entry = KvEntry {
            value: json!({"password": "secretpw", "salt": "0123456789abcdef"}),
            metadata: json!({"complexity": 1, "complex_only": true}).as_object().unwrap().clone(),
        };
        let record = PasswordRecord::from_entry(&entry).unwrap();
        assert_eq!(record.password, "secretpw");
        assert_eq!(record.salt, "0123456789abcdef");
        assert_eq!(record.metadata, Some(PasswordMetadata { complexity: 1, complex_only: true }));
    }

    #[test]
    fn test_record_without_metadata() {
        let entry = KvEntry {
            value: json!({"password": "secretpw", "salt": "s"}),
            metadata: Map::new(),
        };
        let record = PasswordRecord::from_entry(&entry).unwrap();
        assert_eq!(record.metadata, None);
        assert!(record.metadata_map().is_empty());
    }

    #[test]
    fn test_empty_entry_is_absent() {
        assert!(PasswordRecord::from_entry(&KvEntry::default()).is_none());
        let entry = KvEntry {
            value: json!({"salt": "only"}),
            metadata: Map::new(),
        };
        assert!(PasswordRecord::from_entry(&entry).is_none());
    }

    #[test]
    fn test_unrelated_metadata_ignored() {
        let entry = KvEntry {
            value: json!({"password": "pw", "salt": "s"}),
            metadata: json!({"owner": "ops"}).as_object().unwrap().clone(),
        };
        assert_eq!(PasswordRecord::from_entry(&entry).unwrap().metadata, None);
    }

    #[test]
    fn test_record_encoding() {
        let record = PasswordRecord::new(
            "pw".to_string(),
            "salt".to_string(),
            Some(PasswordMetadata { complexity: 2, complex_only: false }),
        );
        assert_eq!(record.value(), json!({"password": "pw", "salt": "salt"}));
        assert_eq!(
            Value::Object(record.metadata_map()),
            json!({"complexity": 2, "complex_only": false})
        );
        assert!(record.same_secret("pw", "salt"));
        assert!(!record.same_secret("pw", "other"));
    }
}
