//! Caller-facing password options
//!
//! Options arrive either as a loosely typed JSON object (as written in
//! configuration files) or through the typed builders. Everything is
//! validated here, before any file or backend is touched.

use serde_json::{Map, Value};
use crate::crypto::{Complexity, GenerateRequest, HashAlgorithm};
use crate::error::{PassgenError, Result};
use crate::store::PasswordMetadata;
use crate::{DEFAULT_GEN_TIMEOUT_SECONDS, DEFAULT_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Generation and output policy for one password request
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordOptions {
    /// Return the previous generation instead of the current one
    pub last: bool,
    pub length: usize,
    /// True when `length` was supplied by the caller rather than defaulted.
    /// Only an explicit length can rotate an existing password.
    pub length_configured: bool,
    /// Return a modular crypt hash instead of the plain password
    pub hash: Option<HashAlgorithm>,
    pub complexity: Complexity,
    pub complex_only: bool,
    /// Bound on each generation call and on the migration lock; `0` disables it
    pub gen_timeout_seconds: f64,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            last: false,
            length: DEFAULT_PASSWORD_LENGTH,
            length_configured: false,
            hash: None,
            complexity: Complexity::Alphanumeric,
            complex_only: false,
            gen_timeout_seconds: DEFAULT_GEN_TIMEOUT_SECONDS,
        }
    }
}

/// `0` selects the default length; anything shorter than the minimum is raised to it
fn normalize_length(length: usize) -> usize {
    match length {
        0 => DEFAULT_PASSWORD_LENGTH,
        n if n < MIN_PASSWORD_LENGTH => MIN_PASSWORD_LENGTH,
        n => n,
    }
}

/// Render a JSON value the way a user wrote it (strings unquoted)
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Accept non-negative integers and strings made only of digits
fn parse_integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => s.parse().ok(),
        _ => None,
    }
}

fn parse_bool(name: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        PassgenError::InvalidOption(format!("{} '{}' must be a boolean", name, display_value(value)))
    })
}

fn parse_hash(value: &Value) -> Result<Option<HashAlgorithm>> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some(HashAlgorithm::Sha256)),
        Value::String(name) => name.parse().map(Some),
        other => Err(PassgenError::InvalidOption(format!(
            "'{}' is not a valid hash",
            display_value(other)
        ))),
    }
}

impl PasswordOptions {
    /// Parse options from a JSON object; `null` yields the defaults and
    /// unknown keys are ignored
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Self::from_map(map),
            other => Err(PassgenError::InvalidOption(format!(
                "options must be an object, got '{}'",
                display_value(other)
            ))),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(value) = map.get("last") {
            options.last = parse_bool("Last", value)?;
        }

        if let Some(value) = map.get("length") {
            let length = parse_integer(value).ok_or_else(|| {
                PassgenError::InvalidOption(format!(
                    "Length '{}' must be an integer",
                    display_value(value)
                ))
            })?;
            options = options.with_length(usize::try_from(length).unwrap_or(usize::MAX));
        }

        if let Some(value) = map.get("complexity") {
            let level = parse_integer(value).ok_or_else(|| {
                PassgenError::InvalidOption(format!(
                    "Complexity '{}' must be an integer",
                    display_value(value)
                ))
            })?;
            options.complexity = u8::try_from(level)
                .ok()
                .and_then(Complexity::from_level)
                .ok_or_else(|| {
                    PassgenError::InvalidOption(format!(
                        "Complexity '{}' must be 0, 1 or 2",
                        display_value(value)
                    ))
                })?;
        }

        if let Some(value) = map.get("complex_only") {
            options.complex_only = parse_bool("Complex_only", value)?;
        }

        if let Some(value) = map.get("hash") {
            options.hash = parse_hash(value)?;
        }

        if let Some(value) = map.get("gen_timeout_seconds") {
            options.gen_timeout_seconds = value
                .as_f64()
                .filter(|seconds| *seconds >= 0.0)
                .ok_or_else(|| {
                    PassgenError::InvalidOption(format!(
                        "Gen_timeout_seconds '{}' must be a non-negative number",
                        display_value(value)
                    ))
                })?;
        }

        Ok(options)
    }

    /// Request an explicit length; this can rotate an existing password
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = normalize_length(length);
        self.length_configured = true;
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_complex_only(mut self, complex_only: bool) -> Self {
        self.complex_only = complex_only;
        self
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn with_last(mut self, last: bool) -> Self {
        self.last = last;
        self
    }

    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.gen_timeout_seconds = seconds.max(0.0);
        self
    }

    /// Metadata stored with passwords generated under these options
    pub fn metadata(&self) -> PasswordMetadata {
        PasswordMetadata {
            complexity: self.complexity.level(),
            complex_only: self.complex_only,
        }
    }

    pub(crate) fn password_request(&self) -> GenerateRequest {
        GenerateRequest {
            length: self.length,
            complexity: self.complexity,
            complex_only: self.complex_only,
            timeout_seconds: self.gen_timeout_seconds,
        }
    }

    pub(crate) fn salt_request(&self) -> GenerateRequest {
        GenerateRequest::salt(self.gen_timeout_seconds)
    }
}
