//! Modular crypt format encoding
//!
//! Formats a password and salt as `$<code>$<salt>$<digest>`, where the
//! code identifies the digest algorithm.

use std::fmt;
use std::str::FromStr;
use crate::error::PassgenError;
use super::md5::{md5_crypt_digest, MD5_SALT_MAX};
use super::sha::{sha256_crypt_digest, sha512_crypt_digest, SHA_SALT_MAX};

/// Alphabet used by crypt(3) for digest encoding
const CRYPT_ALPHABET: &[u8] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Digest algorithm used to hash a password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Modular crypt identifier
    pub fn code(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "1",
            HashAlgorithm::Sha256 => "5",
            HashAlgorithm::Sha512 => "6",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Number of salt characters the algorithm consumes
    fn max_salt_len(self) -> usize {
        match self {
            HashAlgorithm::Md5 => MD5_SALT_MAX,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha512 => SHA_SALT_MAX,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = PassgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(PassgenError::InvalidOption(format!("'{}' is not a valid hash", other))),
        }
    }
}

/// Encode three bytes as `count` crypt-base64 characters, least significant first
pub(crate) fn encode_24bit(b2: u8, b1: u8, b0: u8, count: usize) -> String {
    let mut word = ((b2 as u32) << 16) | ((b1 as u32) << 8) | b0 as u32;
    let mut out = String::with_capacity(count);
    for _ in 0..count {
        out.push(CRYPT_ALPHABET[(word & 0x3f) as usize] as char);
        word >>= 6;
    }
    out
}

/// Encode `raw` using a table of `(b2, b1, b0, count)` byte index groups
pub(crate) fn encode_24bit_groups(raw: &[u8], groups: &[(usize, usize, usize, usize)]) -> String {
    groups
        .iter()
        .map(|&(b2, b1, b0, count)| encode_24bit(raw[b2], raw[b1], raw[b0], count))
        .collect()
}

/// Hash `password` with `salt` and format the result in modular crypt format
///
/// The salt is cut at the first `$` and truncated to the length the
/// algorithm accepts; the truncated salt is what appears in the output.
pub fn crypt(password: &str, salt: &str, algorithm: HashAlgorithm) -> String {
    let salt = salt.split('$').next().unwrap_or_default();
    let salt: String = salt.chars().take(algorithm.max_salt_len()).collect();

    let digest = match algorithm {
        HashAlgorithm::Md5 => md5_crypt_digest(password, &salt),
        HashAlgorithm::Sha256 => sha256_crypt_digest(password, &salt),
        HashAlgorithm::Sha512 => sha512_crypt_digest(password, &salt),
    };

    format!("${}${}${}", algorithm.code(), salt, digest)
}
