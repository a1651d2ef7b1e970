//! MD5-crypt (`$1$`) digest
//!
//! Produces the 128-bit MD5-crypt result for a password and salt,
//! encoded with the crypt base64 alphabet.

use md5::{Md5, Digest};
use super::crypt::{encode_24bit, encode_24bit_groups};

/// MD5-crypt uses at most this many salt characters
pub const MD5_SALT_MAX: usize = 8;

const MD5_ROUNDS: usize = 1000;
const MAGIC: &[u8] = b"$1$";

/// Byte triples emitted by the MD5-crypt encoder, with their character counts
const MD5_GROUPS: &[(usize, usize, usize, usize)] = &[
    (0, 6, 12, 4),
    (1, 7, 13, 4),
    (2, 8, 14, 4),
    (3, 9, 15, 4),
    (4, 10, 5, 4),
];

fn md5_bytes(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

/// Compute the raw 16-byte MD5-crypt digest
fn md5_crypt_raw(password: &[u8], salt: &[u8]) -> Vec<u8> {
    let alternate = md5_bytes(&[password, salt, password]);

    let mut hasher = Md5::new();
    hasher.update(password);
    hasher.update(MAGIC);
    hasher.update(salt);

    let mut remaining = password.len();
    while remaining > 0 {
        let take = remaining.min(alternate.len());
        hasher.update(&alternate[..take]);
        remaining -= take;
    }

    let mut bits = password.len();
    while bits > 0 {
        if bits & 1 != 0 {
            hasher.update([0u8]);
        } else {
            hasher.update(&password[..1]);
        }
        bits >>= 1;
    }

    let mut result = hasher.finalize().to_vec();

    for round in 0..MD5_ROUNDS {
        let mut hasher = Md5::new();
        if round & 1 != 0 {
            hasher.update(password);
        } else {
            hasher.update(&result);
        }
        if round % 3 != 0 {
            hasher.update(salt);
        }
        if round % 7 != 0 {
            hasher.update(password);
        }
        if round & 1 != 0 {
            hasher.update(&result);
        } else {
            hasher.update(password);
        }
        result = hasher.finalize().to_vec();
    }

    result
}

/// MD5-crypt digest of `password` with an already truncated `salt`,
/// encoded as 22 crypt-base64 characters
pub fn md5_crypt_digest(password: &str, salt: &str) -> String {
    let raw = md5_crypt_raw(password.as_bytes(), salt.as_bytes());
    let mut encoded = encode_24bit_groups(&raw, MD5_GROUPS);
    encoded.push_str(&encode_24bit(0, 0, raw[11], 2));
    encoded
}
