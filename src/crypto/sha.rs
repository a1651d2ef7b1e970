//! SHA-crypt (`$5$` and `$6$`) digests with the default 5000 rounds

use sha2::{Digest, Sha256, Sha512};
use super::crypt::{encode_24bit, encode_24bit_groups};

/// SHA-crypt uses at most this many salt characters
pub const SHA_SALT_MAX: usize = 16;

const SHA_ROUNDS: usize = 5000;

const SHA256_GROUPS: &[(usize, usize, usize, usize)] = &[
    (0, 10, 20, 4),
    (21, 1, 11, 4),
    (12, 22, 2, 4),
    (3, 13, 23, 4),
    (24, 4, 14, 4),
    (15, 25, 5, 4),
    (6, 16, 26, 4),
    (27, 7, 17, 4),
    (18, 28, 8, 4),
    (9, 19, 29, 4),
];

const SHA512_GROUPS: &[(usize, usize, usize, usize)] = &[
    (0, 21, 42, 4),
    (22, 43, 1, 4),
    (44, 2, 23, 4),
    (3, 24, 45, 4),
    (25, 46, 4, 4),
    (47, 5, 26, 4),
    (6, 27, 48, 4),
    (28, 49, 7, 4),
    (50, 8, 29, 4),
    (9, 30, 51, 4),
    (31, 52, 10, 4),
    (53, 11, 32, 4),
    (12, 33, 54, 4),
    (34, 55, 13, 4),
    (56, 14, 35, 4),
    (15, 36, 57, 4),
    (37, 58, 16, 4),
    (59, 17, 38, 4),
    (18, 39, 60, 4),
    (40, 61, 19, 4),
    (62, 20, 41, 4),
];

/// Repeat `source` cyclically until `len` bytes are produced
fn stretch(source: &[u8], len: usize) -> Vec<u8> {
    source.iter().cycle().take(len).copied().collect()
}

fn sha_crypt_raw<D: Digest>(password: &[u8], salt: &[u8]) -> Vec<u8> {
    let hash_len = <D as Digest>::output_size();

    let mut hasher = D::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(password);
    let alternate = hasher.finalize().to_vec();

    let mut hasher = D::new();
    hasher.update(password);
    hasher.update(salt);

    let mut remaining = password.len();
    while remaining > hash_len {
        hasher.update(&alternate);
        remaining -= hash_len;
    }
    hasher.update(&alternate[..remaining]);

    let mut bits = password.len();
    while bits > 0 {
        if bits & 1 != 0 {
            hasher.update(&alternate);
        } else {
            hasher.update(password);
        }
        bits >>= 1;
    }
    let mut result = hasher.finalize().to_vec();

    let mut hasher = D::new();
    for _ in 0..password.len() {
        hasher.update(password);
    }
    let p_bytes = stretch(&hasher.finalize(), password.len());

    let mut hasher = D::new();
    for _ in 0..(16 + result[0] as usize) {
        hasher.update(salt);
    }
    let s_bytes = stretch(&hasher.finalize(), salt.len());

    for round in 0..SHA_ROUNDS {
        let mut hasher = D::new();
        if round & 1 != 0 {
            hasher.update(&p_bytes);
        } else {
            hasher.update(&result);
        }
        if round % 3 != 0 {
            hasher.update(&s_bytes);
        }
        if round % 7 != 0 {
            hasher.update(&p_bytes);
        }
        if round & 1 != 0 {
            hasher.update(&result);
        } else {
            hasher.update(&p_bytes);
        }
        result = hasher.finalize().to_vec();
    }

    result
}

/// SHA256-crypt digest, 43 crypt-base64 characters
pub fn sha256_crypt_digest(password: &str, salt: &str) -> String {
    let raw = sha_crypt_raw::<Sha256>(password.as_bytes(), salt.as_bytes());
    let mut encoded = encode_24bit_groups(&raw, SHA256_GROUPS);
    encoded.push_str(&encode_24bit(0, raw[31], raw[30], 3));
    encoded
}

/// SHA512-crypt digest, 86 crypt-base64 characters
pub fn sha512_crypt_digest(password: &str, salt: &str) -> String {
    let raw = sha_crypt_raw::<Sha512>(password.as_bytes(), salt.as_bytes());
    let mut encoded = encode_24bit_groups(&raw, SHA512_GROUPS);
    encoded.push_str(&encode_24bit(0, 0, raw[63], 2));
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_crypt_reference_vector() {
        assert_eq!(
            sha256_crypt_digest("Hello world!", "saltstring"),
            "5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc5"
        );
    }

    #[test]
    fn test_sha512_crypt_reference_vector() {
        assert_eq!(
            sha512_crypt_digest("Hello world!", "saltstring"),
            "svn8UoSVapNtMuq1ukKS4tPQd8iKwSMHWjl/O817G3uBnIFNjnQJuesI68u4OTLiBFdcbYEdFCoEOfaS35inz1"
        );
    }

    #[test]
    fn test_stretch() {
        assert_eq!(stretch(b"abc", 7), b"abcabca".to_vec());
        assert!(stretch(b"abc", 0).is_empty());
    }
}
