//! Password generation and modular crypt hashing
//!
//! Generation draws from complexity-selected character pools within a
//! time bound. Hashing produces MD5-crypt and SHA-crypt strings.

mod crypt;
mod md5;
mod sha;
pub mod password;

pub use crypt::{crypt, HashAlgorithm};
pub use password::{
    CharsetGenerator, Complexity, GenerateError, GenerateRequest, RandomGenerator,
    ALL_SYMBOLS, SAFE_SYMBOLS,
};
