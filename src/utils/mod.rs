//! Utility helpers

pub mod common;
pub mod keys;

pub use common::{read_first_line, remove_if_exists, write_line};
pub use keys::{current_key, last_key, validate_identifier};
