//! Password lifecycle layer
//!
//! This module provides the high-level [`Passgen`] API: retrieval with
//! rotation, legacy migration, explicit records and environment discovery.

pub mod passgen;
pub mod options;
pub mod lifecycle;
pub mod records;
pub mod environments;

pub use passgen::Passgen;
pub use options::PasswordOptions;
pub use records::PasswordListing;
pub use environments::EnvironmentKind;
