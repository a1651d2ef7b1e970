//! Identifier validation and backend key construction

use crate::error::{PassgenError, Result};
use crate::LAST_SUFFIX;

/// Check that an identifier only uses `[A-Za-z0-9._:/-]` and that none
/// of its `/`-separated segments is empty, `.` or `..`
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(PassgenError::InvalidIdentifier("identifier must not be empty".to_string()));
    }

    if let Some(bad) = identifier
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || "._:/-".contains(*c)))
    {
        return Err(PassgenError::InvalidIdentifier(format!(
            "'{}' contains illegal character '{}'",
            identifier, bad
        )));
    }

    if identifier
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(PassgenError::InvalidIdentifier(format!(
            "'{}' contains an empty, '.' or '..' path segment",
            identifier
        )));
    }

    Ok(())
}

/// Key of the current password: `<root>/<identifier>`
pub fn current_key(root: &str, identifier: &str) -> String {
    format!("{}/{}", root, identifier)
}

/// Key of the previous password: `<root>/<identifier>.last`
pub fn last_key(root: &str, identifier: &str) -> String {
    format!("{}/{}{}", root, identifier, LAST_SUFFIX)
}
