//! Single-value file helpers for the legacy password directory

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Permissions applied to files written into the legacy directory
#[cfg(unix)]
const LEGACY_FILE_MODE: u32 = 0o660;

/// Read the first line of a file without its line terminator.
///
/// Returns `None` when the file does not exist; an empty file yields
/// an empty string.
pub fn read_first_line(path: &Path) -> std::io::Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
    Ok(Some(trimmed))
}

/// Write `value` followed by a newline, replacing any existing content
pub fn write_line(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", value)?;
    file.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(LEGACY_FILE_MODE))?;
    }

    Ok(())
}

/// Remove a file if it exists
pub fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
