//! Advisory lock serializing migrations within a legacy directory
//!
//! Every acquisition opens its own handle on the lock file so concurrent
//! migrations never share a descriptor. The lock is released when the
//! guard is dropped, on success and error paths alike.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use fs2::FileExt;
use thiserror::Error;
use crate::MIGRATION_LOCK_FILENAME;

/// Interval between attempts while the lock is held elsewhere
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lock acquisition failures
#[derive(Error, Debug)]
pub enum LockError {
    #[error("timed out after {seconds} seconds waiting for {}", path.display())]
    TimedOut { path: PathBuf, seconds: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive lock on `<dir>/.migrate`, held until dropped
#[derive(Debug)]
pub struct MigrationLock {
    file: File,
    path: PathBuf,
}

fn is_contended(err: &std::io::Error) -> bool {
    err.raw_os_error().is_some()
        && err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl MigrationLock {
    /// Acquire the lock of `dir`, waiting at most `timeout_seconds`
    /// (`0` waits indefinitely)
    pub fn acquire(dir: &Path, timeout_seconds: f64) -> Result<Self, LockError> {
        let path = dir.join(MIGRATION_LOCK_FILENAME);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let deadline = if timeout_seconds > 0.0 {
            Duration::try_from_secs_f64(timeout_seconds)
                .ok()
                .and_then(|timeout| Instant::now().checked_add(timeout))
        } else {
            None
        };

        // unrepresentable timeouts wait like an unbounded one
        if let Some(deadline) = deadline {
            loop {
                match FileExt::try_lock_exclusive(&file) {
                    Ok(()) => break,
                    Err(e) if is_contended(&e) => {
                        let now = Instant::now();
                        if now >= deadline {
                            return Err(LockError::TimedOut {
                                path,
                                seconds: timeout_seconds,
                            });
                        }
                        thread::sleep(POLL_INTERVAL.min(deadline - now));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        } else {
            FileExt::lock_exclusive(&file)?;
        }

        log::debug!("acquired migration lock {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("failed to release migration lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let lock = MigrationLock::acquire(temp_dir.path(), 1.0).unwrap();
        assert!(lock.path().exists());
        assert_eq!(lock.path(), temp_dir.path().join(".migrate"));
    }

    #[test]
    fn test_second_handle_times_out_while_held() {
        let temp_dir = TempDir::new().unwrap();
        let _held = MigrationLock::acquire(temp_dir.path(), 1.0).unwrap();

        let start = Instant::now();
        let err = MigrationLock::acquire(temp_dir.path(), 0.2).unwrap_err();
        assert!(matches!(err, LockError::TimedOut { .. }));
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        {
            let _held = MigrationLock::acquire(temp_dir.path(), 1.0).unwrap();
        }
        assert!(MigrationLock::acquire(temp_dir.path(), 0.2).is_ok());
    }

    #[test]
    fn test_waits_for_release_from_another_thread() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();
        let held = MigrationLock::acquire(&dir, 1.0).unwrap();

        let waiter = thread::spawn(move || MigrationLock::acquire(&dir, 5.0).map(|_| ()));
        thread::sleep(Duration::from_millis(50));
        drop(held);

        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn test_huge_timeout_acquires() {
        let temp_dir = TempDir::new().unwrap();
        let lock = MigrationLock::acquire(temp_dir.path(), 1e20).unwrap();
        drop(lock);
        assert!(MigrationLock::acquire(temp_dir.path(), f64::MAX).is_ok());
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = MigrationLock::acquire(&temp_dir.path().join("missing"), 1.0).unwrap_err();
        assert!(matches!(err, LockError::Io(_)));
    }
}
