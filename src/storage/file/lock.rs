//! Advisory file locks.
//!
//! Uses file locks (flock) for coordination between processes.
//! Note: File locks may not work correctly on all network filesystems.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::{StorageError, StorageResult};

/// Held advisory lock on a lock file. Released on drop.
#[derive(Debug)]
pub struct FileLockGuard {
    file: File,
}

impl FileLockGuard {
    /// Block until a shared (reader) lock is held.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked.
    pub fn shared(path: &Path) -> StorageResult<Self> {
        let file = open_lock_file(path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(format!("{}: {e}", path.display())))?;
        Ok(Self { file })
    }

    /// Block until an exclusive (writer) lock is held.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked.
    pub fn exclusive(path: &Path) -> StorageResult<Self> {
        let file = open_lock_file(path)?;
        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(format!("{}: {e}", path.display())))?;
        Ok(Self { file })
    }

    /// Try to take an exclusive lock without blocking.
    ///
    /// Returns `None` if another holder has the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locking fails
    /// for a reason other than contention.
    pub fn try_exclusive(path: &Path) -> StorageResult<Option<Self>> {
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(StorageError::LockFailed(format!("{}: {e}", path.display()))),
        }
    }
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock as well.
        let _ = self.file.unlock();
    }
}

fn open_lock_file(path: &Path) -> StorageResult<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    Ok(file)
}
