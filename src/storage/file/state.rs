//! File-based minter state storage.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::domain::{MinterState, Template};
use crate::error::{StorageError, StorageResult};
use crate::storage::file::lock::FileLockGuard;
use crate::storage::traits::{StateStore, StateTransaction};

/// File-based state storage implementation.
pub struct FileStateStore {
    /// State file.
    path: PathBuf,
    /// Sidecar lock file coordinating readers and writers across processes.
    lock_path: PathBuf,
    /// Scratch file renamed over `path` on write.
    temp_path: PathBuf,
}

impl FileStateStore {
    /// Create a store backed by the JSON file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            lock_path: sibling(&path, ".lock"),
            temp_path: sibling(&path, ".tmp"),
            path,
        }
    }

    /// Path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::FileIO(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(())
    }

    /// Take the exclusive lock, waiting if another holder has it.
    fn lock_exclusive(&self) -> StorageResult<FileLockGuard> {
        if let Some(guard) = FileLockGuard::try_exclusive(&self.lock_path)? {
            return Ok(guard);
        }
        trace!(path = %self.lock_path.display(), "Waiting for state lock");
        FileLockGuard::exclusive(&self.lock_path)
    }

    /// Caller holds a lock on `lock_path`.
    fn load(&self, template: &Template) -> StorageResult<MinterState> {
        match File::open(&self.path) {
            Ok(file) => {
                let state: MinterState = serde_json::from_reader(BufReader::new(file))?;
                Ok(state)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No state file, starting from initial state");
                Ok(MinterState::new(template.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Caller holds the exclusive lock on `lock_path`.
    fn store(&self, state: &MinterState) -> StorageResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state)?;
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| StorageError::FileIO(e.to_string()))?
            .sync_all()?;

        fs::rename(&self.temp_path, &self.path)?;

        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn read(&self, template: &Template) -> StorageResult<MinterState> {
        self.ensure_parent()?;
        let _guard = FileLockGuard::shared(&self.lock_path)?;
        self.load(template)
    }

    fn write(&self, state: &MinterState) -> StorageResult<()> {
        self.ensure_parent()?;
        let _guard = self.lock_exclusive()?;
        self.store(state)
    }

    fn begin(&self, template: &Template) -> StorageResult<Box<dyn StateTransaction + '_>> {
        self.ensure_parent()?;
        let guard = self.lock_exclusive()?;
        let state = self.load(template)?;
        Ok(Box::new(FileTransaction {
            store: self,
            state,
            _guard: guard,
        }))
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// Read-modify-write cycle holding the exclusive file lock.
struct FileTransaction<'a> {
    store: &'a FileStateStore,
    state: MinterState,
    _guard: FileLockGuard,
}

impl StateTransaction for FileTransaction<'_> {
    fn state(&self) -> &MinterState {
        &self.state
    }

    fn commit(&mut self, state: &MinterState) -> StorageResult<()> {
        self.store.store(state)?;
        self.state = state.clone();
        Ok(())
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("minter-state"), OsString::from);
    name.push(suffix);
    path.with_file_name(name)
}
