//! In-memory storage backends.
//!
//! `MemoryStateStore` keeps minter state for the life of the process and
//! `MemoryObjectStore` stands in for a repository. Both are used by tests and
//! by embedders that manage persistence themselves.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashSet;
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::domain::{MinterState, Template};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{ObjectStore, StateStore, StateTransaction};

/// In-memory state storage.
#[derive(Default)]
pub struct MemoryStateStore {
    state: RwLock<Option<MinterState>>,
    /// Held by an open transaction and by plain writes.
    cycle: Mutex<()>,
    unavailable: AtomicBool,
    read_only: AtomicBool,
}

impl MemoryStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `state`.
    #[must_use]
    pub fn with_state(state: MinterState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
            ..Self::default()
        }
    }

    /// Make reads fail as if the medium were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make writes fail.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Currently stored state, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<MinterState> {
        self.state.read().clone()
    }

    fn load(&self, template: &Template) -> StorageResult<MinterState> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }

        Ok(self
            .state
            .read()
            .clone()
            .unwrap_or_else(|| MinterState::new(template.clone())))
    }

    fn store(&self, state: &MinterState) -> StorageResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StorageError::FileIO("store is read-only".to_string()));
        }

        *self.state.write() = Some(state.clone());
        Ok(())
    }
}

impl StateStore for MemoryStateStore {
    fn read(&self, template: &Template) -> StorageResult<MinterState> {
        self.load(template)
    }

    fn write(&self, state: &MinterState) -> StorageResult<()> {
        let _cycle = self.cycle.lock();
        self.store(state)
    }

    fn begin(&self, template: &Template) -> StorageResult<Box<dyn StateTransaction + '_>> {
        let cycle = self.cycle.lock();
        let state = self.load(template)?;
        Ok(Box::new(MemoryTransaction {
            store: self,
            state,
            _cycle: cycle,
        }))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTransaction<'a> {
    store: &'a MemoryStateStore,
    state: MinterState,
    _cycle: MutexGuard<'a, ()>,
}

impl StateTransaction for MemoryTransaction<'_> {
    fn state(&self) -> &MinterState {
        &self.state
    }

    fn commit(&mut self, state: &MinterState) -> StorageResult<()> {
        self.store.store(state)?;
        self.state = state.clone();
        Ok(())
    }
}

/// In-memory object store with live and tombstoned identifiers.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    live: DashSet<String>,
    tombstones: DashSet<String>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live object.
    pub fn insert(&self, id: impl Into<String>) {
        self.live.insert(id.into());
    }

    /// Delete a live object, leaving a tombstone.
    pub fn tombstone(&self, id: &str) {
        self.live.remove(id);
        self.tombstones.insert(id.to_string());
    }

    /// Forget an identifier entirely, tombstone included.
    pub fn purge(&self, id: &str) {
        self.live.remove(id);
        self.tombstones.remove(id);
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether there are no live objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn exists(&self, id: &str) -> bool {
        self.live.contains(id)
    }

    fn is_tombstoned(&self, id: &str) -> bool {
        self.tombstones.contains(id)
    }
}
