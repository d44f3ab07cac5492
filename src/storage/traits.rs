//! Storage trait definitions.
//!
//! These traits define the two collaborators the minter consumes: somewhere
//! to keep its state, and the object store whose identifiers must never be
//! reissued.

use crate::domain::{MinterState, Template};
use crate::error::StorageResult;

/// Minter state persistence.
///
/// Implementations hold the state of a single minter.
pub trait StateStore: Send + Sync {
    /// Read the current state.
    ///
    /// Returns a fresh initial state for `template` when nothing has been
    /// persisted yet and the medium is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium is unreachable or holds unreadable data.
    fn read(&self, template: &Template) -> StorageResult<MinterState>;

    /// Replace the persisted state.
    ///
    /// A concurrent reader sees either the previous or the new state, never a
    /// mix of both.
    ///
    /// # Errors
    ///
    /// Returns an error if the state could not be made durable.
    fn write(&self, state: &MinterState) -> StorageResult<()>;

    /// Read the current state and hold exclusive access to it until the
    /// returned transaction is dropped.
    ///
    /// Other transactions, and plain writes, on the same medium wait until
    /// then, whichever store instance or process they come from.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium is unreachable, cannot be locked, or
    /// holds unreadable data.
    fn begin(&self, template: &Template) -> StorageResult<Box<dyn StateTransaction + '_>>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}

/// Exclusive read-modify-write access to a minter's state.
pub trait StateTransaction {
    /// State as read when the transaction began.
    fn state(&self) -> &MinterState;

    /// Persist `state`. Access stays exclusive until the transaction drops.
    ///
    /// # Errors
    ///
    /// Returns an error if the state could not be made durable.
    fn commit(&mut self, state: &MinterState) -> StorageResult<()>;
}

/// Existence and tombstone predicates of the backing object store.
pub trait ObjectStore: Send + Sync {
    /// Whether an object with this identifier currently exists.
    fn exists(&self, id: &str) -> bool;

    /// Whether an object with this identifier existed and was deleted.
    fn is_tombstoned(&self, id: &str) -> bool;

    /// Whether the identifier is taken, live or tombstoned.
    fn is_reserved(&self, id: &str) -> bool {
        self.exists(id) || self.is_tombstoned(id)
    }
}
