//! File-based storage backend.
//!
//! The minter state lives in a single JSON file. Writes go through a scratch
//! file that is fsynced and renamed over the state file, and an advisory lock
//! on a sidecar file keeps readers and writers in different processes apart.
//!
//! Layout for a state file at `/tmp/minter-state`:
//! ```text
//! /tmp/
//! ├── minter-state        current state
//! ├── minter-state.lock   advisory lock
//! └── minter-state.tmp    only present mid-write
//! ```

mod lock;
mod state;

pub use lock::FileLockGuard;
pub use state::FileStateStore;
