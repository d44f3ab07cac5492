//! Storage layer module.
//!
//! This module provides trait-based storage abstraction allowing different backends
//! to be used without changing minting logic.

pub mod factory;
pub mod file;
pub mod memory;
pub mod traits;

pub use factory::create_state_store;
pub use file::FileStateStore;
pub use memory::{MemoryObjectStore, MemoryStateStore};
pub use traits::{ObjectStore, StateStore, StateTransaction};
