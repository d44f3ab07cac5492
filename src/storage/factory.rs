//! State store factory.
//!
//! Creates the appropriate state store based on configuration.

use std::sync::Arc;

use crate::config::{MinterConfig, StateBackend};
use crate::storage::file::FileStateStore;
use crate::storage::memory::MemoryStateStore;
use crate::storage::traits::StateStore;

/// Create a state store based on configuration.
///
/// Nothing is touched on disk until the first read or write.
#[must_use]
pub fn create_state_store(config: &MinterConfig) -> Arc<dyn StateStore> {
    match config.backend {
        StateBackend::File => Arc::new(FileStateStore::new(config.statefile.clone())),
        StateBackend::Memory => Arc::new(MemoryStateStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let config = MinterConfig {
            statefile: temp_dir.path().join("state"),
            ..Default::default()
        };

        let store = create_state_store(&config);
        assert_eq!(store.backend_name(), "file");
    }

    #[test]
    fn test_create_memory_store() {
        let config = MinterConfig {
            backend: StateBackend::Memory,
            ..Default::default()
        };

        let store = create_state_store(&config);
        assert_eq!(store.backend_name(), "memory");
    }
}
