//! World state: the key-value store the host exposes to chaincode.
//!
//! The contract never owns persisted bytes; it reads and writes them through
//! [`WorldState`]. Ordering, isolation and commit are the host's concern, so
//! backends here only guard their own maps.
//!
//! Two backends ship with the crate:
//! - [`memory::MemoryWorldState`]: process-local map, used by tests and
//!   batch runs with `backend = "memory"`.
//! - [`file::FileWorldState`]: JSON document on disk, survives restarts.

pub mod file;
pub mod memory;

use tracing::debug;

use crate::config::{StateBackend, StateConfig};
use crate::error::AppError;

pub use file::FileWorldState;
pub use memory::MemoryWorldState;

/// Host-provided key-value interface.
///
/// All operations take `&self`; implementations use interior locking.
pub trait WorldState: Send + Sync {
    /// Backend name for logs (e.g. `"memory"`, `"file"`).
    fn backend(&self) -> &str;

    /// Bytes stored under `key`, or `None` when absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), AppError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn del_state(&self, key: &str) -> Result<(), AppError>;
}

/// Open the backend selected by `config`.
pub fn open(config: &StateConfig) -> Result<Box<dyn WorldState>, AppError> {
    let state: Box<dyn WorldState> = match config.backend {
        StateBackend::Memory => Box::new(MemoryWorldState::new()),
        StateBackend::File => Box::new(FileWorldState::open(&config.path)?),
    };
    debug!(backend = state.backend(), "world state opened");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_memory_backend() {
        let cfg = StateConfig {
            backend: StateBackend::Memory,
            path: "/nonexistent/state.json".into(),
        };
        let state = open(&cfg).unwrap();
        assert_eq!(state.backend(), "memory");
    }

    #[test]
    fn open_file_backend_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let cfg = StateConfig {
            backend: StateBackend::File,
            path: path.clone(),
        };
        let state = open(&cfg).unwrap();
        assert_eq!(state.backend(), "file");
        assert!(path.exists());
    }
}
