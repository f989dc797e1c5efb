//! `memory` backend: ephemeral in-process world state.
//!
//! All data lives in process memory and is discarded when the process exits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::AppError;
use super::WorldState;

#[derive(Default)]
pub struct MemoryWorldState {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryWorldState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::State("memory world state lock poisoned".into()))
    }

    /// Number of keys currently held.
    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.lock()?.is_empty())
    }
}

impl WorldState for MemoryWorldState {
    fn backend(&self) -> &str {
        "memory"
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn del_state(&self, key: &str) -> Result<(), AppError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let state = MemoryWorldState::new();

        assert_eq!(state.get_state("foo").unwrap(), None);

        state.put_state("foo", b"bar").unwrap();
        assert_eq!(state.get_state("foo").unwrap(), Some(b"bar".to_vec()));

        state.put_state("foo", b"baz").unwrap();
        assert_eq!(state.get_state("foo").unwrap(), Some(b"baz".to_vec()));
        assert_eq!(state.len().unwrap(), 1);

        state.del_state("foo").unwrap();
        assert_eq!(state.get_state("foo").unwrap(), None);
        assert!(state.is_empty().unwrap());
    }

    #[test]
    fn delete_absent_key_is_ok() {
        let state = MemoryWorldState::new();
        state.del_state("missing").unwrap();
    }

    #[test]
    fn backend_is_memory() {
        assert_eq!(MemoryWorldState::new().backend(), "memory");
    }
}
