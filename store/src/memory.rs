//! In-memory store — deterministic backend for tests.

use crate::{StoreError, VaultStore};
use std::collections::HashMap;
use std::sync::Mutex;

/// A `VaultStore` kept entirely in memory. Never touches the filesystem.
#[derive(Default)]
pub struct MemoryVaultStore {
    entries: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VaultStore for MemoryVaultStore {
    fn get_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.lock().expect("store mutex poisoned");
        Ok(entries.get(key).cloned())
    }

    fn put_state(&self, key: &[u8], state: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.insert(key.to_vec(), state.to_vec());
        Ok(())
    }

    fn delete_state(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_round_trip() {
        let store = MemoryVaultStore::new();
        assert_eq!(store.get_state(b"k").unwrap(), None);

        store.put_state(b"k", b"v1").unwrap();
        assert_eq!(store.get_state(b"k").unwrap(), Some(b"v1".to_vec()));

        store.put_state(b"k", b"v2").unwrap();
        assert_eq!(store.get_state(b"k").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.len(), 1);

        store.delete_state(b"k").unwrap();
        assert_eq!(store.get_state(b"k").unwrap(), None);
        assert!(store.is_empty());
    }
}
