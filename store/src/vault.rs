//! Store trait for persisting vault engine state.

use crate::StoreError;

/// Persistence for one vault instance.
///
/// Values are opaque `Vec<u8>` so the store doesn't depend on the engine
/// crate (which would create a circular dependency). The engine serializes
/// and deserializes its own types.
pub trait VaultStore {
    /// Load the persisted engine state, if any.
    fn get_state(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Persist the engine state under `key`, replacing any previous value.
    fn put_state(&self, key: &[u8], state: &[u8]) -> Result<(), StoreError>;

    /// Remove the persisted state under `key`.
    fn delete_state(&self, key: &[u8]) -> Result<(), StoreError>;
}
