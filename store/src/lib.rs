//! Abstract storage for vault state.
//!
//! The engine serializes its own state and hands the store opaque bytes, so
//! storage backends never depend on engine types. `MemoryVaultStore` is the
//! deterministic in-memory backend used by tests; durable backends implement
//! the same trait.

pub mod error;
pub mod memory;
pub mod vault;

pub use error::StoreError;
pub use memory::MemoryVaultStore;
pub use vault::VaultStore;
