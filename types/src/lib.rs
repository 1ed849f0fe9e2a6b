//! Foundational types shared by every skim crate.
//!
//! All amounts and values are raw `u128` integers; the engine never touches
//! floating point. `Rate` carries the externally reported exchange rate with
//! its decimal precision, `Timestamp` is unix seconds, and `VaultParams`
//! holds the per-vault configuration fixed at construction.

pub mod address;
pub mod params;
pub mod rate;
pub mod time;

pub use address::HolderAddress;
pub use params::VaultParams;
pub use rate::{Rate, RateError};
pub use time::Timestamp;
