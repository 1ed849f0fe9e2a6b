//! Fungible share ledger.
//!
//! Shares are ordinary fungible units representing a claim on the pool.
//! One share equals one unit of normalized value at issuance, so share
//! amounts and value amounts can be compared directly. This crate knows
//! nothing about rates, debts, or the beneficiary — it is the generic
//! mint/burn/transfer substrate the engine drives.

pub mod error;
pub mod ledger;

pub use error::ShareError;
pub use ledger::ShareLedger;
