//! Share-ledger errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("insufficient shares: need {needed}, available {available}")]
    InsufficientShares { needed: u128, available: u128 },

    #[error("share amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow in share accounting")]
    Overflow,
}
