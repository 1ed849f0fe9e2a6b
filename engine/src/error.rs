//! Engine errors.
//!
//! Four families: input validation, insolvency protection, state-machine
//! violations, and arithmetic overflow. Every error is surfaced to the
//! immediate caller before any state mutation persists.

use skim_shares::ShareError;
use skim_types::RateError;
use thiserror::Error;

use crate::sources::SourceError;

#[derive(Debug, Error)]
pub enum EngineError {
    // ── Input validation ─────────────────────────────────────────────────
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("amount converts to zero value at the current rate")]
    ZeroValue,

    #[error("invalid rate reading: {0}")]
    InvalidRate(#[from] RateError),

    #[error("invalid holder address: {0}")]
    InvalidAddress(String),

    #[error("the beneficiary cannot deposit as an ordinary holder")]
    BeneficiaryDeposit,

    // ── Insolvency protection ────────────────────────────────────────────
    #[error("beneficiary redemption of {requested} exceeds solvency ceiling {max}")]
    InsolvencyProtected { requested: u128, max: u128 },

    // ── State-machine violations ─────────────────────────────────────────
    #[error("caller is not the {required} role")]
    NotAuthorized { required: &'static str },

    #[error("vault is shut down, deposits are blocked")]
    VaultShutdown,

    #[error("a recipient rotation is already pending")]
    RotationPending,

    #[error("no recipient rotation is pending")]
    NoPendingRotation,

    #[error("rotation cooldown not elapsed, {remaining_secs}s remaining")]
    CooldownNotElapsed { remaining_secs: u64 },

    #[error("proposed recipient is already the beneficiary")]
    SameBeneficiary,

    // ── Arithmetic / collaborators ───────────────────────────────────────
    #[error("arithmetic overflow in value accounting")]
    Overflow,

    #[error(transparent)]
    Shares(#[from] ShareError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("storage error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
