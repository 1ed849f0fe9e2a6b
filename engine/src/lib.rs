//! Skim — value-debt accounting and insolvency-gated redemption.
//!
//! One pool of appreciating collateral carries two simultaneous claims:
//! principal owed to depositors (`user_debt_value`) and yield owed to a
//! designated beneficiary (`beneficiary_debt_value`). Yield is measured
//! indirectly through an externally reported exchange rate, so the engine
//! reconciles the two claims against live vault value
//! (`raw_collateral × rate`) on every report cycle:
//!
//! - profit accrues to the beneficiary as debt plus freshly minted shares,
//! - loss burns the beneficiary's claim first (when burning is enabled),
//! - depositor principal is bookkeeping the reconciler never touches.
//!
//! Between reports, the redemption gate bounds every beneficiary-initiated
//! withdrawal, redemption, or transfer by live solvency, so the beneficiary
//! can never extract value that belongs to depositors — including through
//! indirect paths.

pub mod convert;
pub mod engine;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod rotation;
pub mod sources;

pub use engine::{Report, VaultEngine};
pub use error::EngineError;
pub use gate::max_redeemable_shares;
pub use ledger::DebtLedger;
pub use rotation::RotationState;
pub use sources::{CollateralSource, FixedCollateral, FixedRateReader, RateReader, SourceError};
