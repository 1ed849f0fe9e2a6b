//! Collaborator traits — the two external reads the engine depends on.
//!
//! Both reads are synchronous, single-shot queries resolved within the same
//! unit of work. The fixed implementations are deterministic doubles for
//! tests and simulations: values only change when told to.

use skim_types::Rate;
use std::cell::Cell;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("rate reader unavailable: {0}")]
    RateUnavailable(String),

    #[error("collateral balance unavailable: {0}")]
    CollateralUnavailable(String),
}

/// Supplies the externally reported exchange rate.
pub trait RateReader {
    fn current_rate(&self) -> Result<Rate, SourceError>;
}

/// Supplies the current total raw collateral held or controlled by the
/// strategy (idle plus deployed), from the yield-source adapter.
pub trait CollateralSource {
    fn raw_collateral_balance(&self) -> Result<u128, SourceError>;
}

/// A rate reader that returns whatever it was last set to.
pub struct FixedRateReader {
    rate: Cell<Rate>,
}

impl FixedRateReader {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate: Cell::new(rate),
        }
    }

    /// Change the reported rate.
    pub fn set(&self, rate: Rate) {
        self.rate.set(rate);
    }
}

impl RateReader for FixedRateReader {
    fn current_rate(&self) -> Result<Rate, SourceError> {
        Ok(self.rate.get())
    }
}

/// A collateral source backed by a settable balance.
pub struct FixedCollateral {
    balance: Cell<u128>,
}

impl FixedCollateral {
    pub fn new(balance: u128) -> Self {
        Self {
            balance: Cell::new(balance),
        }
    }

    pub fn set(&self, balance: u128) {
        self.balance.set(balance);
    }

    pub fn get(&self) -> u128 {
        self.balance.get()
    }

    /// Add raw collateral (a deposit arriving).
    pub fn add(&self, raw: u128) {
        self.balance.set(self.balance.get() + raw);
    }

    /// Remove raw collateral (a withdrawal leaving).
    pub fn sub(&self, raw: u128) {
        self.balance.set(self.balance.get().saturating_sub(raw));
    }
}

impl CollateralSource for FixedCollateral {
    fn raw_collateral_balance(&self) -> Result<u128, SourceError> {
        Ok(self.balance.get())
    }
}
