//! The externally reported exchange rate.
//!
//! A `Rate` converts raw collateral units into normalized value units:
//! `value = raw × rate.raw / 10^rate.decimals`. The rate comes from an
//! external, manipulation-resistant reader; this type only carries the
//! reading plus the defensive validation applied before any arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lowest decimal precision accepted from a rate reader. A reported
/// precision of 0 is treated as a malfunctioning reader.
pub const MIN_RATE_DECIMALS: u32 = 1;

/// Highest decimal precision accepted from a rate reader. 10^36 still fits
/// `u128` with two orders of magnitude to spare.
pub const MAX_RATE_DECIMALS: u32 = 36;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    #[error("reported rate is zero")]
    ZeroRate,

    #[error("rate decimals {0} outside accepted range {MIN_RATE_DECIMALS}..={MAX_RATE_DECIMALS}")]
    DecimalsOutOfRange(u32),
}

/// An exchange-rate reading: raw fixed-point value plus its decimal scale.
///
/// A rate of 1.0 with 18 decimals is `Rate::new(10u128.pow(18), 18)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    raw: u128,
    decimals: u32,
}

impl Rate {
    pub fn new(raw: u128, decimals: u32) -> Self {
        Self { raw, decimals }
    }

    pub fn raw(&self) -> u128 {
        self.raw
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// `10^decimals` — the divisor that normalizes `raw × rate`.
    ///
    /// Only meaningful after `validate()`; decimals within the accepted
    /// range cannot overflow `u128`.
    pub fn scale(&self) -> u128 {
        10u128.pow(self.decimals)
    }

    /// Defensive check against a malfunctioning reader: the rate must be
    /// non-zero and its precision within the accepted range.
    pub fn validate(&self) -> Result<(), RateError> {
        if self.raw == 0 {
            return Err(RateError::ZeroRate);
        }
        if self.decimals < MIN_RATE_DECIMALS || self.decimals > MAX_RATE_DECIMALS {
            return Err(RateError::DecimalsOutOfRange(self.decimals));
        }
        Ok(())
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}e-{}", self.raw, self.decimals)
    }
}
