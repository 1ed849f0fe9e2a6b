//! Raw-collateral ↔ normalized-value conversion.
//!
//! `value = raw × rate / 10^decimals`, all checked `u128` integer math.
//! Rounding always favors existing holders: value credited to the vault
//! rounds down, value debited from the vault rounds up, and raw paid out
//! rounds down. Overflow is an error, never a silent clamp.

use crate::error::EngineError;
use skim_types::Rate;

/// `a × b / denom`, rounded down.
fn mul_div_down(a: u128, b: u128, denom: u128) -> Result<u128, EngineError> {
    let prod = a.checked_mul(b).ok_or(EngineError::Overflow)?;
    Ok(prod / denom)
}

/// `a × b / denom`, rounded up.
fn mul_div_up(a: u128, b: u128, denom: u128) -> Result<u128, EngineError> {
    let prod = a.checked_mul(b).ok_or(EngineError::Overflow)?;
    let quot = prod / denom;
    if prod % denom == 0 {
        Ok(quot)
    } else {
        quot.checked_add(1).ok_or(EngineError::Overflow)
    }
}

/// Convert raw collateral to value, rounding down.
///
/// Used when crediting value to the vault (deposits) and when reading the
/// live vault value, so neither a depositor nor the beneficiary is ever
/// credited with dust the pool doesn't hold.
pub fn raw_to_value_down(raw: u128, rate: &Rate) -> Result<u128, EngineError> {
    rate.validate()?;
    mul_div_down(raw, rate.raw(), rate.scale())
}

/// Convert raw collateral to value, rounding up.
///
/// Used when debiting value from the vault (withdrawals), so the departing
/// holder's claim is reduced by at least the value taken.
pub fn raw_to_value_up(raw: u128, rate: &Rate) -> Result<u128, EngineError> {
    rate.validate()?;
    mul_div_up(raw, rate.raw(), rate.scale())
}

/// Convert value back to raw collateral, rounding down.
///
/// Used for payouts and max-withdraw readings: the pool never pays out more
/// raw collateral than the value covers.
pub fn value_to_raw_down(value: u128, rate: &Rate) -> Result<u128, EngineError> {
    rate.validate()?;
    mul_div_down(value, rate.scale(), rate.raw())
}
