//! The value-debt ledger — the two running claims on the pool.
//!
//! `user_debt_value` is nominal principal owed to ordinary depositors; it
//! moves only with deposits and withdrawals, never with rate movement.
//! `beneficiary_debt_value` is accrued, unwithdrawn yield owed to the
//! beneficiary; it moves only through reconciliation (`accrue_yield` /
//! `absorb_loss`).
//!
//! Fields are private on purpose: the designated mutators below are the only
//! write paths, so every other module reads the claims through accessors and
//! cannot break the accounting discipline.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DebtLedger {
    user_debt_value: u128,
    beneficiary_debt_value: u128,
}

impl DebtLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nominal value owed to ordinary depositors.
    pub fn user_debt_value(&self) -> u128 {
        self.user_debt_value
    }

    /// Accrued, unwithdrawn yield owed to the beneficiary.
    pub fn beneficiary_debt_value(&self) -> u128 {
        self.beneficiary_debt_value
    }

    /// Sum of both claims — the value claimed as of the last mutations,
    /// compared against live vault value during reconciliation.
    pub fn total_claimed_value(&self) -> Option<u128> {
        self.user_debt_value.checked_add(self.beneficiary_debt_value)
    }

    /// Deposit hook: record `value` of new depositor principal.
    pub fn credit_user(&mut self, value: u128) -> Result<(), EngineError> {
        self.user_debt_value = self
            .user_debt_value
            .checked_add(value)
            .ok_or(EngineError::Overflow)?;
        Ok(())
    }

    /// Withdrawal hook: release `value` of depositor principal.
    ///
    /// Saturates at zero: the withdrawal debit rounds up while the deposit
    /// credit rounded down, so repeated round trips can try to debit a few
    /// units more than were ever credited. The clamp is that documented
    /// rounding-safety measure, not silent data loss.
    pub fn debit_user(&mut self, value: u128) {
        self.user_debt_value = self.user_debt_value.saturating_sub(value);
    }

    /// Reconciliation, profit side: grow the beneficiary's claim by `delta`.
    pub fn accrue_yield(&mut self, delta: u128) -> Result<(), EngineError> {
        self.beneficiary_debt_value = self
            .beneficiary_debt_value
            .checked_add(delta)
            .ok_or(EngineError::Overflow)?;
        Ok(())
    }

    /// Reconciliation, loss side: shrink the beneficiary's claim by up to
    /// `loss`, returning the amount actually absorbed. Loss beyond the
    /// beneficiary's claim is not absorbed here — it surfaces as insolvency.
    pub fn absorb_loss(&mut self, loss: u128) -> u128 {
        let absorbed = self.beneficiary_debt_value.min(loss);
        self.beneficiary_debt_value -= absorbed;
        absorbed
    }
}
