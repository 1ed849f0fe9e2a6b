//! The share ledger — per-holder balances plus total supply.

use crate::error::ShareError;
use serde::{Deserialize, Serialize};
use skim_types::HolderAddress;
use std::collections::HashMap;

/// Per-holder share balances with an incrementally maintained total supply.
///
/// All mutation is checked arithmetic: a failed operation leaves the ledger
/// untouched. Holders with a zero balance are removed from the map so the
/// holder set stays equal to the set of actual shareholders.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShareLedger {
    balances: HashMap<HolderAddress, u128>,
    total_supply: u128,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, holder: &HolderAddress) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Number of holders with a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Issue `amount` new shares to `to`.
    pub fn mint(&mut self, to: &HolderAddress, amount: u128) -> Result<(), ShareError> {
        if amount == 0 {
            return Err(ShareError::ZeroAmount);
        }
        let balance = self.balance_of(to);
        let new_balance = balance.checked_add(amount).ok_or(ShareError::Overflow)?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(ShareError::Overflow)?;
        self.balances.insert(to.clone(), new_balance);
        self.total_supply = new_supply;
        Ok(())
    }

    /// Destroy `amount` shares held by `from`.
    pub fn burn(&mut self, from: &HolderAddress, amount: u128) -> Result<(), ShareError> {
        if amount == 0 {
            return Err(ShareError::ZeroAmount);
        }
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(ShareError::InsufficientShares {
                needed: amount,
                available: balance,
            });
        }
        // Supply is the sum of balances, so this cannot underflow.
        self.total_supply -= amount;
        self.set_balance(from, balance - amount);
        Ok(())
    }

    /// Move `amount` shares from `from` to `to`. A self-transfer is a no-op
    /// beyond the balance check.
    pub fn transfer(
        &mut self,
        from: &HolderAddress,
        to: &HolderAddress,
        amount: u128,
    ) -> Result<(), ShareError> {
        if amount == 0 {
            return Err(ShareError::ZeroAmount);
        }
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(ShareError::InsufficientShares {
                needed: amount,
                available: from_balance,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(ShareError::Overflow)?;
        self.set_balance(from, from_balance - amount);
        self.balances.insert(to.clone(), to_balance);
        Ok(())
    }

    /// Move `from`'s entire balance to `to`, returning the amount moved.
    /// Used when the beneficiary role rotates to a new address.
    pub fn transfer_all(
        &mut self,
        from: &HolderAddress,
        to: &HolderAddress,
    ) -> Result<u128, ShareError> {
        let balance = self.balance_of(from);
        if balance == 0 || from == to {
            return Ok(0);
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(balance)
            .ok_or(ShareError::Overflow)?;
        self.balances.remove(from);
        self.balances.insert(to.clone(), to_balance);
        Ok(balance)
    }

    fn set_balance(&mut self, holder: &HolderAddress, balance: u128) {
        if balance == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(holder.clone(), balance);
        }
    }
}
