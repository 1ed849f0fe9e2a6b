//! The vault engine — deposit/withdrawal hooks, reconciliation, the
//! redemption gate, and beneficiary rotation, over one shared ledger.
//!
//! Every public operation is a synchronous `&mut self` call that validates
//! fully before mutating: a returned `Err` means no state changed. Time and
//! both external reads (rate, collateral balance) are passed in explicitly,
//! so every calculation replays deterministically in tests.

use serde::{Deserialize, Serialize};
use skim_shares::ShareLedger;
use skim_store::VaultStore;
use skim_types::{HolderAddress, Rate, Timestamp, VaultParams};
use tracing::{debug, info, warn};

use crate::convert;
use crate::error::EngineError;
use crate::gate;
use crate::ledger::DebtLedger;
use crate::rotation::RotationState;
use crate::sources::{CollateralSource, RateReader};

/// Store key under which the engine persists itself.
const STATE_KEY: &[u8] = b"vault_state";

/// Outcome of one reconciliation cycle.
///
/// `loss` is the full unclaimed shortfall, even when only part of it was
/// absorbed by burning the beneficiary's claim; the unabsorbed remainder
/// surfaces as a drop in realizable value per share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub profit: u128,
    pub loss: u128,
}

/// The value-debt accounting engine for one vault instance.
///
/// The debt ledger and the share ledger are the only shared mutable
/// resources; both are private and reachable only through the operations
/// below — the deposit/withdrawal hooks, `report`, and rotation finalize are
/// the sole write paths.
#[derive(Serialize, Deserialize)]
pub struct VaultEngine {
    params: VaultParams,
    management: HolderAddress,
    keeper: HolderAddress,
    beneficiary: HolderAddress,
    ledger: DebtLedger,
    shares: ShareLedger,
    rotation: RotationState,
    is_shutdown: bool,
    last_report_at: Option<Timestamp>,
    last_reported_value: u128,
}

impl VaultEngine {
    pub fn new(
        params: VaultParams,
        management: HolderAddress,
        keeper: HolderAddress,
        beneficiary: HolderAddress,
    ) -> Result<Self, EngineError> {
        for addr in [&management, &keeper, &beneficiary] {
            if !addr.is_valid() {
                return Err(EngineError::InvalidAddress(addr.to_string()));
            }
        }
        Ok(Self {
            params,
            management,
            keeper,
            beneficiary,
            ledger: DebtLedger::new(),
            shares: ShareLedger::new(),
            rotation: RotationState::Stable,
            is_shutdown: false,
            last_report_at: None,
            last_reported_value: 0,
        })
    }

    // ── Read accessors ───────────────────────────────────────────────────

    pub fn user_debt_value(&self) -> u128 {
        self.ledger.user_debt_value()
    }

    pub fn beneficiary_debt_value(&self) -> u128 {
        self.ledger.beneficiary_debt_value()
    }

    pub fn beneficiary(&self) -> &HolderAddress {
        &self.beneficiary
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    pub fn params(&self) -> &VaultParams {
        &self.params
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown
    }

    pub fn last_report_at(&self) -> Option<Timestamp> {
        self.last_report_at
    }

    /// Vault value recorded at the last report (observability only; all
    /// gating and reconciliation math uses live reads).
    pub fn last_reported_value(&self) -> u128 {
        self.last_reported_value
    }

    pub fn balance_of(&self, holder: &HolderAddress) -> u128 {
        self.shares.balance_of(holder)
    }

    pub fn total_supply(&self) -> u128 {
        self.shares.total_supply()
    }

    /// Whether realizable vault value is currently below depositor principal.
    pub fn is_insolvent(
        &self,
        reader: &dyn RateReader,
        collateral: &dyn CollateralSource,
    ) -> Result<bool, EngineError> {
        let rate = self.read_rate(reader)?;
        let vault_value = self.live_vault_value(&rate, collateral)?;
        Ok(vault_value < self.ledger.user_debt_value())
    }

    // ── Deposit / withdrawal hooks ───────────────────────────────────────

    /// Deposit `raw_amount` of collateral for `holder`, crediting principal
    /// and minting shares 1:1 with the credited value. Returns the shares
    /// minted.
    pub fn deposit(
        &mut self,
        holder: &HolderAddress,
        raw_amount: u128,
        reader: &dyn RateReader,
    ) -> Result<u128, EngineError> {
        if self.is_shutdown {
            return Err(EngineError::VaultShutdown);
        }
        if raw_amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if *holder == self.beneficiary {
            // Mixing principal into the beneficiary's position would put
            // depositor money behind the redemption gate.
            return Err(EngineError::BeneficiaryDeposit);
        }
        let rate = self.read_rate(reader)?;
        let value = convert::raw_to_value_down(raw_amount, &rate)?;
        if value == 0 {
            return Err(EngineError::ZeroValue);
        }
        self.ledger.credit_user(value)?;
        if let Err(e) = self.shares.mint(holder, value) {
            self.ledger.debit_user(value);
            return Err(e.into());
        }
        debug!(%holder, raw_amount, value, "deposit");
        Ok(value)
    }

    /// Withdraw `raw_amount` of collateral on behalf of `owner`, burning the
    /// corresponding shares. Beneficiary withdrawals are checked against the
    /// redemption gate first. Returns the shares burned.
    pub fn withdraw(
        &mut self,
        owner: &HolderAddress,
        receiver: &HolderAddress,
        raw_amount: u128,
        reader: &dyn RateReader,
        collateral: &dyn CollateralSource,
    ) -> Result<u128, EngineError> {
        if raw_amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let rate = self.read_rate(reader)?;
        let shares_needed = convert::raw_to_value_up(raw_amount, &rate)?;
        self.debit_shares(owner, shares_needed, &rate, collateral)?;
        debug!(%owner, %receiver, raw_amount, shares = shares_needed, "withdraw");
        Ok(shares_needed)
    }

    /// Redeem `share_amount` shares on behalf of `owner`. Beneficiary
    /// redemptions are checked against the redemption gate first. Returns
    /// the raw collateral owed to `receiver`.
    pub fn redeem(
        &mut self,
        owner: &HolderAddress,
        receiver: &HolderAddress,
        share_amount: u128,
        reader: &dyn RateReader,
        collateral: &dyn CollateralSource,
    ) -> Result<u128, EngineError> {
        if share_amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        let rate = self.read_rate(reader)?;
        let raw_out = convert::value_to_raw_down(share_amount, &rate)?;
        self.debit_shares(owner, share_amount, &rate, collateral)?;
        debug!(%owner, %receiver, shares = share_amount, raw_out, "redeem");
        Ok(raw_out)
    }

    /// Move shares between holders. Outbound transfers from the beneficiary
    /// are gated exactly like withdrawals — the gate covers indirect exits,
    /// not just redemptions. Serves both transfer and transferFrom; allowance
    /// bookkeeping is the host's concern.
    pub fn transfer(
        &mut self,
        from: &HolderAddress,
        to: &HolderAddress,
        share_amount: u128,
        reader: &dyn RateReader,
        collateral: &dyn CollateralSource,
    ) -> Result<(), EngineError> {
        if share_amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if *from == self.beneficiary {
            let rate = self.read_rate(reader)?;
            let max = self.gate_ceiling(&rate, collateral)?;
            if share_amount > max {
                return Err(EngineError::InsolvencyProtected {
                    requested: share_amount,
                    max,
                });
            }
        }
        self.shares.transfer(from, to, share_amount)?;
        Ok(())
    }

    /// Maximum shares `holder` can currently redeem. For the beneficiary
    /// this is the live redemption-gate ceiling; anyone else is bounded only
    /// by their balance.
    pub fn max_redeem(
        &self,
        holder: &HolderAddress,
        reader: &dyn RateReader,
        collateral: &dyn CollateralSource,
    ) -> Result<u128, EngineError> {
        if *holder != self.beneficiary {
            return Ok(self.shares.balance_of(holder));
        }
        let rate = self.read_rate(reader)?;
        self.gate_ceiling(&rate, collateral)
    }

    /// Maximum raw collateral `holder` can currently withdraw.
    ///
    /// The rate is read once and threaded through both the gate ceiling and
    /// the share→raw conversion, so a live reader cannot produce a ceiling
    /// and a conversion at two different rates.
    pub fn max_withdraw(
        &self,
        holder: &HolderAddress,
        reader: &dyn RateReader,
        collateral: &dyn CollateralSource,
    ) -> Result<u128, EngineError> {
        let rate = self.read_rate(reader)?;
        let shares = if *holder == self.beneficiary {
            self.gate_ceiling(&rate, collateral)?
        } else {
            self.shares.balance_of(holder)
        };
        convert::value_to_raw_down(shares, &rate)
    }

    // ── Reconciliation ───────────────────────────────────────────────────

    /// One report cycle: compare live vault value against the claimed total
    /// and route the difference. Profit accrues to the beneficiary (debt and
    /// freshly minted shares); loss burns the beneficiary's claim first when
    /// burning is enabled. Depositor principal is never touched.
    pub fn report(
        &mut self,
        caller: &HolderAddress,
        reader: &dyn RateReader,
        collateral: &dyn CollateralSource,
        now: Timestamp,
    ) -> Result<Report, EngineError> {
        self.require_reporter(caller)?;
        let rate = self.read_rate(reader)?;
        let current_value = self.live_vault_value(&rate, collateral)?;
        let claimed = self
            .ledger
            .total_claimed_value()
            .ok_or(EngineError::Overflow)?;

        let report = if current_value > claimed {
            let profit = current_value - claimed;
            self.ledger.accrue_yield(profit)?;
            if let Err(e) = self.shares.mint(&self.beneficiary, profit) {
                self.ledger.absorb_loss(profit);
                return Err(e.into());
            }
            info!(
                profit,
                vault_value = current_value,
                beneficiary_debt = self.ledger.beneficiary_debt_value(),
                "report: profit skimmed to beneficiary"
            );
            Report { profit, loss: 0 }
        } else if current_value < claimed {
            let loss = claimed - current_value;
            if self.params.burning_enabled {
                let absorbed = self.ledger.absorb_loss(loss);
                // Shares may already have left via redemption since the
                // claim accrued, so the burn is capped by the live balance.
                let share_burn = absorbed.min(self.shares.balance_of(&self.beneficiary));
                if share_burn > 0 {
                    self.shares.burn(&self.beneficiary, share_burn)?;
                }
                if loss > absorbed {
                    warn!(
                        loss,
                        absorbed,
                        user_debt = self.ledger.user_debt_value(),
                        vault_value = current_value,
                        "report: loss exceeds beneficiary buffer, vault under water"
                    );
                } else {
                    info!(loss, absorbed, "report: loss absorbed by beneficiary claim");
                }
            } else {
                info!(loss, "report: loss recorded, burning disabled");
            }
            Report { profit: 0, loss }
        } else {
            Report { profit: 0, loss: 0 }
        };

        self.last_report_at = Some(now);
        self.last_reported_value = current_value;
        Ok(report)
    }

    // ── Recipient rotation ───────────────────────────────────────────────

    /// Propose a new beneficiary, starting the exit-window cooldown.
    pub fn propose_recipient_change(
        &mut self,
        caller: &HolderAddress,
        new_recipient: HolderAddress,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.require_management(caller)?;
        if !new_recipient.is_valid() {
            return Err(EngineError::InvalidAddress(new_recipient.to_string()));
        }
        if new_recipient == self.beneficiary {
            return Err(EngineError::SameBeneficiary);
        }
        self.rotation.propose(new_recipient.clone(), now)?;
        info!(%new_recipient, at = %now, "recipient rotation proposed");
        Ok(())
    }

    /// Abandon a pending rotation.
    pub fn cancel_recipient_change(&mut self, caller: &HolderAddress) -> Result<(), EngineError> {
        self.require_management(caller)?;
        self.rotation.cancel()?;
        info!("recipient rotation cancelled");
        Ok(())
    }

    /// Finalize a pending rotation after the cooldown. Callable by anyone.
    /// The new address takes over the accrued claim and the old
    /// beneficiary's entire share balance.
    pub fn finalize_recipient_change(&mut self, now: Timestamp) -> Result<(), EngineError> {
        let new_beneficiary = self
            .rotation
            .finalize(self.params.rotation_cooldown_secs, now)?;
        let moved = self
            .shares
            .transfer_all(&self.beneficiary, &new_beneficiary)?;
        let old = std::mem::replace(&mut self.beneficiary, new_beneficiary);
        info!(
            %old,
            new = %self.beneficiary,
            shares_moved = moved,
            beneficiary_debt = self.ledger.beneficiary_debt_value(),
            "recipient rotation finalized"
        );
        Ok(())
    }

    // ── Management ───────────────────────────────────────────────────────

    /// Block new deposits. Withdrawals and reporting continue.
    pub fn shutdown(&mut self, caller: &HolderAddress) -> Result<(), EngineError> {
        self.require_management(caller)?;
        self.is_shutdown = true;
        info!("vault shut down, deposits blocked");
        Ok(())
    }

    /// Toggle the first-loss-buffer behavior between report cycles.
    pub fn set_burning_enabled(
        &mut self,
        caller: &HolderAddress,
        enabled: bool,
    ) -> Result<(), EngineError> {
        self.require_management(caller)?;
        self.params.burning_enabled = enabled;
        info!(enabled, "burning toggled");
        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Persist the full engine state through a store backend.
    pub fn save_to_store(&self, store: &dyn VaultStore) -> Result<(), EngineError> {
        let bytes =
            bincode::serialize(self).map_err(|e| EngineError::Serialization(e.to_string()))?;
        store
            .put_state(STATE_KEY, &bytes)
            .map_err(|e| EngineError::Store(e.to_string()))
    }

    /// Restore an engine from a store backend, if one was persisted.
    pub fn load_from_store(store: &dyn VaultStore) -> Result<Option<Self>, EngineError> {
        let bytes = store
            .get_state(STATE_KEY)
            .map_err(|e| EngineError::Store(e.to_string()))?;
        match bytes {
            None => Ok(None),
            Some(bytes) => {
                let engine = bincode::deserialize(&bytes)
                    .map_err(|e| EngineError::Serialization(e.to_string()))?;
                Ok(Some(engine))
            }
        }
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn read_rate(&self, reader: &dyn RateReader) -> Result<Rate, EngineError> {
        let rate = reader.current_rate()?;
        rate.validate()?;
        Ok(rate)
    }

    fn live_vault_value(
        &self,
        rate: &Rate,
        collateral: &dyn CollateralSource,
    ) -> Result<u128, EngineError> {
        let raw = collateral.raw_collateral_balance()?;
        convert::raw_to_value_down(raw, rate)
    }

    fn gate_ceiling(
        &self,
        rate: &Rate,
        collateral: &dyn CollateralSource,
    ) -> Result<u128, EngineError> {
        let vault_value = self.live_vault_value(rate, collateral)?;
        Ok(gate::max_redeemable_shares(
            self.params.burning_enabled,
            vault_value,
            self.ledger.user_debt_value(),
            self.ledger.beneficiary_debt_value(),
            self.shares.balance_of(&self.beneficiary),
        ))
    }

    /// Shared exit path for withdraw and redeem: gate the beneficiary, burn
    /// the shares, release principal for ordinary owners.
    fn debit_shares(
        &mut self,
        owner: &HolderAddress,
        share_amount: u128,
        rate: &Rate,
        collateral: &dyn CollateralSource,
    ) -> Result<(), EngineError> {
        if *owner == self.beneficiary {
            let max = self.gate_ceiling(rate, collateral)?;
            if share_amount > max {
                return Err(EngineError::InsolvencyProtected {
                    requested: share_amount,
                    max,
                });
            }
            self.shares.burn(owner, share_amount)?;
            // The beneficiary's debt is trued up by the next report's loss
            // path; the hooks never write it.
        } else {
            self.shares.burn(owner, share_amount)?;
            self.ledger.debit_user(share_amount);
        }
        Ok(())
    }

    fn require_management(&self, caller: &HolderAddress) -> Result<(), EngineError> {
        if *caller != self.management {
            return Err(EngineError::NotAuthorized {
                required: "management",
            });
        }
        Ok(())
    }

    fn require_reporter(&self, caller: &HolderAddress) -> Result<(), EngineError> {
        if *caller != self.keeper && *caller != self.management {
            return Err(EngineError::NotAuthorized {
                required: "keeper or management",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FixedCollateral, FixedRateReader};

    const SCALE: u128 = 1_000_000;

    fn addr(s: &str) -> HolderAddress {
        HolderAddress::new(s)
    }

    fn rate(milli: u128) -> Rate {
        // e.g. rate(1200) = 1.2 at 6 decimals
        Rate::new(milli * SCALE / 1000, 6)
    }

    fn make_engine(burning_enabled: bool) -> VaultEngine {
        VaultEngine::new(
            VaultParams {
                burning_enabled,
                rotation_cooldown_secs: 1000,
            },
            addr("mgmt"),
            addr("keeper"),
            addr("beneficiary"),
        )
        .unwrap()
    }

    #[test]
    fn deposit_credits_principal_and_mints_shares() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let minted = engine.deposit(&addr("alice"), 100, &reader).unwrap();
        assert_eq!(minted, 100);
        assert_eq!(engine.user_debt_value(), 100);
        assert_eq!(engine.beneficiary_debt_value(), 0);
        assert_eq!(engine.balance_of(&addr("alice")), 100);
    }

    #[test]
    fn deposit_converts_at_current_rate_rounding_down() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1200));
        // 7 × 1.2 = 8.4 → 8
        let minted = engine.deposit(&addr("alice"), 7, &reader).unwrap();
        assert_eq!(minted, 8);
        assert_eq!(engine.user_debt_value(), 8);
    }

    #[test]
    fn deposit_blocked_after_shutdown() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        engine.shutdown(&addr("mgmt")).unwrap();
        assert!(matches!(
            engine.deposit(&addr("alice"), 100, &reader),
            Err(EngineError::VaultShutdown)
        ));
    }

    #[test]
    fn withdrawals_and_reports_continue_after_shutdown() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        engine.shutdown(&addr("mgmt")).unwrap();

        engine
            .withdraw(&addr("alice"), &addr("alice"), 40, &reader, &collateral)
            .unwrap();
        collateral.sub(40);
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();
        assert_eq!(engine.user_debt_value(), 60);
    }

    #[test]
    fn shutdown_requires_management() {
        let mut engine = make_engine(true);
        assert!(matches!(
            engine.shutdown(&addr("keeper")),
            Err(EngineError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn beneficiary_cannot_deposit() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        assert!(matches!(
            engine.deposit(&addr("beneficiary"), 100, &reader),
            Err(EngineError::BeneficiaryDeposit)
        ));
    }

    #[test]
    fn dust_deposit_rejected() {
        let mut engine = make_engine(true);
        // Rate 0.000001 at 6 decimals: 1 raw converts to 0 value.
        let reader = FixedRateReader::new(Rate::new(1, 6));
        assert!(matches!(
            engine.deposit(&addr("alice"), 1, &reader),
            Err(EngineError::ZeroValue)
        ));
        assert_eq!(engine.user_debt_value(), 0);
    }

    #[test]
    fn withdraw_releases_principal_rounding_up() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);

        reader.set(rate(1200));
        // 7 × 1.2 = 8.4 → debit 9
        let burned = engine
            .withdraw(&addr("alice"), &addr("alice"), 7, &reader, &collateral)
            .unwrap();
        assert_eq!(burned, 9);
        assert_eq!(engine.user_debt_value(), 91);
        assert_eq!(engine.balance_of(&addr("alice")), 91);
    }

    #[test]
    fn profit_report_accrues_to_beneficiary() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);

        reader.set(rate(1200));
        let report = engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(10))
            .unwrap();
        assert_eq!(report, Report { profit: 20, loss: 0 });
        assert_eq!(engine.beneficiary_debt_value(), 20);
        assert_eq!(engine.balance_of(&addr("beneficiary")), 20);
        // Principal untouched by reporting.
        assert_eq!(engine.user_debt_value(), 100);
        assert_eq!(engine.last_report_at(), Some(Timestamp::new(10)));
        assert_eq!(engine.last_reported_value(), 120);
    }

    #[test]
    fn flat_report_is_a_noop() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        let report = engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();
        assert_eq!(report, Report { profit: 0, loss: 0 });
    }

    #[test]
    fn loss_report_burns_beneficiary_first() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);

        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();

        // Drop to 1.15: claimed 120, value 115 → loss 5 fully absorbed.
        reader.set(rate(1150));
        let report = engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(2))
            .unwrap();
        assert_eq!(report, Report { profit: 0, loss: 5 });
        assert_eq!(engine.beneficiary_debt_value(), 15);
        assert_eq!(engine.balance_of(&addr("beneficiary")), 15);
        assert_eq!(engine.user_debt_value(), 100);
    }

    #[test]
    fn loss_beyond_buffer_never_touches_principal() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);

        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();

        // Crash to 0.8: claimed 120, value 80 → loss 40, buffer only 20.
        reader.set(rate(800));
        let report = engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(2))
            .unwrap();
        assert_eq!(report, Report { profit: 0, loss: 40 });
        assert_eq!(engine.beneficiary_debt_value(), 0);
        assert_eq!(engine.balance_of(&addr("beneficiary")), 0);
        // Nominal principal bookkeeping survives insolvency.
        assert_eq!(engine.user_debt_value(), 100);
        assert!(engine.is_insolvent(&reader, &collateral).unwrap());
    }

    #[test]
    fn loss_with_burning_disabled_leaves_claim_untouched() {
        let mut engine = make_engine(false);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);

        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();
        reader.set(rate(800));
        let report = engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(2))
            .unwrap();
        assert_eq!(report.loss, 40);
        assert_eq!(engine.beneficiary_debt_value(), 20);
        assert_eq!(engine.balance_of(&addr("beneficiary")), 20);
    }

    #[test]
    fn report_requires_keeper_or_management() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        assert!(matches!(
            engine.report(&addr("alice"), &reader, &collateral, Timestamp::new(1)),
            Err(EngineError::NotAuthorized { .. })
        ));
        engine
            .report(&addr("mgmt"), &reader, &collateral, Timestamp::new(1))
            .unwrap();
    }

    #[test]
    fn report_with_unreadable_collateral_fails_cleanly() {
        struct BrokenCollateral;
        impl CollateralSource for BrokenCollateral {
            fn raw_collateral_balance(
                &self,
            ) -> Result<u128, crate::sources::SourceError> {
                Err(crate::sources::SourceError::CollateralUnavailable(
                    "adapter offline".into(),
                ))
            }
        }
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        assert!(matches!(
            engine.report(&addr("keeper"), &reader, &BrokenCollateral, Timestamp::new(1)),
            Err(EngineError::Source(_))
        ));
        assert_eq!(engine.last_report_at(), None);
    }

    #[test]
    fn beneficiary_withdraw_gated_during_partial_insolvency() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();

        // Value 115: excess 15 < claim 20.
        reader.set(rate(1150));
        let max = engine
            .max_redeem(&addr("beneficiary"), &reader, &collateral)
            .unwrap();
        assert_eq!(max, 15);
        assert!(matches!(
            engine.redeem(&addr("beneficiary"), &addr("beneficiary"), 16, &reader, &collateral),
            Err(EngineError::InsolvencyProtected { requested: 16, max: 15 })
        ));
        // Within the ceiling it goes through.
        let raw_out = engine
            .redeem(&addr("beneficiary"), &addr("beneficiary"), 15, &reader, &collateral)
            .unwrap();
        assert!(raw_out > 0);
        // Hooks never write the beneficiary debt.
        assert_eq!(engine.beneficiary_debt_value(), 20);
    }

    #[test]
    fn beneficiary_transfer_gated_like_withdrawal() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();

        // Fully insolvent: no indirect exit either.
        reader.set(rate(900));
        assert!(matches!(
            engine.transfer(&addr("beneficiary"), &addr("mule"), 1, &reader, &collateral),
            Err(EngineError::InsolvencyProtected { max: 0, .. })
        ));
        // Ordinary transfers bypass the gate entirely.
        engine
            .transfer(&addr("alice"), &addr("bob"), 50, &reader, &collateral)
            .unwrap();
        assert_eq!(engine.balance_of(&addr("bob")), 50);
    }

    #[test]
    fn ordinary_holder_never_gated() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        // Deep insolvency.
        reader.set(rate(500));
        let max = engine
            .max_redeem(&addr("alice"), &reader, &collateral)
            .unwrap();
        assert_eq!(max, 100);
        engine
            .redeem(&addr("alice"), &addr("alice"), 100, &reader, &collateral)
            .unwrap();
    }

    #[test]
    fn rotation_full_cycle_preserves_claims() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();

        engine
            .propose_recipient_change(&addr("mgmt"), addr("new_ben"), Timestamp::new(100))
            .unwrap();
        // Too early.
        assert!(matches!(
            engine.finalize_recipient_change(Timestamp::new(500)),
            Err(EngineError::CooldownNotElapsed { .. })
        ));
        engine.finalize_recipient_change(Timestamp::new(1100)).unwrap();

        assert_eq!(engine.beneficiary(), &addr("new_ben"));
        assert_eq!(engine.beneficiary_debt_value(), 20);
        assert_eq!(engine.balance_of(&addr("new_ben")), 20);
        assert_eq!(engine.balance_of(&addr("beneficiary")), 0);
        // The gate now follows the new address.
        let max = engine
            .max_redeem(&addr("new_ben"), &reader, &collateral)
            .unwrap();
        assert_eq!(max, 20);
    }

    #[test]
    fn rotation_propose_validations() {
        let mut engine = make_engine(true);
        assert!(matches!(
            engine.propose_recipient_change(&addr("alice"), addr("x"), Timestamp::new(0)),
            Err(EngineError::NotAuthorized { .. })
        ));
        assert!(matches!(
            engine.propose_recipient_change(&addr("mgmt"), addr("beneficiary"), Timestamp::new(0)),
            Err(EngineError::SameBeneficiary)
        ));
        assert!(matches!(
            engine.propose_recipient_change(&addr("mgmt"), addr(""), Timestamp::new(0)),
            Err(EngineError::InvalidAddress(_))
        ));
    }

    #[test]
    fn cancel_restores_stable() {
        let mut engine = make_engine(true);
        engine
            .propose_recipient_change(&addr("mgmt"), addr("x"), Timestamp::new(0))
            .unwrap();
        engine.cancel_recipient_change(&addr("mgmt")).unwrap();
        assert!(!engine.rotation().is_pending());
        // Finalize after cancel fails.
        assert!(matches!(
            engine.finalize_recipient_change(Timestamp::new(10_000)),
            Err(EngineError::NoPendingRotation)
        ));
    }

    #[test]
    fn report_allowed_while_rotation_pending() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        engine
            .propose_recipient_change(&addr("mgmt"), addr("x"), Timestamp::new(0))
            .unwrap();
        reader.set(rate(1100));
        let report = engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();
        assert_eq!(report.profit, 10);
    }

    #[test]
    fn set_burning_enabled_toggles_gate() {
        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();
        reader.set(rate(900));
        assert_eq!(
            engine
                .max_redeem(&addr("beneficiary"), &reader, &collateral)
                .unwrap(),
            0
        );
        engine.set_burning_enabled(&addr("mgmt"), false).unwrap();
        assert_eq!(
            engine
                .max_redeem(&addr("beneficiary"), &reader, &collateral)
                .unwrap(),
            20
        );
    }

    #[test]
    fn max_withdraw_uses_a_single_rate_reading() {
        use std::cell::RefCell;

        // A reader whose reported rate shifts between consecutive calls.
        struct ShiftingRateReader {
            readings: RefCell<Vec<Rate>>,
        }
        impl RateReader for ShiftingRateReader {
            fn current_rate(&self) -> Result<Rate, crate::sources::SourceError> {
                let mut readings = self.readings.borrow_mut();
                Ok(if readings.len() > 1 {
                    readings.remove(0)
                } else {
                    readings[0]
                })
            }
        }

        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(1))
            .unwrap();

        // First reading 1.15 (excess 15), any later reading 0.9 (insolvent).
        // Ceiling and share→raw conversion must both use the first reading:
        // min(15, 20, 20) shares → 15 / 1.15 = 13 raw.
        let shifting = ShiftingRateReader {
            readings: RefCell::new(vec![rate(1150), rate(900)]),
        };
        let raw = engine
            .max_withdraw(&addr("beneficiary"), &shifting, &collateral)
            .unwrap();
        assert_eq!(raw, 13);
    }

    #[test]
    fn save_and_load_round_trip() {
        use skim_store::MemoryVaultStore;

        let mut engine = make_engine(true);
        let reader = FixedRateReader::new(rate(1000));
        let collateral = FixedCollateral::new(0);
        engine.deposit(&addr("alice"), 100, &reader).unwrap();
        collateral.add(100);
        reader.set(rate(1200));
        engine
            .report(&addr("keeper"), &reader, &collateral, Timestamp::new(7))
            .unwrap();

        let store = MemoryVaultStore::new();
        engine.save_to_store(&store).unwrap();

        let restored = VaultEngine::load_from_store(&store).unwrap().unwrap();
        assert_eq!(restored.user_debt_value(), 100);
        assert_eq!(restored.beneficiary_debt_value(), 20);
        assert_eq!(restored.balance_of(&addr("alice")), 100);
        assert_eq!(restored.last_report_at(), Some(Timestamp::new(7)));
    }

    #[test]
    fn load_from_empty_store_is_none() {
        use skim_store::MemoryVaultStore;
        let store = MemoryVaultStore::new();
        assert!(VaultEngine::load_from_store(&store).unwrap().is_none());
    }
}
