//! The redemption gate — the beneficiary's live solvency ceiling.
//!
//! Evaluated fresh on every beneficiary-initiated transfer-class operation,
//! never cached from the last report, so rate movement between reports
//! immediately tightens or loosens the ceiling. Ordinary holders bypass this
//! module entirely.

/// Maximum shares the beneficiary may redeem or transfer right now.
///
/// Shares are issued 1:1 with value, so value and share amounts compare
/// directly and no further conversion applies. With burning disabled the
/// beneficiary is not gated at all and may move its full balance.
///
/// `vault_value` must be the live normalized vault value
/// (`raw_collateral × rate`, rounded down); passing it explicitly keeps the
/// gate a pure function, testable without a live rate source.
pub fn max_redeemable_shares(
    burning_enabled: bool,
    vault_value: u128,
    user_debt_value: u128,
    beneficiary_debt_value: u128,
    beneficiary_share_balance: u128,
) -> u128 {
    if !burning_enabled {
        return beneficiary_share_balance;
    }
    // Boundary equality counts as full insolvency: at vault_value ==
    // user_debt_value there is no excess, and vault_value was already
    // rounded down, so the beneficiary can never extract dust it is not
    // entitled to.
    if vault_value <= user_debt_value {
        return 0;
    }
    let excess_value = vault_value - user_debt_value;
    excess_value
        .min(beneficiary_debt_value)
        .min(beneficiary_share_balance)
}
