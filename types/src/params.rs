//! Per-vault configuration, fixed at construction.

use serde::{Deserialize, Serialize};

/// Default cooldown between proposing and finalizing a beneficiary change:
/// 14 days. Long enough for depositors to exit before yield routing changes.
pub const DEFAULT_ROTATION_COOLDOWN_SECS: u64 = 14 * 24 * 60 * 60;

/// Configuration for one vault instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultParams {
    /// Whether the beneficiary's accrued shares act as a first-loss buffer.
    ///
    /// When true, reported losses burn beneficiary shares before touching
    /// realizable value per share, and the beneficiary's redemptions are
    /// gated by live solvency. When false, losses leave the beneficiary's
    /// claim untouched and no redemption gate applies to it.
    pub burning_enabled: bool,

    /// Seconds that must elapse between proposing and finalizing a
    /// beneficiary rotation.
    pub rotation_cooldown_secs: u64,
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            burning_enabled: true,
            rotation_cooldown_secs: DEFAULT_ROTATION_COOLDOWN_SECS,
        }
    }
}
