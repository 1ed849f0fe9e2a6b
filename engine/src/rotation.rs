//! Two-phase beneficiary rotation: propose → cooldown → finalize/cancel.
//!
//! Modeled as a tagged state machine so an inconsistent rotation (a pending
//! target without a request time, or vice versa) cannot be represented.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use skim_types::{HolderAddress, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationState {
    /// No rotation in flight.
    Stable,
    /// A new beneficiary has been proposed and the cooldown is running.
    Pending {
        target: HolderAddress,
        requested_at: Timestamp,
    },
}

impl RotationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RotationState::Pending { .. })
    }

    /// The proposed beneficiary, if a rotation is pending.
    pub fn pending_target(&self) -> Option<&HolderAddress> {
        match self {
            RotationState::Stable => None,
            RotationState::Pending { target, .. } => Some(target),
        }
    }

    /// Record a proposed rotation. Only valid from `Stable`.
    pub fn propose(&mut self, target: HolderAddress, now: Timestamp) -> Result<(), EngineError> {
        if self.is_pending() {
            return Err(EngineError::RotationPending);
        }
        *self = RotationState::Pending {
            target,
            requested_at: now,
        };
        Ok(())
    }

    /// Abandon a pending rotation. Only valid from `Pending`.
    pub fn cancel(&mut self) -> Result<(), EngineError> {
        if !self.is_pending() {
            return Err(EngineError::NoPendingRotation);
        }
        *self = RotationState::Stable;
        Ok(())
    }

    /// Complete a pending rotation once `cooldown_secs` have elapsed since
    /// the proposal, returning the new beneficiary and resetting to `Stable`.
    pub fn finalize(
        &mut self,
        cooldown_secs: u64,
        now: Timestamp,
    ) -> Result<HolderAddress, EngineError> {
        match self {
            RotationState::Stable => Err(EngineError::NoPendingRotation),
            RotationState::Pending {
                target,
                requested_at,
            } => {
                if !requested_at.has_elapsed(cooldown_secs, now) {
                    let remaining =
                        cooldown_secs.saturating_sub(requested_at.elapsed_since(now));
                    return Err(EngineError::CooldownNotElapsed {
                        remaining_secs: remaining,
                    });
                }
                let target = target.clone();
                *self = RotationState::Stable;
                Ok(target)
            }
        }
    }
}

impl Default for RotationState {
    fn default() -> Self {
        RotationState::Stable
    }
}
