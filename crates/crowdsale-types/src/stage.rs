//! Sale lifecycle stages.
//!
//! A sale moves through non-overlapping stages:
//! **PENDING → OPEN → CLOSED_UNRESOLVED → FINALIZED_SUCCESS | FINALIZED_FAILURE**
//!
//! The first three are derived from the clock against the sale's time
//! window; the terminal two are fixed by `finalize` and never change again.
//!
//! A successful finalize then settles through [`FinalizeStep`]s in order.
//! The marker only moves forward, so an interrupted settlement resumes at
//! the step that failed and never repeats a completed one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleStage {
    /// Before the opening time. Admin may configure; no contributions.
    Pending,
    /// Within the time window, accepting contributions.
    Open,
    /// Past the closing time, waiting for `finalize`.
    ClosedUnresolved,
    /// Goal reached; funds forwarded, reserves locked.
    FinalizedSuccess,
    /// Goal missed; contributions refundable.
    FinalizedFailure,
}

impl fmt::Display for SaleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Open => write!(f, "OPEN"),
            Self::ClosedUnresolved => write!(f, "CLOSED_UNRESOLVED"),
            Self::FinalizedSuccess => write!(f, "FINALIZED_SUCCESS"),
            Self::FinalizedFailure => write!(f, "FINALIZED_FAILURE"),
        }
    }
}

impl SaleStage {
    /// Derive the stage from the time window and the finalize outcome.
    #[must_use]
    pub fn derive(
        now: DateTime<Utc>,
        opening: DateTime<Utc>,
        closing: DateTime<Utc>,
        outcome: Option<bool>,
    ) -> Self {
        match outcome {
            Some(true) => Self::FinalizedSuccess,
            Some(false) => Self::FinalizedFailure,
            None if now < opening => Self::Pending,
            None if now < closing => Self::Open,
            None => Self::ClosedUnresolved,
        }
    }

    /// Whether this stage is terminal.
    #[must_use]
    pub fn is_finalized(self) -> bool {
        matches!(self, Self::FinalizedSuccess | Self::FinalizedFailure)
    }

    /// Whether the admin may still change the phase.
    #[must_use]
    pub fn allows_phase_change(self) -> bool {
        matches!(self, Self::Pending | Self::Open)
    }
}

/// Next outstanding effect of a successful finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalizeStep {
    /// Mint the reserved allocation of the lock at this position.
    MintLock(usize),
    FinishMinting,
    Unpause,
    TransferOwnership,
    /// Forward the escrowed value to the wallet.
    Forward,
    Complete,
}

impl FinalizeStep {
    #[must_use]
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

impl fmt::Display for FinalizeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MintLock(i) => write!(f, "MINT_LOCK({i})"),
            Self::FinishMinting => write!(f, "FINISH_MINTING"),
            Self::Unpause => write!(f, "UNPAUSE"),
            Self::TransferOwnership => write!(f, "TRANSFER_OWNERSHIP"),
            Self::Forward => write!(f, "FORWARD"),
            Self::Complete => write!(f, "COMPLETE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn stage_derivation_follows_clock() {
        let opening = Utc::now();
        let closing = opening + Duration::days(7);

        let before = opening - Duration::seconds(1);
        assert_eq!(SaleStage::derive(before, opening, closing, None), SaleStage::Pending);
        assert_eq!(SaleStage::derive(opening, opening, closing, None), SaleStage::Open);
        assert_eq!(
            SaleStage::derive(closing - Duration::seconds(1), opening, closing, None),
            SaleStage::Open
        );
        assert_eq!(
            SaleStage::derive(closing, opening, closing, None),
            SaleStage::ClosedUnresolved
        );
    }

    #[test]
    fn outcome_overrides_clock() {
        let opening = Utc::now();
        let closing = opening + Duration::days(7);
        assert_eq!(
            SaleStage::derive(opening, opening, closing, Some(true)),
            SaleStage::FinalizedSuccess
        );
        assert_eq!(
            SaleStage::derive(closing, opening, closing, Some(false)),
            SaleStage::FinalizedFailure
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(format!("{}", SaleStage::Pending), "PENDING");
        assert_eq!(format!("{}", SaleStage::ClosedUnresolved), "CLOSED_UNRESOLVED");
        assert_eq!(format!("{}", SaleStage::FinalizedFailure), "FINALIZED_FAILURE");
    }

    #[test]
    fn phase_changes_only_before_close() {
        assert!(SaleStage::Pending.allows_phase_change());
        assert!(SaleStage::Open.allows_phase_change());
        assert!(!SaleStage::ClosedUnresolved.allows_phase_change());
        assert!(!SaleStage::FinalizedSuccess.allows_phase_change());
    }

    #[test]
    fn finalize_step_display() {
        assert_eq!(format!("{}", FinalizeStep::MintLock(2)), "MINT_LOCK(2)");
        assert_eq!(format!("{}", FinalizeStep::Forward), "FORWARD");
        assert!(FinalizeStep::Complete.is_complete());
        assert!(!FinalizeStep::TransferOwnership.is_complete());
    }

    #[test]
    fn stage_serde_roundtrip() {
        let stage = SaleStage::ClosedUnresolved;
        let json = serde_json::to_string(&stage).unwrap();
        let back: SaleStage = serde_json::from_str(&json).unwrap();
        assert_eq!(stage, back);
    }
}
