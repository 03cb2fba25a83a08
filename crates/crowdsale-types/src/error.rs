//! Error types for the crowdsale engine.
//!
//! All errors use the `CS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Access control
//! - 2xx: Sale stage / state machine
//! - 3xx: Admission
//! - 4xx: Contribution caps
//! - 5xx: Configuration and scheduling
//! - 6xx: Escrow / refunds
//! - 7xx: Vesting locks
//! - 8xx: External collaborators (token ledger, value custody)
//! - 9xx: General / internal errors

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Address, Amount, FinalizeStep, LockId, SaleStage};

/// Which contribution limit a rejected contribution would have broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapViolationKind {
    /// `raised + amount` would exceed the aggregate cap.
    AggregateCapExceeded { cap: Amount, raised: Amount, proposed: Amount },
    /// A participant's first contribution is below the floor.
    BelowMinimumContribution { minimum: Amount, proposed: Amount },
    /// A participant's running total would exceed the per-participant ceiling.
    AboveMaximumContribution { maximum: Amount, existing: Amount, proposed: Amount },
}

impl fmt::Display for CapViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AggregateCapExceeded { cap, raised, proposed } => write!(
                f,
                "aggregate cap exceeded: raised {raised} + {proposed} > cap {cap}"
            ),
            Self::BelowMinimumContribution { minimum, proposed } => write!(
                f,
                "below minimum contribution: {proposed} < {minimum}"
            ),
            Self::AboveMaximumContribution { maximum, existing, proposed } => write!(
                f,
                "above maximum contribution: {existing} + {proposed} > {maximum}"
            ),
        }
    }
}

/// Central error enum for all crowdsale operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    // =================================================================
    // Access Control (1xx)
    // =================================================================
    /// The caller does not hold the role required for this operation.
    #[error("CS_ERR_100: Unauthorized: {caller} is not the sale admin")]
    Unauthorized { caller: Address },

    // =================================================================
    // Stage Errors (2xx)
    // =================================================================
    /// Contribution attempted outside the open window or after finalize.
    #[error("CS_ERR_200: Sale not open (stage {stage})")]
    NotOpen { stage: SaleStage },

    /// Finalize attempted before the closing time.
    #[error("CS_ERR_201: Sale still open until {closing_time}")]
    SaleStillOpen { closing_time: chrono::DateTime<chrono::Utc> },

    /// Finalize attempted a second time.
    #[error("CS_ERR_202: Sale already finalized")]
    AlreadyFinalized,

    /// Operation is not legal in the current stage.
    #[error("CS_ERR_203: {operation} not allowed in stage {actual}")]
    WrongStage {
        operation: &'static str,
        actual: SaleStage,
    },

    /// A successful finalize has not finished settling.
    #[error("CS_ERR_204: Settlement incomplete, next step {next}")]
    SettlementPending { next: FinalizeStep },

    // =================================================================
    // Admission Errors (3xx)
    // =================================================================
    /// Participant is not on the allow-list.
    #[error("CS_ERR_300: Participant not admitted: {0}")]
    NotAdmitted(Address),

    /// Zero-value contributions are never accepted.
    #[error("CS_ERR_301: Contribution amount must be positive")]
    ZeroContribution,

    /// An address argument is malformed or the zero address.
    #[error("CS_ERR_302: Invalid address: {reason}")]
    InvalidAddress { reason: String },

    // =================================================================
    // Cap Errors (4xx)
    // =================================================================
    /// A contribution limit would be broken.
    #[error("CS_ERR_400: Cap violation: {0}")]
    CapViolation(CapViolationKind),

    // =================================================================
    // Configuration Errors (5xx)
    // =================================================================
    /// Opening/closing times are inconsistent.
    #[error("CS_ERR_500: Invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// Phase change would move backwards or to an unconfigured phase.
    #[error("CS_ERR_501: Invalid phase transition from {from} to {to}")]
    InvalidPhaseTransition { from: usize, to: usize },

    /// Reserved distribution buckets are misconfigured.
    #[error("CS_ERR_502: Invalid distribution: {reason}")]
    InvalidDistribution { reason: String },

    /// Any other invalid combination of configuration values.
    #[error("CS_ERR_503: Invalid configuration: {0}")]
    InvalidConfig(String),

    // =================================================================
    // Escrow Errors (6xx)
    // =================================================================
    /// Refunds are not available for this participant in this state.
    #[error("CS_ERR_600: Refund unavailable: {reason}")]
    RefundUnavailable { reason: String },

    /// The participant already claimed their refund.
    #[error("CS_ERR_601: Refund already claimed by {0}")]
    DuplicateClaim(Address),

    /// Money conservation invariant violated. Critical safety alert.
    #[error("CS_ERR_602: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // Vesting Errors (7xx)
    // =================================================================
    /// Release attempted before the lock's release time.
    #[error("CS_ERR_700: {lock} still locked until {release_time}")]
    LockActive {
        lock: LockId,
        release_time: chrono::DateTime<chrono::Utc>,
    },

    /// The lock was already released.
    #[error("CS_ERR_701: {0} already released")]
    AlreadyReleased(LockId),

    /// No lock with this ID exists.
    #[error("CS_ERR_702: {0} not found")]
    LockNotFound(LockId),

    // =================================================================
    // Collaborator Errors (8xx)
    // =================================================================
    /// The token ledger rejected a call.
    #[error("CS_ERR_800: Token ledger rejected call: {reason}")]
    Ledger { reason: String },

    /// The value custody primitive rejected a call.
    #[error("CS_ERR_801: Value custody rejected call: {reason}")]
    Custody { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Checked arithmetic overflowed.
    #[error("CS_ERR_900: Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Serialization / deserialization error.
    #[error("CS_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Unrecoverable internal error.
    #[error("CS_ERR_902: Internal error: {0}")]
    Internal(String),
}

impl SaleError {
    /// The `CS_ERR_xxx` code of this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "CS_ERR_100",
            Self::NotOpen { .. } => "CS_ERR_200",
            Self::SaleStillOpen { .. } => "CS_ERR_201",
            Self::AlreadyFinalized => "CS_ERR_202",
            Self::WrongStage { .. } => "CS_ERR_203",
            Self::SettlementPending { .. } => "CS_ERR_204",
            Self::NotAdmitted(_) => "CS_ERR_300",
            Self::ZeroContribution => "CS_ERR_301",
            Self::InvalidAddress { .. } => "CS_ERR_302",
            Self::CapViolation(_) => "CS_ERR_400",
            Self::InvalidSchedule { .. } => "CS_ERR_500",
            Self::InvalidPhaseTransition { .. } => "CS_ERR_501",
            Self::InvalidDistribution { .. } => "CS_ERR_502",
            Self::InvalidConfig(_) => "CS_ERR_503",
            Self::RefundUnavailable { .. } => "CS_ERR_600",
            Self::DuplicateClaim(_) => "CS_ERR_601",
            Self::ConservationViolation { .. } => "CS_ERR_602",
            Self::LockActive { .. } => "CS_ERR_700",
            Self::AlreadyReleased(_) => "CS_ERR_701",
            Self::LockNotFound(_) => "CS_ERR_702",
            Self::Ledger { .. } => "CS_ERR_800",
            Self::Custody { .. } => "CS_ERR_801",
            Self::ArithmeticOverflow(_) => "CS_ERR_900",
            Self::Serialization(_) => "CS_ERR_901",
            Self::Internal(_) => "CS_ERR_902",
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SaleError>;

impl From<serde_json::Error> for SaleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = SaleError::NotAdmitted(Address::ZERO);
        let msg = format!("{err}");
        assert!(msg.starts_with("CS_ERR_300"), "Got: {msg}");
    }

    #[test]
    fn cap_violation_display() {
        let err = SaleError::CapViolation(CapViolationKind::AboveMaximumContribution {
            maximum: 250,
            existing: 100,
            proposed: 200,
        });
        let msg = format!("{err}");
        assert!(msg.contains("CS_ERR_400"));
        assert!(msg.contains("250"));
        assert!(msg.contains("200"));
    }

    #[test]
    fn wrong_stage_display() {
        let err = SaleError::WrongStage {
            operation: "set_phase",
            actual: SaleStage::ClosedUnresolved,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CS_ERR_203"));
        assert!(msg.contains("set_phase"));
        assert!(msg.contains("CLOSED_UNRESOLVED"));
    }

    #[test]
    fn code_matches_display_prefix() {
        let errors = vec![
            SaleError::AlreadyFinalized,
            SaleError::SettlementPending {
                next: FinalizeStep::Forward,
            },
            SaleError::ZeroContribution,
            SaleError::DuplicateClaim(Address::ZERO),
            SaleError::AlreadyReleased(LockId(3)),
            SaleError::ArithmeticOverflow("mint"),
            SaleError::InvalidPhaseTransition { from: 1, to: 0 },
            SaleError::Internal("test".into()),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with(err.code()),
                "Error {msg} does not start with its code {}",
                err.code()
            );
        }
    }

    #[test]
    fn serde_error_converts() {
        let err: SaleError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, SaleError::Serialization(_)));
    }
}
