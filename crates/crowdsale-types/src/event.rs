//! Event types for the sale audit trail.
//!
//! Every committed transition (purchase, phase change, allow-list edit,
//! admin transfer, finalize, refund, lock release) appends one
//! [`SaleEvent`] to the journal. Records are hash-chained so that any
//! tampering with history is detectable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, LockId, Rate};

/// A committed state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleEvent {
    /// Value accepted and tokens minted.
    TokensPurchased {
        payer: Address,
        participant: Address,
        value: Amount,
        tokens: Amount,
        rate: Rate,
        phase: usize,
    },
    /// Admin moved the sale to a later phase.
    PhaseAdvanced { from: usize, to: usize, rate: Rate },
    /// Identities admitted.
    AllowListAdded { identities: Vec<Address> },
    /// Identity removed from the allow-list.
    AllowListRemoved { identity: Address },
    /// Admin role handed over.
    AdminTransferred { from: Address, to: Address },
    /// Sale resolved.
    Finalized {
        goal_reached: bool,
        raised: Amount,
        forwarded: Amount,
        locks: Vec<LockId>,
    },
    /// Participant refunded after a failed sale.
    RefundClaimed { participant: Address, amount: Amount },
    /// Vesting lock paid out.
    LockReleased {
        lock: LockId,
        beneficiary: Address,
        amount: Amount,
    },
}

/// Discriminant of a [`SaleEvent`], for filtering and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleEventKind {
    TokensPurchased,
    PhaseAdvanced,
    AllowListAdded,
    AllowListRemoved,
    AdminTransferred,
    Finalized,
    RefundClaimed,
    LockReleased,
}

impl std::fmt::Display for SaleEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokensPurchased => write!(f, "TOKENS_PURCHASED"),
            Self::PhaseAdvanced => write!(f, "PHASE_ADVANCED"),
            Self::AllowListAdded => write!(f, "ALLOW_LIST_ADDED"),
            Self::AllowListRemoved => write!(f, "ALLOW_LIST_REMOVED"),
            Self::AdminTransferred => write!(f, "ADMIN_TRANSFERRED"),
            Self::Finalized => write!(f, "FINALIZED"),
            Self::RefundClaimed => write!(f, "REFUND_CLAIMED"),
            Self::LockReleased => write!(f, "LOCK_RELEASED"),
        }
    }
}

impl SaleEvent {
    #[must_use]
    pub fn kind(&self) -> SaleEventKind {
        match self {
            Self::TokensPurchased { .. } => SaleEventKind::TokensPurchased,
            Self::PhaseAdvanced { .. } => SaleEventKind::PhaseAdvanced,
            Self::AllowListAdded { .. } => SaleEventKind::AllowListAdded,
            Self::AllowListRemoved { .. } => SaleEventKind::AllowListRemoved,
            Self::AdminTransferred { .. } => SaleEventKind::AdminTransferred,
            Self::Finalized { .. } => SaleEventKind::Finalized,
            Self::RefundClaimed { .. } => SaleEventKind::RefundClaimed,
            Self::LockReleased { .. } => SaleEventKind::LockReleased,
        }
    }
}

/// A journaled event with its position in the hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Commit order, starting at 0.
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: SaleEvent,
    /// Hash of the previous record (all zeros for the first).
    pub prev_hash: [u8; 32],
    /// SHA-256 over `prev_hash`, `seq`, timestamp and the serialized event.
    pub hash: [u8; 32],
}

impl EventRecord {
    /// Hex-encoded hash, for logs.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_display() {
        let ev = SaleEvent::RefundClaimed {
            participant: Address::random(),
            amount: 1,
        };
        assert_eq!(ev.kind(), SaleEventKind::RefundClaimed);
        assert_eq!(format!("{}", ev.kind()), "REFUND_CLAIMED");
        assert_eq!(
            format!("{}", SaleEventKind::TokensPurchased),
            "TOKENS_PURCHASED"
        );
    }

    #[test]
    fn event_serde_uses_snake_case_tags() {
        let ev = SaleEvent::PhaseAdvanced {
            from: 0,
            to: 1,
            rate: 400,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.starts_with("{\"phase_advanced\""), "Got: {json}");
        let back: SaleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }
}
