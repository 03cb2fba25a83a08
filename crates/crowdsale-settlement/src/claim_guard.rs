//! Refund claim guard: prevents double refunds.
//!
//! Each participant can claim a refund once. A second attempt returns
//! [`SaleError::DuplicateClaim`] unless a deposit for that participant was
//! recorded in between, which clears the mark.
//!
//! Unlike a bounded cache, nothing is ever evicted: forgetting a claim
//! would re-open it.

use std::collections::BTreeSet;

use crowdsale_types::{Address, Result, SaleError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimGuard {
    claimed: BTreeSet<Address>,
}

impl ClaimGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`SaleError::DuplicateClaim`] if `participant` already claimed.
    pub fn check(&self, participant: Address) -> Result<()> {
        if self.claimed.contains(&participant) {
            return Err(SaleError::DuplicateClaim(participant));
        }
        Ok(())
    }

    /// Mark a claim as paid.
    ///
    /// # Errors
    /// Returns [`SaleError::DuplicateClaim`] if `participant` already claimed.
    pub fn mark_claimed(&mut self, participant: Address) -> Result<()> {
        if !self.claimed.insert(participant) {
            return Err(SaleError::DuplicateClaim(participant));
        }
        Ok(())
    }

    /// A new deposit re-opens the participant's claim.
    pub fn clear(&mut self, participant: Address) {
        self.claimed.remove(&participant);
    }

    #[must_use]
    pub fn is_claimed(&self, participant: Address) -> bool {
        self.claimed.contains(&participant)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
