//! # VestedAllocation: a reserved token allocation behind a time-lock
//!
//! Minted on successful finalize, one per distribution bucket, to a lock
//! address owned by the engine. The beneficiary receives the full amount
//! once the release time has passed.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  release (now >= release_time)  ┌──────────┐
//!   │ LOCKED ├────────────────────────────────▶│ RELEASED │
//!   └────────┘                                 └──────────┘
//! ```
//!
//! The transition is one-way and happens exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, LockId, Result, SaleError};

/// Lifecycle state of a vesting lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockState {
    /// Tokens held by the lock address.
    Locked,
    /// Tokens paid to the beneficiary. **Irreversible.**
    Released,
}

impl LockState {
    /// Can this lock transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Locked, Self::Released))
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "LOCKED"),
            Self::Released => write!(f, "RELEASED"),
        }
    }
}

/// A reserved allocation minted into a time-lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestedAllocation {
    pub id: LockId,
    /// Distribution bucket this allocation came from.
    pub bucket: String,
    /// Ledger account holding the locked tokens.
    pub holder: Address,
    pub beneficiary: Address,
    pub amount: Amount,
    pub release_time: DateTime<Utc>,
    pub state: LockState,
    pub released_at: Option<DateTime<Utc>>,
}

impl VestedAllocation {
    #[must_use]
    pub fn new(
        id: LockId,
        bucket: impl Into<String>,
        holder: Address,
        beneficiary: Address,
        amount: Amount,
        release_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bucket: bucket.into(),
            holder,
            beneficiary,
            amount,
            release_time,
            state: LockState::Locked,
            released_at: None,
        }
    }

    /// Whether `release` would be accepted at `now`.
    #[must_use]
    pub fn is_releasable(&self, now: DateTime<Utc>) -> bool {
        self.state == LockState::Locked && now >= self.release_time
    }

    /// Check that the lock may be released at `now`, without changing it.
    ///
    /// # Errors
    /// `AlreadyReleased` after a previous release, `LockActive` before the
    /// release time.
    pub fn ensure_releasable(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.state.can_transition_to(LockState::Released) {
            return Err(SaleError::AlreadyReleased(self.id));
        }
        if now < self.release_time {
            return Err(SaleError::LockActive {
                lock: self.id,
                release_time: self.release_time,
            });
        }
        Ok(())
    }

    /// Transition to RELEASED.
    ///
    /// # Errors
    /// See [`Self::ensure_releasable`].
    pub fn mark_released(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_releasable(now)?;
        self.state = LockState::Released;
        self.released_at = Some(now);
        Ok(())
    }
}
