//! Time window gating all participation.

use chrono::{DateTime, Duration, Utc};
use crowdsale_types::{Result, SaleError};

/// Half-open interval `[opening, closing)` during which contributions are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    opening: DateTime<Utc>,
    closing: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window created at `created_at`.
    ///
    /// The opening must lie strictly after the creation time, so a sale can
    /// never be constructed already open.
    ///
    /// # Errors
    /// `InvalidSchedule` if `opening >= closing` or `opening <= created_at`.
    pub fn new(
        opening: DateTime<Utc>,
        closing: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if opening >= closing {
            return Err(SaleError::InvalidSchedule {
                reason: format!("opening {opening} is not before closing {closing}"),
            });
        }
        if opening <= created_at {
            return Err(SaleError::InvalidSchedule {
                reason: format!("opening {opening} is not after creation time {created_at}"),
            });
        }
        Ok(Self { opening, closing })
    }

    #[must_use]
    pub fn opening(&self) -> DateTime<Utc> {
        self.opening
    }

    #[must_use]
    pub fn closing(&self) -> DateTime<Utc> {
        self.closing
    }

    #[must_use]
    pub fn has_opened(&self, now: DateTime<Utc>) -> bool {
        now >= self.opening
    }

    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.opening <= now && now < self.closing
    }

    #[must_use]
    pub fn has_closed(&self, now: DateTime<Utc>) -> bool {
        now >= self.closing
    }

    /// Time left until closing, zero once closed.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.has_closed(now) {
            Duration::zero()
        } else {
            self.closing - now
        }
    }
}
