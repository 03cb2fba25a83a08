//! Cap policy: hard gate for contribution amounts.
//!
//! Validates every contribution against the aggregate cap and the
//! per-participant floor and ceiling before anything is committed.
//!
//! ## Design Principles
//!
//! - **Fail-closed**: overflow in any sum rejects the contribution
//! - **Pure**: decisions depend only on the arguments, so the engine can
//!   evaluate them speculatively under its write lock
//! - **Ordered**: aggregate cap, then floor, then ceiling

use crowdsale_types::{Amount, CapConfig, CapViolationKind, Result, SaleError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapPolicy {
    cap: Option<Amount>,
    investor_min_cap: Amount,
    investor_hard_cap: Option<Amount>,
}

impl CapPolicy {
    /// # Errors
    /// Any [`CapConfig::validate`] error.
    pub fn new(config: &CapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cap: config.cap,
            investor_min_cap: config.investor_min_cap,
            investor_hard_cap: config.investor_hard_cap,
        })
    }

    /// No limits at all.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            cap: None,
            investor_min_cap: 0,
            investor_hard_cap: None,
        }
    }

    #[must_use]
    pub fn cap(&self) -> Option<Amount> {
        self.cap
    }

    #[must_use]
    pub fn investor_min_cap(&self) -> Amount {
        self.investor_min_cap
    }

    #[must_use]
    pub fn investor_hard_cap(&self) -> Option<Amount> {
        self.investor_hard_cap
    }

    /// Validate a proposed contribution.
    ///
    /// `existing` is what the participant has contributed so far;
    /// `current_raised` is the aggregate raise before this contribution.
    ///
    /// # Errors
    /// `CapViolation` naming the first limit broken, `ArithmeticOverflow`
    /// if a sum does not fit.
    pub fn validate(&self, existing: Amount, proposed: Amount, current_raised: Amount) -> Result<()> {
        // 1. Aggregate cap
        let new_raised = current_raised
            .checked_add(proposed)
            .ok_or(SaleError::ArithmeticOverflow("cap_policy.raised"))?;
        if let Some(cap) = self.cap {
            if new_raised > cap {
                return Err(SaleError::CapViolation(CapViolationKind::AggregateCapExceeded {
                    cap,
                    raised: current_raised,
                    proposed,
                }));
            }
        }

        // 2. Floor applies to the first contribution only
        if existing == 0 && proposed < self.investor_min_cap {
            return Err(SaleError::CapViolation(
                CapViolationKind::BelowMinimumContribution {
                    minimum: self.investor_min_cap,
                    proposed,
                },
            ));
        }

        // 3. Ceiling applies to the running total
        let new_total = existing
            .checked_add(proposed)
            .ok_or(SaleError::ArithmeticOverflow("cap_policy.participant"))?;
        if let Some(maximum) = self.investor_hard_cap {
            if new_total > maximum {
                return Err(SaleError::CapViolation(
                    CapViolationKind::AboveMaximumContribution {
                        maximum,
                        existing,
                        proposed,
                    },
                ));
            }
        }

        tracing::debug!(existing, proposed, current_raised, "Cap checks passed");
        Ok(())
    }

    /// Value still acceptable before the aggregate cap, `None` if uncapped.
    #[must_use]
    pub fn remaining(&self, current_raised: Amount) -> Option<Amount> {
        self.cap.map(|cap| cap.saturating_sub(current_raised))
    }

    #[must_use]
    pub fn cap_reached(&self, current_raised: Amount) -> bool {
        self.cap.is_some_and(|cap| current_raised >= cap)
    }
}

impl Default for CapPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}
