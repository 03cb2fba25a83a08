//! Money conservation invariant checker.
//!
//! Mathematical invariant enforced after every escrow transition:
//! ```text
//! Σ(deposited) == Σ(forwarded) + Σ(refunded) + custodied
//! ```
//!
//! If this invariant ever breaks, the operation is rejected with a critical
//! alert. It is the last safety net: if value is not conserved, something
//! has gone badly wrong.

use crowdsale_types::{Amount, Result, SaleError};
use serde::{Deserialize, Serialize};

/// Running totals of every value movement through the escrow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conservation {
    deposited: Amount,
    forwarded: Amount,
    refunded: Amount,
}

impl Conservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// `ArithmeticOverflow` if the running total does not fit.
    pub fn record_deposit(&mut self, amount: Amount) -> Result<()> {
        self.deposited = self
            .deposited
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow("conservation.deposited"))?;
        Ok(())
    }

    /// # Errors
    /// `ArithmeticOverflow` if the running total does not fit.
    pub fn record_forward(&mut self, amount: Amount) -> Result<()> {
        self.forwarded = self
            .forwarded
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow("conservation.forwarded"))?;
        Ok(())
    }

    /// # Errors
    /// `ArithmeticOverflow` if the running total does not fit.
    pub fn record_refund(&mut self, amount: Amount) -> Result<()> {
        self.refunded = self
            .refunded
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow("conservation.refunded"))?;
        Ok(())
    }

    /// Back out a deposit whose operation did not complete.
    ///
    /// # Errors
    /// `ConservationViolation` if less than `amount` was ever deposited.
    pub fn cancel_deposit(&mut self, amount: Amount) -> Result<()> {
        self.deposited = self
            .deposited
            .checked_sub(amount)
            .ok_or_else(|| SaleError::ConservationViolation {
                reason: format!("cancel deposit {amount} exceeds deposited {}", self.deposited),
            })?;
        Ok(())
    }

    /// Back out a refund that was never paid.
    ///
    /// # Errors
    /// `ConservationViolation` if less than `amount` was ever refunded.
    pub fn cancel_refund(&mut self, amount: Amount) -> Result<()> {
        self.refunded = self
            .refunded
            .checked_sub(amount)
            .ok_or_else(|| SaleError::ConservationViolation {
                reason: format!("cancel refund {amount} exceeds refunded {}", self.refunded),
            })?;
        Ok(())
    }

    /// What should still be in custody: deposited - forwarded - refunded.
    ///
    /// # Errors
    /// `ConservationViolation` if more left custody than ever entered it.
    pub fn expected_custodied(&self) -> Result<Amount> {
        self.forwarded
            .checked_add(self.refunded)
            .and_then(|out| self.deposited.checked_sub(out))
            .ok_or_else(|| SaleError::ConservationViolation {
                reason: format!(
                    "paid out more than deposited (deposited={}, forwarded={}, refunded={})",
                    self.deposited, self.forwarded, self.refunded
                ),
            })
    }

    /// Verify that the custodied balance matches the recorded flows.
    ///
    /// # Errors
    /// Returns [`SaleError::ConservationViolation`] if actual ≠ expected.
    pub fn verify(&self, custodied: Amount) -> Result<()> {
        let expected = self.expected_custodied()?;
        if custodied != expected {
            tracing::error!(
                custodied,
                expected,
                deposited = self.deposited,
                forwarded = self.forwarded,
                refunded = self.refunded,
                "Conservation invariant violated"
            );
            return Err(SaleError::ConservationViolation {
                reason: format!(
                    "custodied {custodied} != expected {expected} \
                     (deposited={}, forwarded={}, refunded={})",
                    self.deposited, self.forwarded, self.refunded
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_deposited(&self) -> Amount {
        self.deposited
    }

    #[must_use]
    pub fn total_forwarded(&self) -> Amount {
        self.forwarded
    }

    #[must_use]
    pub fn total_refunded(&self) -> Amount {
        self.refunded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_balanced() {
        let c = Conservation::new();
        assert_eq!(c.expected_custodied().unwrap(), 0);
        assert!(c.verify(0).is_ok());
    }

    #[test]
    fn flows_balance() {
        let mut c = Conservation::new();
        c.record_deposit(1_000).unwrap();
        c.record_deposit(500).unwrap();
        c.record_refund(300).unwrap();
        assert_eq!(c.expected_custodied().unwrap(), 1_200);
        assert!(c.verify(1_200).is_ok());

        c.record_forward(1_200).unwrap();
        assert!(c.verify(0).is_ok());
        assert_eq!(c.total_deposited(), 1_500);
        assert_eq!(c.total_forwarded(), 1_200);
        assert_eq!(c.total_refunded(), 300);
    }

    #[test]
    fn mismatch_detected() {
        let mut c = Conservation::new();
        c.record_deposit(10).unwrap();
        let err = c.verify(9).unwrap_err();
        assert!(matches!(err, SaleError::ConservationViolation { .. }));
    }

    #[test]
    fn cancelled_flows_rebalance() {
        let mut c = Conservation::new();
        c.record_deposit(40).unwrap();
        c.record_deposit(60).unwrap();
        c.cancel_deposit(60).unwrap();
        assert_eq!(c.total_deposited(), 40);

        c.record_refund(40).unwrap();
        c.cancel_refund(40).unwrap();
        assert!(c.verify(40).is_ok());
        assert!(matches!(
            c.cancel_refund(1),
            Err(SaleError::ConservationViolation { .. })
        ));
        assert!(matches!(
            c.cancel_deposit(41),
            Err(SaleError::ConservationViolation { .. })
        ));
    }

    #[test]
    fn overdrawn_detected() {
        let mut c = Conservation::new();
        c.record_deposit(10).unwrap();
        c.record_refund(11).unwrap();
        assert!(matches!(
            c.expected_custodied(),
            Err(SaleError::ConservationViolation { .. })
        ));
    }
}
