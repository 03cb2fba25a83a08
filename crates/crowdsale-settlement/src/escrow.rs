//! Escrow: the refund vault holding contributed value until the sale resolves.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  close (goal reached)   ┌────────┐
//!   │ ACTIVE ├────────────────────────▶│ CLOSED │
//!   └───┬────┘                         └────────┘
//!       │ enable_refunds (goal missed)
//!       ▼
//!   ┌───────────┐
//!   │ REFUNDING │
//!   └───────────┘
//! ```
//!
//! The escrow is also the book of record for per-participant
//! contributions: `deposited_of` is what a participant has put in and not
//! yet been refunded. Conservation is verified after every transition.

use std::collections::BTreeMap;

use crowdsale_types::{Address, Amount, Result, SaleError};
use serde::{Deserialize, Serialize};

use crate::{ClaimGuard, Conservation};

/// Lifecycle state of the escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowState {
    /// Accepting deposits.
    Active,
    /// Goal missed; participants withdraw individually.
    Refunding,
    /// Goal reached; everything forwarded to the wallet.
    Closed,
}

impl EscrowState {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Active, Self::Refunding | Self::Closed))
    }
}

impl std::fmt::Display for EscrowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Refunding => write!(f, "REFUNDING"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    state: EscrowState,
    deposits: BTreeMap<Address, Amount>,
    custodied: Amount,
    conservation: Conservation,
    claims: ClaimGuard,
}

impl Escrow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: EscrowState::Active,
            deposits: BTreeMap::new(),
            custodied: 0,
            conservation: Conservation::new(),
            claims: ClaimGuard::new(),
        }
    }

    /// Record `amount` deposited on behalf of `participant`.
    ///
    /// # Errors
    /// `ZeroContribution` for zero, `RefundUnavailable` once the escrow is
    /// no longer active, `ArithmeticOverflow` if a total does not fit.
    pub fn deposit(&mut self, participant: Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(SaleError::ZeroContribution);
        }
        if self.state != EscrowState::Active {
            return Err(SaleError::RefundUnavailable {
                reason: format!("escrow is {}, deposits closed", self.state),
            });
        }
        let existing = self.deposited_of(participant);
        let total = existing
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow("escrow.deposit"))?;
        let custodied = self
            .custodied
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow("escrow.custodied"))?;
        self.conservation.record_deposit(amount)?;
        self.deposits.insert(participant, total);
        self.custodied = custodied;
        self.claims.clear(participant);
        self.conservation.verify(self.custodied)
    }

    /// Goal reached: release everything to the wallet. Returns the forwarded amount.
    ///
    /// # Errors
    /// `RefundUnavailable` unless the escrow is active.
    pub fn close(&mut self, wallet: Address) -> Result<Amount> {
        self.transition(EscrowState::Closed)?;
        let forwarded = self.custodied;
        self.conservation.record_forward(forwarded)?;
        self.custodied = 0;
        self.conservation.verify(self.custodied)?;
        tracing::info!(wallet = %wallet, forwarded, "Escrow closed");
        Ok(forwarded)
    }

    /// Goal missed: open refunds.
    ///
    /// # Errors
    /// `RefundUnavailable` unless the escrow is active.
    pub fn enable_refunds(&mut self) -> Result<()> {
        self.transition(EscrowState::Refunding)?;
        tracing::info!(custodied = self.custodied, "Escrow refunds enabled");
        Ok(())
    }

    /// Pay back a participant's recorded contribution and reset it to zero.
    ///
    /// # Errors
    /// - `RefundUnavailable` before resolution, after success, or with
    ///   nothing recorded
    /// - `DuplicateClaim` if already refunded since the last deposit
    pub fn claim_refund(&mut self, participant: Address) -> Result<Amount> {
        match self.state {
            EscrowState::Active => {
                return Err(SaleError::RefundUnavailable {
                    reason: "sale not finalized".into(),
                });
            }
            EscrowState::Closed => {
                return Err(SaleError::RefundUnavailable {
                    reason: "sale succeeded".into(),
                });
            }
            EscrowState::Refunding => {}
        }
        self.claims.check(participant)?;

        let amount = self.deposited_of(participant);
        if amount == 0 {
            return Err(SaleError::RefundUnavailable {
                reason: format!("no recorded contribution for {participant}"),
            });
        }
        let custodied = self
            .custodied
            .checked_sub(amount)
            .ok_or_else(|| SaleError::ConservationViolation {
                reason: format!("refund {amount} exceeds custodied {}", self.custodied),
            })?;

        self.conservation.record_refund(amount)?;
        self.deposits.remove(&participant);
        self.custodied = custodied;
        self.claims.mark_claimed(participant)?;
        self.conservation.verify(self.custodied)?;
        Ok(amount)
    }

    /// Back out a deposit whose contribution failed downstream.
    ///
    /// # Errors
    /// `RefundUnavailable` unless active, `ConservationViolation` if
    /// `participant` has less than `amount` recorded.
    pub fn cancel_deposit(&mut self, participant: Address, amount: Amount) -> Result<()> {
        if self.state != EscrowState::Active {
            return Err(SaleError::RefundUnavailable {
                reason: format!("escrow is {}, deposits closed", self.state),
            });
        }
        let recorded = self.deposited_of(participant);
        let (Some(remaining), Some(custodied)) =
            (recorded.checked_sub(amount), self.custodied.checked_sub(amount))
        else {
            return Err(SaleError::ConservationViolation {
                reason: format!("cancel deposit {amount} exceeds recorded {recorded} for {participant}"),
            });
        };
        self.conservation.cancel_deposit(amount)?;
        if remaining == 0 {
            self.deposits.remove(&participant);
        } else {
            self.deposits.insert(participant, remaining);
        }
        self.custodied = custodied;
        self.conservation.verify(self.custodied)
    }

    /// Re-open a claim whose payout failed: the contribution is recorded
    /// and custodied again.
    ///
    /// # Errors
    /// `RefundUnavailable` unless refunding and `participant` has claimed,
    /// `ArithmeticOverflow` if custody does not fit.
    pub fn cancel_refund(&mut self, participant: Address, amount: Amount) -> Result<()> {
        if self.state != EscrowState::Refunding || !self.claims.is_claimed(participant) {
            return Err(SaleError::RefundUnavailable {
                reason: format!("no refund to cancel for {participant}"),
            });
        }
        let custodied = self
            .custodied
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow("escrow.custodied"))?;
        self.conservation.cancel_refund(amount)?;
        self.deposits.insert(participant, amount);
        self.custodied = custodied;
        self.claims.clear(participant);
        self.conservation.verify(self.custodied)
    }

    fn transition(&mut self, target: EscrowState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(SaleError::RefundUnavailable {
                reason: format!("escrow cannot move from {} to {target}", self.state),
            });
        }
        self.state = target;
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> EscrowState {
        self.state
    }

    #[must_use]
    pub fn custodied(&self) -> Amount {
        self.custodied
    }

    #[must_use]
    pub fn deposited_of(&self, participant: Address) -> Amount {
        self.deposits.get(&participant).copied().unwrap_or(0)
    }

    /// Sum of all recorded (unrefunded) contributions.
    #[must_use]
    pub fn total_recorded(&self) -> Amount {
        self.deposits.values().sum()
    }

    /// Participants with a non-zero recorded contribution.
    pub fn participants(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.deposits.iter()
    }

    #[must_use]
    pub fn conservation(&self) -> &Conservation {
        &self.conservation
    }

    #[must_use]
    pub fn has_claimed(&self, participant: Address) -> bool {
        self.claims.is_claimed(participant)
    }
}

impl Default for Escrow {
    fn default() -> Self {
        Self::new()
    }
}
