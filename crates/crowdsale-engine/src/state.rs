//! Committed sale state and its serializable read model.
//!
//! [`SaleState`] is everything the engine mutates. It lives behind the
//! engine's `RwLock`; a failed operation backs out only what it changed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use crowdsale_ingress::{AdminRole, AllowList, CapPolicy, PhaseSchedule, TimeWindow};
use crowdsale_settlement::{Conservation, Escrow, EscrowState, TokenTimelock};
use crowdsale_types::{
    Address, Amount, FinalizeStep, LockId, Rate, Result, SaleError, SaleEvent, SaleId,
    SaleStage, VestedAllocation,
};
use serde::{Deserialize, Serialize};

use crate::Journal;

#[derive(Debug)]
pub struct SaleState {
    pub admin: AdminRole,
    pub allow_list: AllowList,
    pub window: TimeWindow,
    pub phases: PhaseSchedule,
    pub caps: CapPolicy,
    pub goal: Option<Amount>,
    /// Σ accepted contributions. Not reduced by refunds.
    pub raised: Amount,
    pub escrow: Escrow,
    /// `Some(goal_reached)` once finalized.
    pub outcome: Option<bool>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub locks: Vec<TokenTimelock>,
    /// Fixed when a successful finalize commits.
    pub final_total_supply: Option<Amount>,
    /// Next settlement step after a successful finalize; `None` otherwise.
    pub settlement: Option<FinalizeStep>,
    pub journal: Journal,
}

impl SaleState {
    #[must_use]
    pub fn stage(&self, now: DateTime<Utc>) -> SaleStage {
        SaleStage::derive(now, self.window.opening(), self.window.closing(), self.outcome)
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.outcome.is_some()
    }

    /// Fixed outcome once finalized, live comparison before.
    #[must_use]
    pub fn goal_reached(&self) -> bool {
        self.outcome
            .unwrap_or_else(|| self.goal.is_none_or(|goal| self.raised >= goal))
    }

    /// Success committed but ledger or custody effects still outstanding.
    #[must_use]
    pub fn settlement_pending(&self) -> bool {
        self.settlement.is_some_and(|step| !step.is_complete())
    }

    /// Record an accepted contribution: escrow deposit, raised total, journal.
    /// Either all three change or none do.
    ///
    /// # Errors
    /// Escrow, overflow or journal errors.
    pub fn record_purchase(
        &mut self,
        payer: Address,
        participant: Address,
        value: Amount,
        tokens: Amount,
        rate: Rate,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let raised = self
            .raised
            .checked_add(value)
            .ok_or(SaleError::ArithmeticOverflow("raised"))?;
        self.escrow.deposit(participant, value)?;
        let event = SaleEvent::TokensPurchased {
            payer,
            participant,
            value,
            tokens,
            rate,
            phase: self.phases.current().0,
        };
        let seq = match self.journal.append(event, now) {
            Ok(record) => record.seq,
            Err(err) => {
                self.escrow.cancel_deposit(participant, value)?;
                return Err(err);
            }
        };
        self.raised = raised;
        Ok(seq)
    }

    /// Back out the purchase journaled at `seq` after a collaborator refused it.
    ///
    /// # Errors
    /// `ConservationViolation` if the purchase is not the latest one recorded.
    pub fn revert_purchase(&mut self, participant: Address, value: Amount, seq: u64) -> Result<()> {
        let len = usize::try_from(seq).map_err(|_| SaleError::ArithmeticOverflow("journal seq"))?;
        if len + 1 != self.journal.len() {
            return Err(SaleError::ConservationViolation {
                reason: format!("purchase seq {seq} is not the journal head"),
            });
        }
        let raised = self
            .raised
            .checked_sub(value)
            .ok_or_else(|| SaleError::ConservationViolation {
                reason: format!("revert {value} exceeds raised {}", self.raised),
            })?;
        self.escrow.cancel_deposit(participant, value)?;
        self.raised = raised;
        self.journal.truncate(len);
        Ok(())
    }

    pub fn lock_mut(&mut self, id: LockId) -> Result<&mut TokenTimelock> {
        self.locks
            .iter_mut()
            .find(|l| l.id() == id)
            .ok_or(SaleError::LockNotFound(id))
    }

    /// Check `raised == Σ contributions == custodied` while unresolved.
    ///
    /// # Errors
    /// `ConservationViolation` on mismatch.
    pub fn check_conservation(&self) -> Result<()> {
        self.escrow.conservation().verify(self.escrow.custodied())?;
        if self.outcome.is_none()
            && (self.escrow.total_recorded() != self.raised || self.escrow.custodied() != self.raised)
        {
            return Err(SaleError::ConservationViolation {
                reason: format!(
                    "raised {} != recorded {} / custodied {}",
                    self.raised,
                    self.escrow.total_recorded(),
                    self.escrow.custodied()
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self, sale_id: SaleId, wallet: Address, now: DateTime<Utc>) -> SaleSnapshot {
        SaleSnapshot {
            sale_id,
            stage: self.stage(now),
            admin: self.admin.owner(),
            wallet,
            phase: self.phases.current().0,
            rate: self.phases.current_rate(),
            raised: self.raised,
            cap: self.caps.cap(),
            goal: self.goal,
            investor_min_cap: self.caps.investor_min_cap(),
            investor_hard_cap: self.caps.investor_hard_cap(),
            opening_time: self.window.opening(),
            closing_time: self.window.closing(),
            goal_reached: self.outcome,
            finalized_at: self.finalized_at,
            contributions: self
                .escrow
                .participants()
                .map(|(who, amount)| (*who, *amount))
                .collect(),
            admitted: self.allow_list.iter().copied().collect(),
            escrow_state: self.escrow.state(),
            custodied: self.escrow.custodied(),
            conservation: *self.escrow.conservation(),
            locks: self.locks.iter().map(|l| l.allocation().clone()).collect(),
            final_total_supply: self.final_total_supply,
            settlement: self.settlement,
            event_count: self.journal.len() as u64,
            journal_head: hex::encode(self.journal.head_hash()),
        }
    }
}

/// Point-in-time view of a sale. Two snapshots taken around a rejected
/// operation compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSnapshot {
    pub sale_id: SaleId,
    pub stage: SaleStage,
    pub admin: Address,
    pub wallet: Address,
    pub phase: usize,
    pub rate: Rate,
    pub raised: Amount,
    pub cap: Option<Amount>,
    pub goal: Option<Amount>,
    pub investor_min_cap: Amount,
    pub investor_hard_cap: Option<Amount>,
    pub opening_time: DateTime<Utc>,
    pub closing_time: DateTime<Utc>,
    pub goal_reached: Option<bool>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub contributions: BTreeMap<Address, Amount>,
    pub admitted: Vec<Address>,
    pub escrow_state: EscrowState,
    pub custodied: Amount,
    pub conservation: Conservation,
    pub locks: Vec<VestedAllocation>,
    pub final_total_supply: Option<Amount>,
    /// Next outstanding settlement step of a successful finalize.
    pub settlement: Option<FinalizeStep>,
    pub event_count: u64,
    pub journal_head: String,
}

impl SaleSnapshot {
    /// # Errors
    /// `Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
