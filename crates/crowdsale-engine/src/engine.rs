//! The sale engine: one serialized state machine over all policy components.
//!
//! Every mutating operation takes the write lock for its whole
//! validate → commit → call-out sequence, so operations never interleave
//! and a contribution sees one consistent `(rate, raised)` pair. Internal
//! state is committed before any collaborator is called; if a call fails,
//! custody deposits are compensated and the operation's own changes are
//! backed out.
//!
//! Finalize is the exception. Once a successful outcome commits, ledger and
//! custody effects cannot be undone, so settlement advances a
//! [`FinalizeStep`] marker instead. A failed step leaves the outcome in
//! place and a repeated `finalize` resumes at that step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use crowdsale_ingress::{AdminRole, AllowList, CapPolicy, PhaseSchedule, TimeWindow};
use crowdsale_settlement::{DistributionPlan, Escrow};
use crowdsale_types::{
    constants, Address, Amount, Clock, EventRecord, FinalizeStep, LockId, PhaseIndex, Rate, Result,
    SaleConfig, SaleError, SaleEvent, SaleId, SaleStage, TokenLedger, TokenMetadata, ValueCustody,
    VestedAllocation,
};
use parking_lot::RwLock;

use crate::{Journal, SaleSnapshot, SaleState};

/// The external capabilities a sale runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn TokenLedger>,
    pub custody: Arc<dyn ValueCustody>,
    pub clock: Arc<dyn Clock>,
}

/// Receipt for an accepted contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub payer: Address,
    pub participant: Address,
    pub value: Amount,
    pub tokens: Amount,
    pub rate: Rate,
    pub phase: PhaseIndex,
    /// Journal sequence number of the purchase.
    pub seq: u64,
}

/// Result of a successful `finalize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub stage: SaleStage,
    pub goal_reached: bool,
    pub raised: Amount,
    /// Value sent to the wallet (zero on failure).
    pub forwarded: Amount,
    /// Final token supply after distribution, if a plan is configured.
    pub final_total_supply: Option<Amount>,
    pub locks: Vec<VestedAllocation>,
}

pub struct SaleEngine {
    id: SaleId,
    wallet: Address,
    plan: Option<DistributionPlan>,
    ledger: Arc<dyn TokenLedger>,
    custody: Arc<dyn ValueCustody>,
    clock: Arc<dyn Clock>,
    state: RwLock<SaleState>,
}

impl std::fmt::Debug for SaleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleEngine")
            .field("id", &self.id)
            .field("wallet", &self.wallet)
            .finish_non_exhaustive()
    }
}

impl SaleEngine {
    /// Build a sale with a fresh [`SaleId`].
    ///
    /// # Errors
    /// See [`Self::with_id`].
    pub fn new(config: SaleConfig, collaborators: Collaborators) -> Result<Self> {
        Self::with_id(SaleId::new(), config, collaborators)
    }

    /// Build a sale acting as `id.address()` on the collaborators.
    ///
    /// The token ledger must already be owned by the sale; it is paused
    /// here (if it isn't already) and stays paused until a successful
    /// finalize.
    ///
    /// # Errors
    /// Any configuration error, `InvalidSchedule` if the opening is not in
    /// the future, `InvalidConfig` if the sale does not own the ledger, or
    /// the ledger's error from `pause`.
    pub fn with_id(id: SaleId, config: SaleConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        let Collaborators {
            ledger,
            custody,
            clock,
        } = collaborators;

        let now = clock.now();
        let window = TimeWindow::new(config.opening_time, config.closing_time, now)?;
        let phases = PhaseSchedule::new(config.phases.clone())?;
        let caps = CapPolicy::new(&config.caps)?;
        let plan = config
            .distribution
            .clone()
            .map(DistributionPlan::from_config)
            .transpose()?;
        let admin = AdminRole::new(config.admin)?;
        let mut allow_list = AllowList::new();
        allow_list.add_many(&admin, config.admin, &config.allow_list)?;

        let minter = id.address();
        if ledger.owner() != minter {
            return Err(SaleError::InvalidConfig(format!(
                "token ledger {} is owned by {}, not by the sale {minter}",
                ledger.address(),
                ledger.owner()
            )));
        }
        if !ledger.is_paused() {
            ledger.pause(minter)?;
        }

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            sale = %id,
            token = %ledger.address(),
            wallet = %config.wallet,
            opening = %window.opening(),
            closing = %window.closing(),
            phases = phases.phases().len(),
            rate = phases.current_rate(),
            "Sale created"
        );

        Ok(Self {
            id,
            wallet: config.wallet,
            plan,
            ledger,
            custody,
            clock,
            state: RwLock::new(SaleState {
                admin,
                allow_list,
                window,
                phases,
                caps,
                goal: config.caps.goal,
                raised: 0,
                escrow: Escrow::new(),
                outcome: None,
                finalized_at: None,
                locks: Vec::new(),
                final_total_supply: None,
                settlement: None,
                journal: Journal::new(),
            }),
        })
    }

    fn minter(&self) -> Address {
        self.id.address()
    }

    // -----------------------------------------------------------------
    // Contributions
    // -----------------------------------------------------------------

    /// Contribute `value` for tokens to the payer itself.
    ///
    /// # Errors
    /// See [`Self::buy_tokens_for`].
    pub fn contribute(&self, payer: Address, value: Amount) -> Result<Purchase> {
        self.buy_tokens_for(payer, payer, value)
    }

    /// Contribute `value` from `payer`; tokens and the recorded
    /// contribution go to `participant`.
    ///
    /// # Errors
    /// `NotOpen`, `InvalidAddress`, `ZeroContribution`, `NotAdmitted`,
    /// `CapViolation`, or a collaborator error (purchase backed out).
    pub fn buy_tokens_for(&self, payer: Address, participant: Address, value: Amount) -> Result<Purchase> {
        let mut state = self.state.write();
        let now = self.clock.now();

        let stage = state.stage(now);
        if stage != SaleStage::Open {
            return Err(reject("contribute", SaleError::NotOpen { stage }));
        }
        if payer.is_zero() || participant.is_zero() {
            return Err(reject(
                "contribute",
                SaleError::InvalidAddress {
                    reason: "contribution from or for the zero address".into(),
                },
            ));
        }
        if value == 0 {
            return Err(reject("contribute", SaleError::ZeroContribution));
        }
        if !state.allow_list.is_admitted(participant) {
            return Err(reject("contribute", SaleError::NotAdmitted(participant)));
        }
        let existing = state.escrow.deposited_of(participant);
        state
            .caps
            .validate(existing, value, state.raised)
            .map_err(|e| reject("contribute", e))?;

        let rate = state.phases.current_rate();
        let phase = state.phases.current();
        let tokens = value
            .checked_mul(rate)
            .ok_or(SaleError::ArithmeticOverflow("tokens"))?;

        // Commit, then call out.
        let seq = state
            .record_purchase(payer, participant, value, tokens, rate, now)
            .map_err(|e| reject("contribute", e))?;
        if let Err(err) = self.custody.deposit(payer, value) {
            let undo = state.revert_purchase(participant, value, seq);
            return Err(rolled_back("contribute", err, undo));
        }
        if let Err(err) = self.ledger.mint(self.minter(), participant, tokens) {
            if let Err(comp) = self.custody.refund(payer, value) {
                tracing::error!(
                    payer = %payer,
                    value,
                    error = %comp,
                    "Compensating refund failed"
                );
            }
            let undo = state.revert_purchase(participant, value, seq);
            return Err(rolled_back("contribute", err, undo));
        }

        tracing::info!(
            payer = %payer,
            participant = %participant,
            value,
            tokens,
            rate,
            phase = %phase,
            raised = state.raised,
            seq,
            "Tokens purchased"
        );
        Ok(Purchase {
            payer,
            participant,
            value,
            tokens,
            rate,
            phase,
            seq,
        })
    }

    // -----------------------------------------------------------------
    // Admin operations
    // -----------------------------------------------------------------

    /// Move to a later phase. Returns the new rate.
    ///
    /// # Errors
    /// `Unauthorized`, `WrongStage` once closed, `InvalidPhaseTransition`.
    pub fn set_phase(&self, caller: Address, to: PhaseIndex) -> Result<Rate> {
        let mut state = self.state.write();
        let now = self.clock.now();
        state.admin.ensure(caller).map_err(|e| reject("set_phase", e))?;
        let actual = state.stage(now);
        if !actual.allows_phase_change() {
            return Err(reject(
                "set_phase",
                SaleError::WrongStage {
                    operation: "set_phase",
                    actual,
                },
            ));
        }

        let previous = state.phases.clone();
        let from = previous.current();
        let SaleState { admin, phases, .. } = &mut *state;
        let rate = phases
            .advance(admin, caller, to)
            .map_err(|e| reject("set_phase", e))?;
        let event = SaleEvent::PhaseAdvanced {
            from: from.0,
            to: to.0,
            rate,
        };
        if let Err(err) = state.journal.append(event, now) {
            state.phases = previous;
            return Err(rolled_back("set_phase", err, Ok(())));
        }
        Ok(rate)
    }

    /// Admit identities. Returns how many were newly admitted.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidAddress`, `InvalidConfig` for an oversized batch.
    pub fn add_to_allow_list(&self, caller: Address, ids: &[Address]) -> Result<usize> {
        let mut state = self.state.write();
        let now = self.clock.now();
        let mut fresh: Vec<Address> = ids
            .iter()
            .copied()
            .filter(|id| !state.allow_list.is_admitted(*id))
            .collect();
        fresh.sort_unstable();
        fresh.dedup();
        let SaleState {
            admin, allow_list, ..
        } = &mut *state;
        let added = allow_list
            .add_many(admin, caller, ids)
            .map_err(|e| reject("add_to_allow_list", e))?;
        if added > 0 {
            let event = SaleEvent::AllowListAdded {
                identities: ids.to_vec(),
            };
            if let Err(err) = state.journal.append(event, now) {
                let SaleState {
                    admin, allow_list, ..
                } = &mut *state;
                let undo = fresh
                    .iter()
                    .try_for_each(|id| allow_list.remove(admin, caller, *id).map(drop));
                return Err(rolled_back("add_to_allow_list", err, undo));
            }
            tracing::info!(added, total = state.allow_list.len(), "Allow-list extended");
        }
        Ok(added)
    }

    /// Remove one identity. Returns whether it was admitted.
    ///
    /// # Errors
    /// `Unauthorized`.
    pub fn remove_from_allow_list(&self, caller: Address, id: Address) -> Result<bool> {
        let mut state = self.state.write();
        let now = self.clock.now();
        let SaleState {
            admin, allow_list, ..
        } = &mut *state;
        let removed = allow_list
            .remove(admin, caller, id)
            .map_err(|e| reject("remove_from_allow_list", e))?;
        if removed {
            let event = SaleEvent::AllowListRemoved { identity: id };
            if let Err(err) = state.journal.append(event, now) {
                let SaleState {
                    admin, allow_list, ..
                } = &mut *state;
                let undo = allow_list.add(admin, caller, id).map(drop);
                return Err(rolled_back("remove_from_allow_list", err, undo));
            }
            tracing::info!(identity = %id, "Allow-list entry removed");
        }
        Ok(removed)
    }

    /// Hand the admin role to `new_admin`.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidAddress` for the zero address.
    pub fn transfer_admin(&self, caller: Address, new_admin: Address) -> Result<()> {
        let mut state = self.state.write();
        let now = self.clock.now();
        let previous = state.admin;
        let from = state
            .admin
            .transfer(caller, new_admin)
            .map_err(|e| reject("transfer_admin", e))?;
        let event = SaleEvent::AdminTransferred {
            from,
            to: new_admin,
        };
        if let Err(err) = state.journal.append(event, now) {
            state.admin = previous;
            return Err(rolled_back("transfer_admin", err, Ok(())));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------

    /// Resolve the sale, once, at or after closing.
    ///
    /// Success: reserved buckets are minted into time-locks, minting is
    /// finished, the ledger is unpaused and handed to the wallet, and the
    /// escrow is forwarded. Failure: the escrow enters refund mode and the
    /// ledger stays paused.
    ///
    /// The outcome is committed before the first collaborator call. If a
    /// settlement step fails the outcome stands, the error is returned, and
    /// calling `finalize` again resumes at the failed step.
    ///
    /// # Errors
    /// `Unauthorized`, `AlreadyFinalized`, `SaleStillOpen`, or the error of
    /// the settlement step that failed.
    pub fn finalize(&self, caller: Address) -> Result<FinalizeOutcome> {
        let mut state = self.state.write();
        let now = self.clock.now();
        state.admin.ensure(caller).map_err(|e| reject("finalize", e))?;
        if state.settlement_pending() {
            tracing::info!(sale = %self.id, step = ?state.settlement, "Resuming settlement");
            return self.settle(&mut state);
        }
        if state.is_finalized() {
            return Err(reject("finalize", SaleError::AlreadyFinalized));
        }
        if !state.window.has_closed(now) {
            return Err(reject(
                "finalize",
                SaleError::SaleStillOpen {
                    closing_time: state.window.closing(),
                },
            ));
        }

        if state.goal_reached() {
            self.resolve_success(&mut state, now)
                .map_err(|e| reject("finalize", e))?;
            self.settle(&mut state)
        } else {
            let outcome = resolve_failure(&mut state, now).map_err(|e| reject("finalize", e))?;
            log_finalized(self.id, &outcome);
            Ok(outcome)
        }
    }

    /// Plan the distribution and commit the successful outcome. Nothing
    /// outside the sale is touched.
    fn resolve_success(&self, state: &mut SaleState, now: DateTime<Utc>) -> Result<()> {
        let (final_total_supply, locks) = match &self.plan {
            Some(plan) => {
                let final_supply = plan.final_total_supply(self.ledger.total_supply())?;
                let locks = plan.plan_locks(self.minter(), final_supply, now)?;
                (Some(final_supply), locks)
            }
            None => (None, Vec::new()),
        };

        let mark = state.journal.len();
        state.journal.append(
            SaleEvent::Finalized {
                goal_reached: true,
                raised: state.raised,
                forwarded: state.escrow.custodied(),
                locks: locks.iter().map(|l| l.id()).collect(),
            },
            now,
        )?;
        if let Err(err) = state.escrow.close(self.wallet) {
            state.journal.truncate(mark);
            return Err(err);
        }
        state.outcome = Some(true);
        state.finalized_at = Some(now);
        state.locks = locks;
        state.final_total_supply = final_total_supply;
        state.settlement = Some(FinalizeStep::MintLock(0));
        Ok(())
    }

    /// Run the outstanding settlement steps in order. Minting must precede
    /// the ownership hand-off.
    fn settle(&self, state: &mut SaleState) -> Result<FinalizeOutcome> {
        while let Some(step) = state.settlement.filter(|s| !s.is_complete()) {
            match self.settle_step(state, step) {
                Ok(next) => state.settlement = Some(next),
                Err(err) => {
                    tracing::warn!(
                        sale = %self.id,
                        step = %step,
                        code = err.code(),
                        error = %err,
                        "Settlement step failed, finalize again to resume"
                    );
                    return Err(err);
                }
            }
        }

        let outcome = FinalizeOutcome {
            stage: SaleStage::FinalizedSuccess,
            goal_reached: true,
            raised: state.raised,
            forwarded: state.escrow.conservation().total_forwarded(),
            final_total_supply: state.final_total_supply,
            locks: state.locks.iter().map(|l| l.allocation().clone()).collect(),
        };
        log_finalized(self.id, &outcome);
        Ok(outcome)
    }

    fn settle_step(&self, state: &SaleState, step: FinalizeStep) -> Result<FinalizeStep> {
        let minter = self.minter();
        Ok(match step {
            FinalizeStep::MintLock(i) => match (&self.plan, state.locks.get(i)) {
                (Some(plan), Some(lock)) => {
                    plan.mint_locks(self.ledger.as_ref(), minter, std::slice::from_ref(lock))?;
                    FinalizeStep::MintLock(i + 1)
                }
                _ => FinalizeStep::FinishMinting,
            },
            FinalizeStep::FinishMinting => {
                self.ledger.finish_minting(minter)?;
                FinalizeStep::Unpause
            }
            FinalizeStep::Unpause => {
                self.ledger.unpause(minter)?;
                FinalizeStep::TransferOwnership
            }
            FinalizeStep::TransferOwnership => {
                self.ledger.transfer_ownership(minter, self.wallet)?;
                FinalizeStep::Forward
            }
            FinalizeStep::Forward => {
                let forwarded = state.escrow.conservation().total_forwarded();
                self.custody.forward(self.wallet, forwarded)?;
                FinalizeStep::Complete
            }
            FinalizeStep::Complete => FinalizeStep::Complete,
        })
    }

    /// Pay back a participant's contribution after a failed sale.
    ///
    /// # Errors
    /// `RefundUnavailable` unless the sale failed and the participant has
    /// a recorded contribution, `DuplicateClaim` on a repeat, or the
    /// custody error (claim re-opened).
    pub fn claim_refund(&self, participant: Address) -> Result<Amount> {
        let mut state = self.state.write();
        let now = self.clock.now();
        let mark = state.journal.len();
        let amount = state
            .escrow
            .claim_refund(participant)
            .map_err(|e| reject("claim_refund", e))?;
        if let Err(err) = state
            .journal
            .append(SaleEvent::RefundClaimed { participant, amount }, now)
        {
            let undo = state.escrow.cancel_refund(participant, amount);
            return Err(rolled_back("claim_refund", err, undo));
        }
        if let Err(err) = self.custody.refund(participant, amount) {
            state.journal.truncate(mark);
            let undo = state.escrow.cancel_refund(participant, amount);
            return Err(rolled_back("claim_refund", err, undo));
        }
        tracing::info!(participant = %participant, amount, "Refund paid");
        Ok(amount)
    }

    /// Release a vested allocation to its beneficiary.
    ///
    /// # Errors
    /// `SettlementPending` while a successful finalize is still settling,
    /// `LockNotFound`, `LockActive`, `AlreadyReleased`, or the ledger
    /// error (lock left unreleased).
    pub fn release_lock(&self, lock_id: LockId) -> Result<Amount> {
        let mut state = self.state.write();
        let now = self.clock.now();
        if let Some(next) = state.settlement.filter(|s| !s.is_complete()) {
            return Err(reject("release_lock", SaleError::SettlementPending { next }));
        }
        let allocation = state
            .lock_mut(lock_id)
            .map_err(|e| reject("release_lock", e))?
            .allocation()
            .clone();
        allocation
            .ensure_releasable(now)
            .map_err(|e| reject("release_lock", e))?;

        let mark = state.journal.len();
        let event = SaleEvent::LockReleased {
            lock: lock_id,
            beneficiary: allocation.beneficiary,
            amount: allocation.amount,
        };
        state
            .journal
            .append(event, now)
            .map_err(|e| reject("release_lock", e))?;
        let released = state
            .lock_mut(lock_id)
            .and_then(|lock| lock.release(self.ledger.as_ref(), now));
        match released {
            Ok(amount) => Ok(amount),
            Err(err) => {
                state.journal.truncate(mark);
                Err(rolled_back("release_lock", err, Ok(())))
            }
        }
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    #[must_use]
    pub fn sale_id(&self) -> SaleId {
        self.id
    }

    /// Address of the token ledger.
    #[must_use]
    pub fn token(&self) -> Address {
        self.ledger.address()
    }

    #[must_use]
    pub fn token_metadata(&self) -> TokenMetadata {
        self.ledger.metadata()
    }

    #[must_use]
    pub fn wallet(&self) -> Address {
        self.wallet
    }

    /// Rate of the current phase.
    #[must_use]
    pub fn rate(&self) -> Rate {
        self.state.read().phases.current_rate()
    }

    #[must_use]
    pub fn phase(&self) -> PhaseIndex {
        self.state.read().phases.current()
    }

    #[must_use]
    pub fn cap(&self) -> Option<Amount> {
        self.state.read().caps.cap()
    }

    #[must_use]
    pub fn goal(&self) -> Option<Amount> {
        self.state.read().goal
    }

    #[must_use]
    pub fn investor_min_cap(&self) -> Amount {
        self.state.read().caps.investor_min_cap()
    }

    #[must_use]
    pub fn investor_hard_cap(&self) -> Option<Amount> {
        self.state.read().caps.investor_hard_cap()
    }

    /// Recorded contribution of `participant` (zero after a refund).
    #[must_use]
    pub fn user_contribution(&self, participant: Address) -> Amount {
        self.state.read().escrow.deposited_of(participant)
    }

    #[must_use]
    pub fn raised(&self) -> Amount {
        self.state.read().raised
    }

    #[must_use]
    pub fn stage(&self) -> SaleStage {
        let now = self.clock.now();
        self.state.read().stage(now)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.stage() == SaleStage::Open
    }

    #[must_use]
    pub fn has_closed(&self) -> bool {
        let now = self.clock.now();
        self.state.read().window.has_closed(now)
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.state.read().is_finalized()
    }

    /// Next outstanding settlement step; `None` unless finalize succeeded.
    #[must_use]
    pub fn finalize_progress(&self) -> Option<FinalizeStep> {
        self.state.read().settlement
    }

    #[must_use]
    pub fn final_total_supply(&self) -> Option<Amount> {
        self.state.read().final_total_supply
    }

    /// Fixed at finalize; before that, whether the goal is currently met.
    #[must_use]
    pub fn goal_reached(&self) -> bool {
        self.state.read().goal_reached()
    }

    #[must_use]
    pub fn cap_reached(&self) -> bool {
        let state = self.state.read();
        state.caps.cap_reached(state.raised)
    }

    #[must_use]
    pub fn opening_time(&self) -> DateTime<Utc> {
        self.state.read().window.opening()
    }

    #[must_use]
    pub fn closing_time(&self) -> DateTime<Utc> {
        self.state.read().window.closing()
    }

    #[must_use]
    pub fn is_admitted(&self, id: Address) -> bool {
        self.state.read().allow_list.is_admitted(id)
    }

    #[must_use]
    pub fn admin(&self) -> Address {
        self.state.read().admin.owner()
    }

    #[must_use]
    pub fn locks(&self) -> Vec<VestedAllocation> {
        self.state
            .read()
            .locks
            .iter()
            .map(|l| l.allocation().clone())
            .collect()
    }

    #[must_use]
    pub fn lock(&self, id: LockId) -> Option<VestedAllocation> {
        self.state
            .read()
            .locks
            .iter()
            .find(|l| l.id() == id)
            .map(|l| l.allocation().clone())
    }

    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.read().journal.records().to_vec()
    }

    /// # Errors
    /// `Internal` naming the first broken journal record.
    pub fn verify_journal(&self) -> Result<()> {
        self.state.read().journal.verify_chain()
    }

    /// # Errors
    /// `ConservationViolation` if escrow, contributions and `raised` disagree.
    pub fn check_conservation(&self) -> Result<()> {
        self.state.read().check_conservation()
    }

    #[must_use]
    pub fn snapshot(&self) -> SaleSnapshot {
        let now = self.clock.now();
        self.state.read().snapshot(self.id, self.wallet, now)
    }
}

fn resolve_failure(state: &mut SaleState, now: DateTime<Utc>) -> Result<FinalizeOutcome> {
    let mark = state.journal.len();
    state.journal.append(
        SaleEvent::Finalized {
            goal_reached: false,
            raised: state.raised,
            forwarded: 0,
            locks: Vec::new(),
        },
        now,
    )?;
    if let Err(err) = state.escrow.enable_refunds() {
        state.journal.truncate(mark);
        return Err(err);
    }
    state.outcome = Some(false);
    state.finalized_at = Some(now);
    Ok(FinalizeOutcome {
        stage: SaleStage::FinalizedFailure,
        goal_reached: false,
        raised: state.raised,
        forwarded: 0,
        final_total_supply: None,
        locks: Vec::new(),
    })
}

fn log_finalized(id: SaleId, outcome: &FinalizeOutcome) {
    tracing::info!(
        sale = %id,
        stage = %outcome.stage,
        raised = outcome.raised,
        forwarded = outcome.forwarded,
        locks = outcome.locks.len(),
        "Sale finalized"
    );
}

fn reject(operation: &'static str, err: SaleError) -> SaleError {
    tracing::warn!(operation, code = err.code(), error = %err, "Operation rejected");
    err
}

/// Log a collaborator failure whose operation was backed out by `undo`.
fn rolled_back(operation: &'static str, err: SaleError, undo: Result<()>) -> SaleError {
    if let Err(undo_err) = undo {
        tracing::error!(
            operation,
            code = undo_err.code(),
            error = %undo_err,
            "Rollback incomplete"
        );
    }
    tracing::warn!(
        operation,
        code = err.code(),
        error = %err,
        "Collaborator failed, operation rolled back"
    );
    err
}
