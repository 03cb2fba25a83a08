//! Integration test: end-to-end sale scenarios
//!
//! PENDING → OPEN → CLOSED_UNRESOLVED → FINALIZED_SUCCESS | FINALIZED_FAILURE
//!
//! Drives a full sale against the in-memory ledger, custody and clock.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use crowdsale_engine::{Collaborators, SaleEngine};
use crowdsale_types::testkit::{InMemoryCustody, InMemoryTokenLedger, ManualClock};
use crowdsale_types::units::ether;
use crowdsale_types::*;
use rust_decimal::Decimal;

const RATE: Rate = 1_000;

fn eth(n: i64) -> Amount {
    ether(Decimal::from(n)).unwrap()
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

struct Harness {
    engine: SaleEngine,
    ledger: Arc<InMemoryTokenLedger>,
    custody: Arc<InMemoryCustody>,
    clock: Arc<ManualClock>,
    admin: Address,
    wallet: Address,
}

impl Harness {
    fn new(caps: CapConfig, distribution: Option<DistributionConfig>) -> Self {
        let admin = Address::random();
        let wallet = Address::random();
        let opening = start() + Duration::days(1);
        let mut config = SaleConfig::single_rate(admin, wallet, opening, opening + Duration::days(30), RATE);
        config.caps = caps;
        config.distribution = distribution;

        let id = SaleId::new();
        let ledger = Arc::new(InMemoryTokenLedger::new(id.address(), TokenMetadata::default()));
        let custody = Arc::new(InMemoryCustody::new());
        let clock = Arc::new(ManualClock::new(start()));
        let engine = SaleEngine::with_id(
            id,
            config,
            Collaborators {
                ledger: ledger.clone(),
                custody: custody.clone(),
                clock: clock.clone(),
            },
        )
        .unwrap();
        Self {
            engine,
            ledger,
            custody,
            clock,
            admin,
            wallet,
        }
    }

    fn open(&self) {
        self.clock.set(self.engine.opening_time());
    }

    fn close(&self) {
        self.clock.set(self.engine.closing_time() + Duration::seconds(1));
    }

    fn admit(&self, who: Address) {
        self.engine.add_to_allow_list(self.admin, &[who]).unwrap();
    }
}

fn zep_distribution(founders: Address) -> DistributionConfig {
    DistributionConfig {
        sale_percentage: 70,
        buckets: vec![
            BucketConfig::new("founders", founders, 10),
            BucketConfig::new("foundation", Address::random(), 10),
            BucketConfig::new("partners", Address::random(), 10),
        ],
        lock_duration: StdDuration::from_secs(constants::DEFAULT_LOCK_DURATION_SECS),
    }
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn construction_pauses_ledger_and_starts_pending() {
    let h = Harness::new(CapConfig::default(), None);
    assert!(h.ledger.is_paused());
    assert_eq!(h.engine.stage(), SaleStage::Pending);
    assert_eq!(h.engine.rate(), RATE);
    assert_eq!(h.engine.phase(), PhaseIndex(0));
    assert_eq!(h.engine.token(), h.ledger.address());
    assert_eq!(h.engine.token_metadata().symbol, "ZEP");
    assert_eq!(h.engine.admin(), h.admin);
    assert_eq!(h.engine.wallet(), h.wallet);
    assert!(h.engine.events().is_empty());
}

#[test]
fn construction_requires_ledger_ownership() {
    let admin = Address::random();
    let opening = start() + Duration::days(1);
    let config = SaleConfig::single_rate(admin, Address::random(), opening, opening + Duration::days(1), RATE);
    let result = SaleEngine::new(
        config,
        Collaborators {
            ledger: Arc::new(InMemoryTokenLedger::new(Address::random(), TokenMetadata::default())),
            custody: Arc::new(InMemoryCustody::new()),
            clock: Arc::new(ManualClock::new(start())),
        },
    );
    assert!(matches!(result, Err(SaleError::InvalidConfig(_))));
}

#[test]
fn construction_rejects_opening_in_the_past() {
    let id = SaleId::new();
    let opening = start() - Duration::seconds(1);
    let config = SaleConfig::single_rate(Address::random(), Address::random(), opening, opening + Duration::days(1), RATE);
    let result = SaleEngine::with_id(
        id,
        config,
        Collaborators {
            ledger: Arc::new(InMemoryTokenLedger::new(id.address(), TokenMetadata::default())),
            custody: Arc::new(InMemoryCustody::new()),
            clock: Arc::new(ManualClock::new(start())),
        },
    );
    assert!(matches!(result, Err(SaleError::InvalidSchedule { .. })));
}

// =========================================================================
// Stage gating
// =========================================================================

#[test]
fn contributions_only_inside_window() {
    let h = Harness::new(CapConfig::default(), None);
    let alice = Address::random();
    h.admit(alice);

    let err = h.engine.contribute(alice, eth(1)).unwrap_err();
    assert!(matches!(err, SaleError::NotOpen { stage: SaleStage::Pending }));

    h.open();
    assert!(h.engine.is_open());
    let purchase = h.engine.contribute(alice, eth(1)).unwrap();
    assert_eq!(purchase.tokens, eth(1) * RATE);
    assert_eq!(h.ledger.balance_of(alice), eth(1) * RATE);

    h.clock.set(h.engine.closing_time());
    assert!(h.engine.has_closed());
    let err = h.engine.contribute(alice, eth(1)).unwrap_err();
    assert!(matches!(err, SaleError::NotOpen { stage: SaleStage::ClosedUnresolved }));
}

#[test]
fn unlisted_and_zero_contributions_rejected() {
    let h = Harness::new(CapConfig::default(), None);
    h.open();
    let stranger = Address::random();
    assert!(matches!(
        h.engine.contribute(stranger, eth(1)),
        Err(SaleError::NotAdmitted(who)) if who == stranger
    ));
    h.admit(stranger);
    assert!(matches!(h.engine.contribute(stranger, 0), Err(SaleError::ZeroContribution)));
    assert!(matches!(
        h.engine.buy_tokens_for(stranger, Address::ZERO, eth(1)),
        Err(SaleError::InvalidAddress { .. })
    ));
}

#[test]
fn removed_identity_can_no_longer_contribute() {
    let h = Harness::new(CapConfig::default(), None);
    let alice = Address::random();
    h.admit(alice);
    h.open();
    h.engine.contribute(alice, eth(1)).unwrap();

    assert!(h.engine.remove_from_allow_list(h.admin, alice).unwrap());
    assert!(!h.engine.is_admitted(alice));
    assert!(matches!(h.engine.contribute(alice, eth(1)), Err(SaleError::NotAdmitted(_))));
    // contribution already recorded stays
    assert_eq!(h.engine.user_contribution(alice), eth(1));
}

#[test]
fn buy_for_credits_the_participant() {
    let h = Harness::new(CapConfig::default(), None);
    let payer = Address::random();
    let beneficiary = Address::random();
    h.admit(beneficiary);
    h.open();

    let purchase = h.engine.buy_tokens_for(payer, beneficiary, eth(2)).unwrap();
    assert_eq!(purchase.payer, payer);
    assert_eq!(purchase.participant, beneficiary);
    assert_eq!(h.engine.user_contribution(beneficiary), eth(2));
    assert_eq!(h.engine.user_contribution(payer), 0);
    assert_eq!(h.ledger.balance_of(beneficiary), eth(2) * RATE);
    assert_eq!(h.custody.balance(), eth(2));
}

// =========================================================================
// Phases and admin
// =========================================================================

#[test]
fn phase_change_applies_to_later_contributions() {
    let admin = Address::random();
    let opening = start() + Duration::days(1);
    let mut config = SaleConfig::single_rate(admin, Address::random(), opening, opening + Duration::days(30), 0);
    config.phases = vec![PhaseConfig::new("pre-sale", 600), PhaseConfig::new("public-sale", 500)];
    let id = SaleId::new();
    let ledger = Arc::new(InMemoryTokenLedger::new(id.address(), TokenMetadata::default()));
    let clock = Arc::new(ManualClock::new(start()));
    let engine = SaleEngine::with_id(
        id,
        config,
        Collaborators {
            ledger: ledger.clone(),
            custody: Arc::new(InMemoryCustody::new()),
            clock: clock.clone(),
        },
    )
    .unwrap();
    let alice = Address::random();
    engine.add_to_allow_list(admin, &[alice]).unwrap();
    clock.set(opening);

    assert_eq!(engine.contribute(alice, 10).unwrap().tokens, 6_000);
    assert!(matches!(
        engine.set_phase(alice, PhaseIndex(1)),
        Err(SaleError::Unauthorized { .. })
    ));
    assert_eq!(engine.set_phase(admin, PhaseIndex(1)).unwrap(), 500);
    assert!(matches!(
        engine.set_phase(admin, PhaseIndex(0)),
        Err(SaleError::InvalidPhaseTransition { from: 1, to: 0 })
    ));
    let purchase = engine.contribute(alice, 10).unwrap();
    assert_eq!(purchase.tokens, 5_000);
    assert_eq!(purchase.phase, PhaseIndex(1));
    assert_eq!(ledger.balance_of(alice), 11_000);

    clock.set(opening + Duration::days(30));
    assert!(matches!(
        engine.set_phase(admin, PhaseIndex(1)),
        Err(SaleError::WrongStage { operation: "set_phase", .. })
    ));
}

#[test]
fn admin_transfer_moves_every_privilege() {
    let h = Harness::new(CapConfig::default(), None);
    let next = Address::random();
    assert!(matches!(
        h.engine.transfer_admin(next, next),
        Err(SaleError::Unauthorized { .. })
    ));
    h.engine.transfer_admin(h.admin, next).unwrap();
    assert_eq!(h.engine.admin(), next);
    assert!(matches!(
        h.engine.add_to_allow_list(h.admin, &[Address::random()]),
        Err(SaleError::Unauthorized { .. })
    ));
    assert_eq!(h.engine.add_to_allow_list(next, &[Address::random()]).unwrap(), 1);
    assert!(matches!(
        h.engine.events()[0].event,
        SaleEvent::AdminTransferred { to, .. } if to == next
    ));
}

// =========================================================================
// Caps
// =========================================================================

#[test]
fn min_cap_boundary() {
    let min = ether(Decimal::new(1, 2)).unwrap();
    let h = Harness::new(
        CapConfig {
            cap: Some(eth(5_000)),
            goal: None,
            investor_min_cap: min,
            investor_hard_cap: Some(eth(250)),
        },
        None,
    );
    let alice = Address::random();
    h.admit(alice);
    h.open();

    let err = h.engine.contribute(alice, min - 10).unwrap_err();
    assert!(matches!(
        err,
        SaleError::CapViolation(CapViolationKind::BelowMinimumContribution { .. })
    ));
    assert_eq!(h.engine.raised(), 0);

    h.engine.contribute(alice, min).unwrap();
    assert_eq!(h.engine.user_contribution(alice), min);

    // the floor applies to the first contribution only
    h.engine.contribute(alice, 1).unwrap();
    assert_eq!(h.engine.user_contribution(alice), min + 1);
}

#[test]
fn investor_hard_cap_bounds_the_running_total() {
    let h = Harness::new(
        CapConfig {
            cap: Some(eth(5_000)),
            investor_hard_cap: Some(eth(250)),
            ..CapConfig::default()
        },
        None,
    );
    let alice = Address::random();
    h.admit(alice);
    h.open();

    h.engine.contribute(alice, eth(200)).unwrap();
    let err = h.engine.contribute(alice, eth(51)).unwrap_err();
    assert!(matches!(
        err,
        SaleError::CapViolation(CapViolationKind::AboveMaximumContribution { .. })
    ));
    h.engine.contribute(alice, eth(50)).unwrap();
    assert_eq!(h.engine.user_contribution(alice), eth(250));
}

#[test]
fn aggregate_cap_is_exact() {
    let h = Harness::new(
        CapConfig {
            cap: Some(eth(10)),
            ..CapConfig::default()
        },
        None,
    );
    let (alice, bob) = (Address::random(), Address::random());
    h.admit(alice);
    h.admit(bob);
    h.open();

    h.engine.contribute(alice, eth(6)).unwrap();
    assert!(matches!(
        h.engine.contribute(bob, eth(4) + 1),
        Err(SaleError::CapViolation(CapViolationKind::AggregateCapExceeded { .. }))
    ));
    h.engine.contribute(bob, eth(4)).unwrap();
    assert!(h.engine.cap_reached());
    assert_eq!(h.engine.raised(), eth(10));
}

// =========================================================================
// Resolution: goal missed
// =========================================================================

#[test]
fn goal_not_met_refunds_exactly_once() {
    let h = Harness::new(
        CapConfig {
            goal: Some(eth(20)),
            ..CapConfig::default()
        },
        None,
    );
    let investor = Address::random();
    h.admit(investor);
    h.open();

    let value = ether(Decimal::new(98_765, 5)).unwrap();
    h.engine.contribute(investor, value).unwrap();
    assert!(!h.engine.goal_reached());

    // refunds are unavailable before resolution
    assert!(matches!(
        h.engine.claim_refund(investor),
        Err(SaleError::RefundUnavailable { .. })
    ));
    assert!(matches!(
        h.engine.finalize(h.admin),
        Err(SaleError::SaleStillOpen { .. })
    ));

    h.close();
    let outcome = h.engine.finalize(h.admin).unwrap();
    assert!(!outcome.goal_reached);
    assert_eq!(outcome.stage, SaleStage::FinalizedFailure);
    assert_eq!(outcome.forwarded, 0);
    assert!(outcome.locks.is_empty());
    assert!(h.ledger.is_paused());
    assert_eq!(h.ledger.owner(), h.engine.sale_id().address());

    assert_eq!(h.engine.claim_refund(investor).unwrap(), value);
    assert_eq!(h.custody.paid_to(investor), value);
    assert_eq!(h.custody.balance(), 0);
    assert_eq!(h.engine.user_contribution(investor), 0);
    assert!(matches!(
        h.engine.claim_refund(investor),
        Err(SaleError::DuplicateClaim(who)) if who == investor
    ));
    assert_eq!(h.custody.paid_to(investor), value);

    // raised is history, not custody
    assert_eq!(h.engine.raised(), value);
    h.engine.check_conservation().unwrap();
}

#[test]
fn finalize_is_once_and_admin_only() {
    let h = Harness::new(CapConfig::default(), None);
    h.close();
    assert!(matches!(
        h.engine.finalize(Address::random()),
        Err(SaleError::Unauthorized { .. })
    ));
    // no goal: closing is success
    let outcome = h.engine.finalize(h.admin).unwrap();
    assert!(outcome.goal_reached);
    assert!(matches!(h.engine.finalize(h.admin), Err(SaleError::AlreadyFinalized)));
    assert!(h.engine.is_finalized());
    assert_eq!(h.engine.stage(), SaleStage::FinalizedSuccess);
}

// =========================================================================
// Resolution: goal met
// =========================================================================

#[test]
fn goal_met_distributes_and_vests() {
    let founders = Address::random();
    let goal = eth(20);
    let h = Harness::new(
        CapConfig {
            cap: Some(eth(5_000)),
            goal: Some(goal),
            investor_min_cap: ether(Decimal::new(1, 2)).unwrap(),
            investor_hard_cap: Some(eth(250)),
        },
        Some(zep_distribution(founders)),
    );
    let (alice, bob) = (Address::random(), Address::random());
    h.engine.add_to_allow_list(h.admin, &[alice, bob]).unwrap();
    h.open();

    let half = goal / 2 + eth(1);
    h.engine.contribute(alice, half).unwrap();
    h.engine.contribute(bob, half).unwrap();
    assert!(h.engine.goal_reached());

    h.close();
    let finalized_at = h.clock.now();
    let outcome = h.engine.finalize(h.admin).unwrap();
    assert!(outcome.goal_reached);
    assert_eq!(outcome.stage, SaleStage::FinalizedSuccess);
    assert_eq!(outcome.forwarded, 2 * half);
    assert_eq!(h.custody.paid_to(h.wallet), 2 * half);
    assert_eq!(h.custody.balance(), 0);

    // ledger handed to the wallet, tradeable and capped
    assert_eq!(h.ledger.owner(), h.wallet);
    assert!(!h.ledger.is_paused());
    assert!(h.ledger.minting_finished());

    let sold = 2 * half * RATE;
    let final_supply = outcome.final_total_supply.unwrap();
    assert_eq!(final_supply, sold * 100 / 70);
    let founders_lock = outcome
        .locks
        .iter()
        .find(|l| l.bucket == "founders")
        .unwrap()
        .clone();
    assert_eq!(founders_lock.amount, final_supply * 10 / 100);
    assert_eq!(h.ledger.balance_of(founders_lock.holder), founders_lock.amount);
    assert_eq!(h.ledger.total_supply(), sold + 3 * founders_lock.amount);
    assert_eq!(
        founders_lock.release_time,
        finalized_at + Duration::seconds(constants::DEFAULT_LOCK_DURATION_SECS as i64)
    );

    // refunds are for failed sales only
    assert!(matches!(
        h.engine.claim_refund(alice),
        Err(SaleError::RefundUnavailable { .. })
    ));

    h.clock.set(founders_lock.release_time - Duration::seconds(10));
    assert!(matches!(
        h.engine.release_lock(founders_lock.id),
        Err(SaleError::LockActive { .. })
    ));
    assert_eq!(h.ledger.balance_of(founders), 0);

    h.clock.set(founders_lock.release_time + Duration::seconds(10));
    assert_eq!(h.engine.release_lock(founders_lock.id).unwrap(), founders_lock.amount);
    assert_eq!(h.ledger.balance_of(founders), founders_lock.amount);
    assert_eq!(h.ledger.balance_of(founders_lock.holder), 0);
    assert!(matches!(
        h.engine.release_lock(founders_lock.id),
        Err(SaleError::AlreadyReleased(_))
    ));
    assert_eq!(
        h.engine.lock(founders_lock.id).unwrap().state,
        LockState::Released
    );
    assert!(matches!(
        h.engine.release_lock(LockId(99)),
        Err(SaleError::LockNotFound(_))
    ));
}

// =========================================================================
// Journal and snapshot
// =========================================================================

#[test]
fn journal_records_every_commit_in_order() {
    let h = Harness::new(CapConfig::default(), None);
    let alice = Address::random();
    h.admit(alice);
    h.open();
    h.engine.contribute(alice, eth(1)).unwrap();
    h.close();
    h.engine.finalize(h.admin).unwrap();

    let kinds: Vec<SaleEventKind> = h.engine.events().iter().map(|r| r.event.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            SaleEventKind::AllowListAdded,
            SaleEventKind::TokensPurchased,
            SaleEventKind::Finalized,
        ]
    );
    assert!(h.engine.events().iter().enumerate().all(|(i, r)| r.seq == i as u64));
    h.engine.verify_journal().unwrap();

    let snapshot = h.engine.snapshot();
    assert_eq!(snapshot.event_count, 3);
    assert_eq!(snapshot.goal_reached, Some(true));
    let json = snapshot.to_json().unwrap();
    let back: crowdsale_engine::SaleSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}
