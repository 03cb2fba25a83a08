//! # crowdsale-settlement
//!
//! **Finality Plane**: custody accounting, sale resolution, refunds and
//! reserved-token vesting.
//!
//! ## Architecture
//!
//! 1. **Escrow**: records every contribution, forwards on success, refunds on failure
//! 2. **Conservation**: `Σ deposited == Σ forwarded + Σ refunded + custodied`
//! 3. **ClaimGuard**: each refund is paid at most once
//! 4. **DistributionPlan**: splits the final supply into reserved buckets
//! 5. **TokenTimelock**: holds one bucket until its release time
//!
//! ## Resolution
//!
//! ```text
//! goal reached → Escrow.close(wallet) → DistributionPlan.plan_locks() → mint_locks()
//! goal missed  → Escrow.enable_refunds() → Escrow.claim_refund(p) ...
//! ```

pub mod claim_guard;
pub mod conservation;
pub mod distributor;
pub mod escrow;
pub mod timelock;

pub use claim_guard::ClaimGuard;
pub use conservation::Conservation;
pub use distributor::{Allocation, DistributionPlan};
pub use escrow::{Escrow, EscrowState};
pub use timelock::TokenTimelock;
