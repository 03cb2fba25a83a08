//! # crowdsale-engine
//!
//! Orchestrates a token sale over the policy crates:
//!
//! - [`SaleEngine`]: the serialized sale state machine (contribute, admin
//!   operations, finalize, refunds, lock release)
//! - [`Journal`]: hash-chained log of committed events
//! - [`SaleSnapshot`]: serializable read model of the whole sale
//! - [`telemetry`]: `tracing` subscriber setup for embedding processes
//!
//! ## Lifecycle
//!
//! ```text
//! PENDING ──opening──▶ OPEN ──closing──▶ CLOSED_UNRESOLVED ──finalize──▶ FINALIZED_SUCCESS
//!                                                          └──────────▶ FINALIZED_FAILURE
//! ```
//!
//! Each operation either commits fully (state, journal record, collaborator
//! effects) or leaves the sale exactly as it was.

pub mod engine;
pub mod journal;
pub mod state;
pub mod telemetry;

pub use engine::{Collaborators, FinalizeOutcome, Purchase, SaleEngine};
pub use journal::Journal;
pub use state::{SaleSnapshot, SaleState};
pub use telemetry::{init_tracing, LogConfig, LogFormat};
