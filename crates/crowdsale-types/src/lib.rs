//! # crowdsale-types
//!
//! Shared types, errors, and configuration for the crowdsale engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Address`], [`SaleId`], [`LockId`], [`PhaseIndex`]
//! - **Amounts**: [`Amount`], [`Rate`] and ether/wei conversion in [`units`]
//! - **Lifecycle**: [`SaleStage`], [`FinalizeStep`]
//! - **Vesting**: [`VestedAllocation`], [`LockState`]
//! - **Audit trail**: [`SaleEvent`], [`EventRecord`]
//! - **Configuration**: [`SaleConfig`], [`PhaseConfig`], [`CapConfig`], [`DistributionConfig`], [`BucketConfig`], [`TokenMetadata`]
//! - **Collaborators**: [`TokenLedger`], [`ValueCustody`], [`Clock`]
//! - **Errors**: [`SaleError`] with `CS_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod ledger;
pub mod stage;
pub mod units;
pub mod vesting;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testkit;

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use ledger::*;
pub use stage::*;
pub use units::{Amount, Rate};
pub use vesting::*;

// Constants and unit conversion are accessed via their modules
// (`crowdsale_types::constants::FOO`, `crowdsale_types::units::ether`).
