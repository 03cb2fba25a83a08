//! Capability traits for the collaborators the engine consumes.
//!
//! The token ledger, the native value custody and the clock live outside
//! the engine. The engine only ever talks to them through these traits, so
//! any host (an on-chain adapter, a database-backed ledger, the in-memory
//! [`crate::testkit`] doubles) can be plugged in.
//!
//! Every method takes `&self`: implementations use interior mutability and
//! must be `Send + Sync` so one engine can be shared across threads.

use chrono::{DateTime, Utc};

use crate::{Address, Amount, Result, TokenMetadata};

/// The fungible-token ledger the sale mints into.
///
/// Calls that need authority take the `caller` explicitly; the ledger
/// rejects them with [`crate::SaleError::Ledger`] unless `caller` is the
/// current owner.
pub trait TokenLedger: Send + Sync {
    /// Identity of the token contract.
    fn address(&self) -> Address;

    fn metadata(&self) -> TokenMetadata;

    fn owner(&self) -> Address;

    /// Create `amount` new tokens for `to`. Allowed while paused.
    fn mint(&self, caller: Address, to: Address, amount: Amount) -> Result<()>;

    /// Permanently disable minting.
    fn finish_minting(&self, caller: Address) -> Result<()>;

    /// Move tokens between accounts. Rejected while paused.
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<()>;

    fn balance_of(&self, who: Address) -> Amount;

    fn total_supply(&self) -> Amount;

    fn pause(&self, caller: Address) -> Result<()>;

    fn unpause(&self, caller: Address) -> Result<()>;

    fn is_paused(&self) -> bool;

    fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<()>;
}

/// Custody of the native value contributed to the sale.
pub trait ValueCustody: Send + Sync {
    /// Take `amount` from `from` into custody.
    fn deposit(&self, from: Address, amount: Amount) -> Result<()>;

    /// Pay `amount` out of custody back to `to`.
    fn refund(&self, to: Address, amount: Amount) -> Result<()>;

    /// Pay `amount` out of custody to the beneficiary `to`.
    fn forward(&self, to: Address, amount: Amount) -> Result<()>;

    /// Value currently held.
    fn balance(&self) -> Amount;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
