//! Token time-lock: holds one reserved allocation until its release time.

use chrono::{DateTime, Utc};
use crowdsale_types::{Address, Amount, LockId, LockState, Result, TokenLedger, VestedAllocation};
use serde::{Deserialize, Serialize};

/// A minted allocation parked at an engine-owned lock address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenTimelock {
    allocation: VestedAllocation,
}

impl TokenTimelock {
    #[must_use]
    pub fn new(allocation: VestedAllocation) -> Self {
        Self { allocation }
    }

    /// Pay the full locked amount to the beneficiary.
    ///
    /// The ledger transfer happens first; the lock is marked released only
    /// once the tokens have moved.
    ///
    /// # Errors
    /// - `LockActive` before the release time
    /// - `AlreadyReleased` on a repeat call
    /// - any ledger error from the transfer (the lock stays LOCKED)
    pub fn release(&mut self, ledger: &dyn TokenLedger, now: DateTime<Utc>) -> Result<Amount> {
        self.allocation.ensure_releasable(now)?;
        ledger.transfer(
            self.allocation.holder,
            self.allocation.beneficiary,
            self.allocation.amount,
        )?;
        self.allocation.mark_released(now)?;
        tracing::info!(
            lock = %self.allocation.id,
            bucket = %self.allocation.bucket,
            beneficiary = %self.allocation.beneficiary,
            amount = self.allocation.amount,
            "Time-lock released"
        );
        Ok(self.allocation.amount)
    }

    #[must_use]
    pub fn allocation(&self) -> &VestedAllocation {
        &self.allocation
    }

    #[must_use]
    pub fn id(&self) -> LockId {
        self.allocation.id
    }

    #[must_use]
    pub fn holder(&self) -> Address {
        self.allocation.holder
    }

    #[must_use]
    pub fn beneficiary(&self) -> Address {
        self.allocation.beneficiary
    }

    #[must_use]
    pub fn amount(&self) -> Amount {
        self.allocation.amount
    }

    #[must_use]
    pub fn release_time(&self) -> DateTime<Utc> {
        self.allocation.release_time
    }

    #[must_use]
    pub fn state(&self) -> LockState {
        self.allocation.state
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use crowdsale_types::testkit::InMemoryTokenLedger;
    use crowdsale_types::{SaleError, TokenMetadata};

    use super::*;

    fn setup(now: DateTime<Utc>) -> (InMemoryTokenLedger, TokenTimelock) {
        let minter = Address::random();
        let ledger = InMemoryTokenLedger::new(minter, TokenMetadata::default());
        let holder = Address::derive(b"timelock", b"founders");
        ledger.mint(minter, holder, 1_000).unwrap();
        let lock = TokenTimelock::new(VestedAllocation::new(
            LockId(0),
            "founders",
            holder,
            Address::random(),
            1_000,
            now + Duration::days(365),
        ));
        (ledger, lock)
    }

    #[test]
    fn early_release_fails_and_moves_nothing() {
        let now = Utc::now();
        let (ledger, mut lock) = setup(now);
        let err = lock.release(&ledger, now).unwrap_err();
        assert!(matches!(err, SaleError::LockActive { .. }));
        assert_eq!(ledger.balance_of(lock.beneficiary()), 0);
        assert_eq!(ledger.balance_of(lock.holder()), 1_000);
    }

    #[test]
    fn release_pays_beneficiary_once() {
        let now = Utc::now();
        let (ledger, mut lock) = setup(now);
        let later = lock.release_time() + Duration::seconds(10);

        assert_eq!(lock.release(&ledger, later).unwrap(), 1_000);
        assert_eq!(ledger.balance_of(lock.beneficiary()), 1_000);
        assert_eq!(ledger.balance_of(lock.holder()), 0);
        assert_eq!(lock.state(), LockState::Released);

        let err = lock.release(&ledger, later).unwrap_err();
        assert_eq!(err, SaleError::AlreadyReleased(LockId(0)));
    }

    #[test]
    fn ledger_failure_keeps_lock_locked() {
        let now = Utc::now();
        let (ledger, mut lock) = setup(now);
        let owner = ledger.owner();
        ledger.pause(owner).unwrap();

        let err = lock.release(&ledger, lock.release_time()).unwrap_err();
        assert!(matches!(err, SaleError::Ledger { .. }));
        assert_eq!(lock.state(), LockState::Locked);

        ledger.unpause(owner).unwrap();
        assert!(lock.release(&ledger, lock.release_time()).is_ok());
    }
}
