//! In-memory collaborators for tests and simulations. **Never use in production.**
//!
//! Each double keeps its state behind a `parking_lot::Mutex` and can be
//! told to fail specific calls, so tests can drive the engine's
//! compensation paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::{Address, Amount, Clock, Result, SaleError, TokenLedger, TokenMetadata, ValueCustody};

// ---------------------------------------------------------------------------
// Token ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TokenBook {
    owner: Address,
    paused: bool,
    minting_finished: bool,
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

/// A mintable, pausable, ownable token kept in memory.
#[derive(Debug)]
pub struct InMemoryTokenLedger {
    address: Address,
    metadata: TokenMetadata,
    book: Mutex<TokenBook>,
    fail_mint: AtomicBool,
    fail_ownership_transfer: AtomicBool,
}

impl InMemoryTokenLedger {
    /// A fresh, unpaused token owned by `owner`.
    #[must_use]
    pub fn new(owner: Address, metadata: TokenMetadata) -> Self {
        Self {
            address: Address::random(),
            metadata,
            book: Mutex::new(TokenBook {
                owner,
                ..TokenBook::default()
            }),
            fail_mint: AtomicBool::new(false),
            fail_ownership_transfer: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `mint` fail until reset.
    pub fn set_fail_mint(&self, fail: bool) {
        self.fail_mint.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `transfer_ownership` fail until reset.
    pub fn set_fail_ownership_transfer(&self, fail: bool) {
        self.fail_ownership_transfer.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn minting_finished(&self) -> bool {
        self.book.lock().minting_finished
    }

    fn ensure_owner(book: &TokenBook, caller: Address) -> Result<()> {
        if book.owner != caller {
            return Err(SaleError::Ledger {
                reason: format!("{caller} is not the token owner"),
            });
        }
        Ok(())
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn address(&self) -> Address {
        self.address
    }

    fn metadata(&self) -> TokenMetadata {
        self.metadata.clone()
    }

    fn owner(&self) -> Address {
        self.book.lock().owner
    }

    fn mint(&self, caller: Address, to: Address, amount: Amount) -> Result<()> {
        let mut book = self.book.lock();
        Self::ensure_owner(&book, caller)?;
        if book.minting_finished {
            return Err(SaleError::Ledger {
                reason: "minting finished".into(),
            });
        }
        if self.fail_mint.load(Ordering::SeqCst) {
            return Err(SaleError::Ledger {
                reason: "mint rejected".into(),
            });
        }
        let supply = book
            .total_supply
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow("mint"))?;
        book.total_supply = supply;
        *book.balances.entry(to).or_default() += amount;
        Ok(())
    }

    fn finish_minting(&self, caller: Address) -> Result<()> {
        let mut book = self.book.lock();
        Self::ensure_owner(&book, caller)?;
        if book.minting_finished {
            return Err(SaleError::Ledger {
                reason: "minting already finished".into(),
            });
        }
        book.minting_finished = true;
        Ok(())
    }

    fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let mut book = self.book.lock();
        if book.paused {
            return Err(SaleError::Ledger {
                reason: "token is paused".into(),
            });
        }
        let available = book.balances.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(SaleError::Ledger {
                reason: format!("insufficient balance: {available} < {amount}"),
            });
        }
        book.balances.insert(from, available - amount);
        *book.balances.entry(to).or_default() += amount;
        Ok(())
    }

    fn balance_of(&self, who: Address) -> Amount {
        self.book.lock().balances.get(&who).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.book.lock().total_supply
    }

    fn pause(&self, caller: Address) -> Result<()> {
        let mut book = self.book.lock();
        Self::ensure_owner(&book, caller)?;
        if book.paused {
            return Err(SaleError::Ledger {
                reason: "already paused".into(),
            });
        }
        book.paused = true;
        Ok(())
    }

    fn unpause(&self, caller: Address) -> Result<()> {
        let mut book = self.book.lock();
        Self::ensure_owner(&book, caller)?;
        if !book.paused {
            return Err(SaleError::Ledger {
                reason: "not paused".into(),
            });
        }
        book.paused = false;
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.book.lock().paused
    }

    fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<()> {
        let mut book = self.book.lock();
        Self::ensure_owner(&book, caller)?;
        if new_owner.is_zero() {
            return Err(SaleError::Ledger {
                reason: "new owner is the zero address".into(),
            });
        }
        if self.fail_ownership_transfer.load(Ordering::SeqCst) {
            return Err(SaleError::Ledger {
                reason: "ownership transfer rejected".into(),
            });
        }
        book.owner = new_owner;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Value custody
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CustodyBook {
    balance: Amount,
    paid_out: HashMap<Address, Amount>,
}

/// Native value custody kept in memory. Tracks what every address was paid.
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    book: Mutex<CustodyBook>,
    fail_deposit: AtomicBool,
    fail_refund: AtomicBool,
    fail_forward: AtomicBool,
}

impl InMemoryCustody {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total ever refunded or forwarded to `who`.
    #[must_use]
    pub fn paid_to(&self, who: Address) -> Amount {
        self.book.lock().paid_out.get(&who).copied().unwrap_or(0)
    }

    pub fn set_fail_deposit(&self, fail: bool) {
        self.fail_deposit.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_refund(&self, fail: bool) {
        self.fail_refund.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_forward(&self, fail: bool) {
        self.fail_forward.store(fail, Ordering::SeqCst);
    }

    fn pay_out(&self, to: Address, amount: Amount) -> Result<()> {
        let mut book = self.book.lock();
        if book.balance < amount {
            return Err(SaleError::Custody {
                reason: format!("custody holds {} < {amount}", book.balance),
            });
        }
        book.balance -= amount;
        *book.paid_out.entry(to).or_default() += amount;
        Ok(())
    }
}

impl ValueCustody for InMemoryCustody {
    fn deposit(&self, _from: Address, amount: Amount) -> Result<()> {
        if self.fail_deposit.load(Ordering::SeqCst) {
            return Err(SaleError::Custody {
                reason: "deposit rejected".into(),
            });
        }
        let mut book = self.book.lock();
        book.balance = book
            .balance
            .checked_add(amount)
            .ok_or(SaleError::ArithmeticOverflow("deposit"))?;
        Ok(())
    }

    fn refund(&self, to: Address, amount: Amount) -> Result<()> {
        if self.fail_refund.load(Ordering::SeqCst) {
            return Err(SaleError::Custody {
                reason: "refund rejected".into(),
            });
        }
        self.pay_out(to, amount)
    }

    fn forward(&self, to: Address, amount: Amount) -> Result<()> {
        if self.fail_forward.load(Ordering::SeqCst) {
            return Err(SaleError::Custody {
                reason: "forward rejected".into(),
            });
        }
        self.pay_out(to, amount)
    }

    fn balance(&self) -> Amount {
        self.book.lock().balance
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
