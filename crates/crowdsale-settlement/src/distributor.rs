//! Distributor: post-success split of the final token supply.
//!
//! Participants bought `sale_percentage` of the final supply. The rest is
//! split across reserved buckets, each minted into its own time-lock:
//!
//! ```text
//! final_supply = already_minted * 100 / sale_percentage
//! bucket_i     = final_supply * percentage_i / 100        (truncating)
//! ```
//!
//! Truncation is accepted: the remainder is never redistributed, so the
//! reserved total may fall short of its exact share by fewer than
//! `bucket_count` smallest units ([`DistributionPlan::rounding_loss`]).

use std::time::Duration;

use chrono::{DateTime, Utc};
use crowdsale_types::units::mul_div;
use crowdsale_types::{
    constants, Address, Amount, BucketConfig, DistributionConfig, LockId, Result, SaleError,
    TokenLedger, VestedAllocation,
};

use crate::TokenTimelock;

/// One bucket's computed share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub bucket: String,
    pub beneficiary: Address,
    pub percentage: u8,
    pub amount: Amount,
    pub lock_duration: Duration,
}

/// A validated distribution plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionPlan {
    config: DistributionConfig,
}

impl DistributionPlan {
    /// Validate once at construction; a bad plan never reaches finalize.
    ///
    /// # Errors
    /// `InvalidDistribution` if shares don't sum to 100, there are too many
    /// buckets, a beneficiary is zero or a name repeats.
    pub fn new(
        sale_percentage: u8,
        buckets: Vec<BucketConfig>,
        lock_duration: Duration,
    ) -> Result<Self> {
        Self::from_config(DistributionConfig {
            sale_percentage,
            buckets,
            lock_duration,
        })
    }

    /// # Errors
    /// See [`Self::new`].
    pub fn from_config(config: DistributionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn sale_percentage(&self) -> u8 {
        self.config.sale_percentage
    }

    #[must_use]
    pub fn buckets(&self) -> &[BucketConfig] {
        &self.config.buckets
    }

    /// Percentage of the final supply reserved for buckets.
    #[must_use]
    pub fn reserved_percentage(&self) -> u8 {
        self.config.buckets.iter().map(|b| b.percentage).sum()
    }

    /// Final supply implied by what participants bought.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the supply does not fit.
    pub fn final_total_supply(&self, already_minted: Amount) -> Result<Amount> {
        mul_div(
            already_minted,
            constants::PERCENT_DENOMINATOR,
            Amount::from(self.config.sale_percentage),
            "distribution.final_supply",
        )
    }

    /// Each bucket's share of `final_supply`, in bucket order.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if a share does not fit.
    pub fn allocate(&self, final_supply: Amount) -> Result<Vec<Allocation>> {
        self.config
            .buckets
            .iter()
            .map(|bucket| {
                let amount = mul_div(
                    final_supply,
                    Amount::from(bucket.percentage),
                    constants::PERCENT_DENOMINATOR,
                    "distribution.bucket",
                )?;
                Ok(Allocation {
                    bucket: bucket.name.clone(),
                    beneficiary: bucket.beneficiary,
                    percentage: bucket.percentage,
                    amount,
                    lock_duration: bucket.lock_duration.unwrap_or(self.config.lock_duration),
                })
            })
            .collect()
    }

    /// Units lost to truncation: the exact reserved share minus what the
    /// buckets actually receive.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if a share does not fit.
    pub fn rounding_loss(&self, final_supply: Amount) -> Result<Amount> {
        let reserved = mul_div(
            final_supply,
            Amount::from(self.reserved_percentage()),
            constants::PERCENT_DENOMINATOR,
            "distribution.reserved",
        )?;
        let allocated: Amount = self.allocate(final_supply)?.iter().map(|a| a.amount).sum();
        Ok(reserved.saturating_sub(allocated))
    }

    /// Deterministic ledger account holding a bucket's locked tokens.
    #[must_use]
    pub fn lock_address(minter: Address, bucket: &str) -> Address {
        let mut seed = Vec::with_capacity(20 + bucket.len());
        seed.extend_from_slice(minter.as_bytes());
        seed.extend_from_slice(bucket.as_bytes());
        Address::derive(constants::LOCK_ADDRESS_DOMAIN, &seed)
    }

    /// Compute every time-lock for `final_supply` without touching the ledger.
    ///
    /// Zero-amount buckets still get a (trivially releasable) lock so lock
    /// ids stay aligned with bucket order.
    ///
    /// # Errors
    /// `ArithmeticOverflow` / `InvalidDistribution` from the computation.
    pub fn plan_locks(
        &self,
        minter: Address,
        final_supply: Amount,
        finalize_time: DateTime<Utc>,
    ) -> Result<Vec<TokenTimelock>> {
        self.allocate(final_supply)?
            .into_iter()
            .enumerate()
            .map(|(i, alloc)| {
                let id = LockId(u32::try_from(i).map_err(|_| {
                    SaleError::InvalidDistribution {
                        reason: "too many buckets".into(),
                    }
                })?);
                let release_time = release_time(finalize_time, alloc.lock_duration)?;
                Ok(TokenTimelock::new(VestedAllocation::new(
                    id,
                    alloc.bucket.as_str(),
                    Self::lock_address(minter, &alloc.bucket),
                    alloc.beneficiary,
                    alloc.amount,
                    release_time,
                )))
            })
            .collect()
    }

    /// Mint each planned lock's amount to its holder account.
    ///
    /// # Errors
    /// The first ledger error; earlier mints are not undone.
    pub fn mint_locks(
        &self,
        ledger: &dyn TokenLedger,
        minter: Address,
        locks: &[TokenTimelock],
    ) -> Result<()> {
        for lock in locks {
            if lock.amount() > 0 {
                ledger.mint(minter, lock.holder(), lock.amount())?;
            }
            tracing::info!(
                lock = %lock.id(),
                bucket = %lock.allocation().bucket,
                beneficiary = %lock.beneficiary(),
                amount = lock.amount(),
                release_time = %lock.release_time(),
                "Reserved allocation locked"
            );
        }
        Ok(())
    }

    /// Plan and mint in one step.
    ///
    /// # Errors
    /// See [`Self::plan_locks`] and [`Self::mint_locks`].
    pub fn distribute(
        &self,
        ledger: &dyn TokenLedger,
        minter: Address,
        final_supply: Amount,
        finalize_time: DateTime<Utc>,
    ) -> Result<Vec<TokenTimelock>> {
        let locks = self.plan_locks(minter, final_supply, finalize_time)?;
        self.mint_locks(ledger, minter, &locks)?;
        Ok(locks)
    }
}

fn release_time(finalize_time: DateTime<Utc>, lock_duration: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(lock_duration)
        .ok()
        .and_then(|d| finalize_time.checked_add_signed(d))
        .ok_or_else(|| SaleError::InvalidDistribution {
            reason: format!("lock duration {lock_duration:?} out of range"),
        })
}
