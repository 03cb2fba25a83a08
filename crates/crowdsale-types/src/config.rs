//! Configuration types for a sale instance.
//!
//! A [`SaleConfig`] is everything the engine needs at construction. It is
//! serde-derived so deployments can keep it as a JSON document; amounts are
//! smallest units (wei / token base units).

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{constants, Address, Amount, Rate, Result, SaleError};

/// Name, symbol and decimals of the sold token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "Zep Token".to_string(),
            symbol: "ZEP".to_string(),
            decimals: constants::DEFAULT_TOKEN_DECIMALS,
        }
    }
}

/// One phase of the sale with its exchange rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Human-readable label, e.g. `pre-sale`.
    pub name: String,
    /// Tokens minted per smallest unit of contributed value.
    pub rate: Rate,
}

impl PhaseConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, rate: Rate) -> Self {
        Self {
            name: name.into(),
            rate,
        }
    }
}

/// Aggregate and per-participant contribution limits.
///
/// Every limit is optional: `None` means unbounded (or, for the goal,
/// that every sale that reaches its closing time succeeds).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapConfig {
    /// Maximum aggregate raise.
    #[serde(default)]
    pub cap: Option<Amount>,
    /// Minimum aggregate raise for success. Must not exceed `cap`.
    #[serde(default)]
    pub goal: Option<Amount>,
    /// Floor for a participant's first contribution.
    #[serde(default)]
    pub investor_min_cap: Amount,
    /// Ceiling for a participant's running total.
    #[serde(default)]
    pub investor_hard_cap: Option<Amount>,
}

impl CapConfig {
    /// Check the limits are mutually consistent.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for zero caps, `goal > cap` or
    /// `investor_min_cap > investor_hard_cap`.
    pub fn validate(&self) -> Result<()> {
        if self.cap == Some(0) {
            return Err(SaleError::InvalidConfig("cap must be positive".into()));
        }
        if self.goal == Some(0) {
            return Err(SaleError::InvalidConfig("goal must be positive".into()));
        }
        if let (Some(goal), Some(cap)) = (self.goal, self.cap) {
            if goal > cap {
                return Err(SaleError::InvalidConfig(format!(
                    "goal {goal} exceeds cap {cap}"
                )));
            }
        }
        if let Some(hard) = self.investor_hard_cap {
            if hard == 0 {
                return Err(SaleError::InvalidConfig(
                    "investor hard cap must be positive".into(),
                ));
            }
            if self.investor_min_cap > hard {
                return Err(SaleError::InvalidConfig(format!(
                    "investor min cap {} exceeds investor hard cap {hard}",
                    self.investor_min_cap
                )));
            }
        }
        Ok(())
    }
}

/// A reserved share of the final token supply, minted into a time-lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Unique label, e.g. `founders`.
    pub name: String,
    /// Who receives the tokens once the lock expires.
    pub beneficiary: Address,
    /// Share of the final total supply, in percent.
    pub percentage: u8,
    /// Overrides the plan-wide lock duration for this bucket.
    #[serde(default)]
    pub lock_duration: Option<Duration>,
}

impl BucketConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, beneficiary: Address, percentage: u8) -> Self {
        Self {
            name: name.into(),
            beneficiary,
            percentage,
            lock_duration: None,
        }
    }

    #[must_use]
    pub fn with_lock_duration(mut self, lock_duration: Duration) -> Self {
        self.lock_duration = Some(lock_duration);
        self
    }
}

/// Post-success distribution of reserved allocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Share of the final supply that was sold to participants.
    #[serde(default = "default_sale_percentage")]
    pub sale_percentage: u8,
    /// Reserved buckets; their shares plus `sale_percentage` sum to 100.
    pub buckets: Vec<BucketConfig>,
    /// Default lock duration, counted from the finalize time.
    #[serde(default = "default_lock_duration")]
    pub lock_duration: Duration,
}

fn default_sale_percentage() -> u8 {
    constants::DEFAULT_SALE_PERCENTAGE
}

fn default_lock_duration() -> Duration {
    Duration::from_secs(constants::DEFAULT_LOCK_DURATION_SECS)
}

impl DistributionConfig {
    /// Check shares, bucket count, beneficiaries and names.
    ///
    /// # Errors
    /// Returns `InvalidDistribution` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.sale_percentage == 0 {
            return Err(SaleError::InvalidDistribution {
                reason: "sale percentage must be positive".into(),
            });
        }
        if self.buckets.len() > constants::MAX_BUCKETS {
            return Err(SaleError::InvalidDistribution {
                reason: format!(
                    "{} buckets exceeds maximum {}",
                    self.buckets.len(),
                    constants::MAX_BUCKETS
                ),
            });
        }

        let mut names = HashSet::with_capacity(self.buckets.len());
        let mut total = u32::from(self.sale_percentage);
        for bucket in &self.buckets {
            if bucket.percentage == 0 {
                return Err(SaleError::InvalidDistribution {
                    reason: format!("bucket {} has a zero share", bucket.name),
                });
            }
            if bucket.beneficiary.is_zero() {
                return Err(SaleError::InvalidDistribution {
                    reason: format!("bucket {} has the zero beneficiary", bucket.name),
                });
            }
            if !names.insert(bucket.name.as_str()) {
                return Err(SaleError::InvalidDistribution {
                    reason: format!("duplicate bucket name {}", bucket.name),
                });
            }
            total += u32::from(bucket.percentage);
        }

        if u128::from(total) != constants::PERCENT_DENOMINATOR {
            return Err(SaleError::InvalidDistribution {
                reason: format!("shares sum to {total}, expected 100"),
            });
        }
        Ok(())
    }
}

/// Complete configuration of one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Initial holder of the admin role.
    pub admin: Address,
    /// Beneficiary wallet: receives funds and token ownership on success.
    pub wallet: Address,
    pub opening_time: DateTime<Utc>,
    pub closing_time: DateTime<Utc>,
    /// Phases in order; the sale starts in phase 0.
    pub phases: Vec<PhaseConfig>,
    #[serde(default)]
    pub caps: CapConfig,
    /// `None` disables post-success distribution and vesting.
    #[serde(default)]
    pub distribution: Option<DistributionConfig>,
    /// Identities admitted from construction.
    #[serde(default)]
    pub allow_list: Vec<Address>,
}

impl SaleConfig {
    /// A single-rate sale with no limits, distribution or pre-admitted identities.
    #[must_use]
    pub fn single_rate(
        admin: Address,
        wallet: Address,
        opening_time: DateTime<Utc>,
        closing_time: DateTime<Utc>,
        rate: Rate,
    ) -> Self {
        Self {
            admin,
            wallet,
            opening_time,
            closing_time,
            phases: vec![PhaseConfig::new("sale", rate)],
            caps: CapConfig::default(),
            distribution: None,
            allow_list: Vec::new(),
        }
    }

    /// Validate every field that does not depend on the clock.
    ///
    /// The opening-in-the-future rule needs the construction time and is
    /// checked when the engine builds its time window.
    ///
    /// # Errors
    /// Returns the first configuration error found.
    pub fn validate(&self) -> Result<()> {
        if self.admin.is_zero() {
            return Err(SaleError::InvalidAddress {
                reason: "admin is the zero address".into(),
            });
        }
        if self.wallet.is_zero() {
            return Err(SaleError::InvalidAddress {
                reason: "wallet is the zero address".into(),
            });
        }
        if self.opening_time >= self.closing_time {
            return Err(SaleError::InvalidSchedule {
                reason: format!(
                    "opening {} is not before closing {}",
                    self.opening_time, self.closing_time
                ),
            });
        }
        if self.phases.is_empty() {
            return Err(SaleError::InvalidConfig("at least one phase required".into()));
        }
        if self.phases.len() > constants::MAX_PHASES {
            return Err(SaleError::InvalidConfig(format!(
                "{} phases exceeds maximum {}",
                self.phases.len(),
                constants::MAX_PHASES
            )));
        }
        if let Some(phase) = self.phases.iter().find(|p| p.rate == 0) {
            return Err(SaleError::InvalidConfig(format!(
                "phase {} has a zero rate",
                phase.name
            )));
        }
        if self.allow_list.iter().any(Address::is_zero) {
            return Err(SaleError::InvalidAddress {
                reason: "allow-list contains the zero address".into(),
            });
        }
        self.caps.validate()?;
        if let Some(distribution) = &self.distribution {
            distribution.validate()?;
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, otherwise any [`Self::validate`] error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
