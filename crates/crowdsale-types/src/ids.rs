//! Identifiers used throughout the crowdsale engine.
//!
//! Participants, wallets, token contracts and time-lock holders are all
//! addressed by an opaque 20-byte [`Address`]. Sale instances carry a
//! UUIDv7 [`SaleId`] for log correlation; vesting locks use a dense
//! [`LockId`] assigned at distribution time.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::SaleError;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Opaque address-like identity of an account on the host ledger.
///
/// Serialized as its `0x`-prefixed hex string, so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Address(pub [u8; 20]);

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Address {
    /// The zero address. Never a valid participant, wallet or admin.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Short hex prefix for compact log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Derive a deterministic address from a domain tag and a seed.
    ///
    /// Used for accounts owned by the engine itself (vesting locks), so
    /// that every replay of the same finalize produces the same holders.
    #[must_use]
    pub fn derive(domain: &[u8], seed: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"crowdsale:address:v1:");
        hasher.update(domain);
        hasher.update((seed.len() as u64).to_le_bytes());
        hasher.update(seed);
        let hash = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[..20]);
        Self(bytes)
    }

    /// A random address, for tests and simulations.
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random::<[u8; 20]>())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = SaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|e| SaleError::InvalidAddress {
            reason: format!("{s}: {e}"),
        })?;
        let bytes: [u8; 20] = raw.try_into().map_err(|_| SaleError::InvalidAddress {
            reason: format!("{s}: expected 20 bytes"),
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SaleId
// ---------------------------------------------------------------------------

/// Identifier of one sale engine instance. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SaleId(pub Uuid);

impl SaleId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The address under which this sale acts on collaborators
    /// (token minter, custody owner).
    #[must_use]
    pub fn address(&self) -> Address {
        Address::derive(b"sale", self.0.as_bytes())
    }
}

impl Default for SaleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sale:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LockId
// ---------------------------------------------------------------------------

/// Identifier of a vesting lock, dense per sale in bucket order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LockId(pub u32);

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PhaseIndex
// ---------------------------------------------------------------------------

/// 0-based index of a sale phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PhaseIndex(pub usize);

impl PhaseIndex {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for PhaseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
