//! Append-only, hash-chained journal of committed sale events.
//!
//! ```text
//! hash_n = SHA-256("crowdsale:event:v1:" || hash_{n-1} || seq || timestamp || json(event))
//! ```
//!
//! The sequence number is the commit order: two records never share a
//! `seq`, and a contribution journaled before a phase change was applied
//! before it.

use chrono::{DateTime, Utc};
use crowdsale_types::{EventRecord, Result, SaleError, SaleEvent};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    records: Vec<EventRecord>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its record.
    ///
    /// # Errors
    /// `Serialization` if the event cannot be encoded.
    pub fn append(&mut self, event: SaleEvent, recorded_at: DateTime<Utc>) -> Result<&EventRecord> {
        let seq = self.records.len() as u64;
        let prev_hash = self.head_hash();
        let hash = record_hash(&prev_hash, seq, recorded_at, &event)?;
        self.records.push(EventRecord {
            seq,
            recorded_at,
            event,
            prev_hash,
            hash,
        });
        self.records
            .last()
            .ok_or_else(|| SaleError::Internal("journal append lost its record".into()))
    }

    /// Drop every record from `len` on. Only used to back out records of
    /// an operation that did not complete under the same write lock.
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// Hash of the latest record, all zeros when empty.
    #[must_use]
    pub fn head_hash(&self) -> [u8; 32] {
        self.records.last().map_or([0u8; 32], |r| r.hash)
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute every hash and check the links.
    ///
    /// # Errors
    /// `Internal` naming the first broken record.
    pub fn verify_chain(&self) -> Result<()> {
        let mut prev = [0u8; 32];
        for (i, record) in self.records.iter().enumerate() {
            if record.seq != i as u64 || record.prev_hash != prev {
                return Err(SaleError::Internal(format!(
                    "journal link broken at seq {}",
                    record.seq
                )));
            }
            let expected = record_hash(&prev, record.seq, record.recorded_at, &record.event)?;
            if expected != record.hash {
                return Err(SaleError::Internal(format!(
                    "journal hash mismatch at seq {}",
                    record.seq
                )));
            }
            prev = record.hash;
        }
        Ok(())
    }
}

fn record_hash(
    prev_hash: &[u8; 32],
    seq: u64,
    recorded_at: DateTime<Utc>,
    event: &SaleEvent,
) -> Result<[u8; 32]> {
    let body = serde_json::to_vec(event)?;
    let mut hasher = Sha256::new();
    hasher.update(b"crowdsale:event:v1:");
    hasher.update(prev_hash);
    hasher.update(seq.to_le_bytes());
    hasher.update(recorded_at.timestamp().to_le_bytes());
    hasher.update(recorded_at.timestamp_subsec_nanos().to_le_bytes());
    hasher.update(&body);
    Ok(hasher.finalize().into())
}
