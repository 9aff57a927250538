//! Cache Entry Module
//!
//! Defines the persisted record for one cached computation result.

use serde::{Deserialize, Serialize};

use crate::cache::KEY_SEPARATOR;

// == Cache Entry ==
/// A single cached result with its access metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The stored computation result
    pub payload: String,
    /// Successful reads since the entry was written
    pub hits: u64,
    /// Last write or read (Unix milliseconds)
    pub last_access: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a fresh entry stamped with `now`.
    pub fn new(payload: String, now: u64) -> Self {
        Self {
            payload,
            hits: 0,
            last_access: now,
        }
    }

    // == Record Hit ==
    /// Counts a successful read at `now`.
    pub fn record_hit(&mut self, now: u64) {
        self.hits += 1;
        self.last_access = now;
    }

    /// Size this entry contributes to the ledger when stored under `composite_key`.
    pub fn size_under(&self, composite_key: &str) -> u64 {
        size_contribution(composite_key, &self.payload)
    }

    pub(crate) fn decode(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub(crate) fn encode(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// == Utility Functions ==
/// Joins a namespace and a caller key into the key an entry is stored under.
pub fn composite_key(namespace: &str, key: &str) -> String {
    let mut out = String::with_capacity(namespace.len() + 1 + key.len());
    out.push_str(namespace);
    out.push(KEY_SEPARATOR);
    out.push_str(key);
    out
}

/// Ledger cost of one entry: UTF-8 bytes of the composite key plus the payload.
pub fn size_contribution(composite_key: &str, payload: &str) -> u64 {
    (composite_key.len() + payload.len()) as u64
}
