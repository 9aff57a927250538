//! Cache Statistics Module
//!
//! Tracks per-process cache activity next to the persisted ledger totals.

use serde::Serialize;

use crate::cache::ledger::Ledger;

// == Cache Stats ==
/// Session counters plus the ledger totals at the time of the snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Successful reads
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Entries written by `put`
    pub writes: u64,
    /// Entries removed by eviction passes
    pub evictions: u64,
    /// Eviction passes run
    pub eviction_passes: u64,
    /// Bytes reclaimed by eviction passes
    pub bytes_evicted: u64,
    /// Persisted total size in bytes
    pub total_size: u64,
    /// Persisted entry count
    pub total_entries: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    // == Record Eviction Pass ==
    /// Counts one eviction pass that removed `evicted` entries totalling `freed` bytes.
    pub fn record_eviction_pass(&mut self, evicted: u64, freed: u64) {
        self.eviction_passes += 1;
        self.evictions += evicted;
        self.bytes_evicted += freed;
    }

    /// Copies the ledger totals into the snapshot.
    pub fn set_ledger(&mut self, ledger: Ledger) {
        self.total_size = ledger.total_size;
        self.total_entries = ledger.total_entries;
    }
}
