//! Hit Report Module
//!
//! Serializable per-entry usage summary of a cache store.

use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::cache::Ledger;

/// Usage of one stored entry.
#[derive(Debug, Clone, Serialize)]
pub struct HitReportRow {
    /// Composite key the entry is stored under
    pub key: String,
    pub hits: u64,
    /// Size contribution in bytes
    pub size: u64,
    /// Last write or read (Unix milliseconds)
    pub last_access_ms: u64,
    /// Last write or read in RFC 3339
    pub last_access: String,
}

impl HitReportRow {
    pub fn new(key: impl Into<String>, hits: u64, size: u64, last_access_ms: u64) -> Self {
        Self {
            key: key.into(),
            hits,
            size,
            last_access_ms,
            last_access: to_rfc3339(last_access_ms),
        }
    }
}

/// Entries ranked by hits, most used first, with the ledger totals.
#[derive(Debug, Clone, Serialize)]
pub struct HitReport {
    /// Report creation time in RFC 3339
    pub generated_at: String,
    pub total_size: u64,
    pub total_entries: u64,
    pub entries: Vec<HitReportRow>,
}

impl HitReport {
    /// Builds a report, ordering rows by hits descending then key.
    pub fn new(ledger: Ledger, mut entries: Vec<HitReportRow>) -> Self {
        entries.sort_by(|a, b| b.hits.cmp(&a.hits).then_with(|| a.key.cmp(&b.key)));
        Self {
            generated_at: Utc::now().to_rfc3339(),
            total_size: ledger.total_size,
            total_entries: ledger.total_entries,
            entries,
        }
    }

    /// Sum of hits over every entry.
    pub fn total_hits(&self) -> u64 {
        self.entries.iter().map(|row| row.hits).sum()
    }
}

fn to_rfc3339(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}
