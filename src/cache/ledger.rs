//! Size Ledger Module
//!
//! Persisted aggregate counters for the entry population. The ledger record
//! is the only tally of size and count; it is read and rewritten around every
//! mutation under the store's write lock.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::backend::EntryBackend;
use crate::error::Result;

/// Record key holding the ledger. Contains no key separator, so it never
/// collides with an entry's composite key.
pub const LEDGER_KEY: &str = "__ledger__";

// == Ledger ==
/// Totals summarizing every stored entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    /// Sum of the size contributions of stored entries, in bytes
    pub total_size: u64,
    /// Number of stored entries
    pub total_entries: u64,
}

impl Ledger {
    /// Returns the ledger shifted by signed deltas, floored at zero.
    pub fn with_delta(self, delta_size: i64, delta_entries: i64) -> Self {
        let total_size = shift(self.total_size, delta_size);
        let total_entries = shift(self.total_entries, delta_entries);

        if total_size.is_none() || total_entries.is_none() {
            warn!(
                "Ledger underflow: size {} {:+}, entries {} {:+}; clamping to zero",
                self.total_size, delta_size, self.total_entries, delta_entries
            );
        }

        Self {
            total_size: total_size.unwrap_or(0),
            total_entries: total_entries.unwrap_or(0),
        }
    }
}

fn shift(value: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        Some(value.saturating_add(delta as u64))
    } else {
        value.checked_sub(delta.unsigned_abs())
    }
}

// == Size Ledger ==
/// Loads and updates the persisted ledger record.
pub struct SizeLedger;

impl SizeLedger {
    /// Reads the ledger, or a zero ledger if none has been written yet.
    pub fn load<B: EntryBackend + ?Sized>(backend: &B) -> Result<Ledger> {
        match backend.read(LEDGER_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Ledger::default()),
        }
    }

    /// Adds signed deltas to the persisted ledger and returns the result.
    pub fn apply<B: EntryBackend + ?Sized>(
        backend: &mut B,
        delta_size: i64,
        delta_entries: i64,
    ) -> Result<Ledger> {
        let ledger = Self::load(backend)?.with_delta(delta_size, delta_entries);
        Self::store(backend, ledger)?;
        Ok(ledger)
    }

    /// Overwrites the persisted ledger.
    pub fn store<B: EntryBackend + ?Sized>(backend: &mut B, ledger: Ledger) -> Result<()> {
        backend.write(LEDGER_KEY, &serde_json::to_string(&ledger)?)
    }

    /// Deletes the ledger record.
    pub fn reset<B: EntryBackend + ?Sized>(backend: &mut B) -> Result<()> {
        backend.delete(LEDGER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::MemoryBackend;
    use crate::error::CacheError;

    #[test]
    fn test_load_absent_is_zero() {
        let backend = MemoryBackend::new();
        assert_eq!(SizeLedger::load(&backend).unwrap(), Ledger::default());
    }

    #[test]
    fn test_apply_persists() {
        let mut backend = MemoryBackend::new();
        SizeLedger::apply(&mut backend, 40, 1).unwrap();
        let ledger = SizeLedger::apply(&mut backend, 25, 1).unwrap();

        assert_eq!(ledger.total_size, 65);
        assert_eq!(ledger.total_entries, 2);
        assert_eq!(SizeLedger::load(&backend).unwrap(), ledger);

        let raw = backend.read(LEDGER_KEY).unwrap().unwrap();
        assert!(raw.contains("\"totalSize\":65"));
        assert!(raw.contains("\"totalEntries\":2"));
    }

    #[test]
    fn test_apply_negative() {
        let mut backend = MemoryBackend::new();
        SizeLedger::apply(&mut backend, 100, 3).unwrap();
        let ledger = SizeLedger::apply(&mut backend, -60, -2).unwrap();

        assert_eq!(ledger.total_size, 40);
        assert_eq!(ledger.total_entries, 1);
    }

    #[test]
    fn test_underflow_clamps_to_zero() {
        let ledger = Ledger {
            total_size: 10,
            total_entries: 1,
        }
        .with_delta(-20, -2);

        assert_eq!(ledger, Ledger::default());
    }

    #[test]
    fn test_reset() {
        let mut backend = MemoryBackend::new();
        SizeLedger::apply(&mut backend, 5, 1).unwrap();
        SizeLedger::reset(&mut backend).unwrap();

        assert!(backend.is_empty());
        assert_eq!(SizeLedger::load(&backend).unwrap(), Ledger::default());
    }

    #[test]
    fn test_corrupt_ledger_is_storage_error() {
        let mut backend = MemoryBackend::new();
        backend.write(LEDGER_KEY, "garbage").unwrap();

        let result = SizeLedger::load(&backend);
        assert!(matches!(result, Err(CacheError::StorageUnavailable(_))));
    }
}
