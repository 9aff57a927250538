//! Cache Store Module
//!
//! Public facade over an entry backend: size accounting through the
//! persisted ledger, LRU eviction under a size budget, and hit tracking.
//!
//! All mutations (`put`, the hit write-back in `get`, eviction, `clear`,
//! `reconcile`) hold the backend's write lock from ledger load to ledger
//! update, so no two of them ever observe a stale ledger.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::backend::EntryBackend;
use crate::cache::clock::{Clock, SystemClock};
use crate::cache::disk::DiskBackend;
use crate::cache::entry::{composite_key, size_contribution, CacheEntry};
use crate::cache::ledger::{Ledger, SizeLedger, LEDGER_KEY};
use crate::cache::lru::{self, EvictionCandidate};
use crate::cache::stats::CacheStats;
use crate::config::{CacheLimits, Config};
use crate::error::Result;
use crate::report::{HitReport, HitReportRow};

// == Eviction Outcome ==
/// What one eviction pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionOutcome {
    /// Entries deleted
    pub evicted: u64,
    /// Bytes reclaimed
    pub freed: u64,
}

// == Cache Store ==
/// Size-bounded persistent cache keyed by `(namespace, key)`.
pub struct CacheStore<B: EntryBackend = DiskBackend> {
    /// Persistence medium, also the lock serializing mutations
    backend: RwLock<B>,
    /// Size budget and eviction bounds
    limits: CacheLimits,
    /// Source of access stamps
    clock: Arc<dyn Clock>,
    /// Session counters
    stats: Mutex<CacheStats>,
}

impl CacheStore<DiskBackend> {
    // == Open ==
    /// Opens a disk-backed store in the configured storage location.
    ///
    /// Fails with a configuration error if no storage location is set.
    pub fn open(config: &Config) -> Result<Self> {
        let location = config.require_storage_location()?;
        let backend = DiskBackend::open(location)?;
        let limits = config.limits();

        info!(
            "Cache store opened at {}: max_cache_size={:?}, min_free={}, max_free={}",
            location.display(),
            limits.max_cache_size,
            limits.min_free_cache_size,
            limits.max_free_cache_size
        );

        Ok(Self::with_backend(backend, limits))
    }
}

impl<B: EntryBackend> CacheStore<B> {
    // == Constructor ==
    /// Creates a store over any backend.
    pub fn with_backend(backend: B, limits: CacheLimits) -> Self {
        Self {
            backend: RwLock::new(backend),
            limits,
            clock: Arc::new(SystemClock),
            stats: Mutex::new(CacheStats::new()),
        }
    }

    /// Replaces the time source used for access stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    /// Consumes the store and returns its backend.
    pub fn into_backend(self) -> B {
        self.backend.into_inner()
    }

    // == Put ==
    /// Stores `payload` under `(namespace, key)`, evicting first if the
    /// write would push the ledger past the size budget.
    ///
    /// Overwriting an existing entry resets its hit count and only accounts
    /// for the size difference. The entry being replaced is never an
    /// eviction candidate. If the write fails the ledger is left untouched.
    pub fn put(&self, namespace: &str, key: &str, payload: impl Into<String>) -> Result<()> {
        let payload = payload.into();
        let composite = composite_key(namespace, key);

        let mut backend = self.backend.write();
        backend.check_key(&composite)?;

        let new_size = size_contribution(&composite, &payload);
        let ledger = SizeLedger::load(&*backend)?;
        let previous = read_entry(&*backend, &composite)?;

        let (growth, delta_entries) = match &previous {
            Some(old) => (new_size as i64 - old.size_under(&composite) as i64, 0),
            None => (new_size as i64, 1),
        };
        let projected = ledger.total_size.saturating_add_signed(growth);

        if self.limits.exceeds(projected) {
            let target = self.limits.reclaim_target(growth.max(0) as u64);
            debug!(
                "Put {} projects {} bytes, reclaiming {} bytes",
                composite, projected, target
            );
            self.evict_locked(&mut *backend, target, Some(&composite))?;
        }

        let entry = CacheEntry::new(payload, self.clock.now_ms());
        backend.write(&composite, &entry.encode()?)?;
        let ledger = SizeLedger::apply(&mut *backend, growth, delta_entries)?;

        self.stats.lock().record_write();
        debug!(
            "Stored {} ({} bytes), ledger now {} bytes / {} entries",
            composite, new_size, ledger.total_size, ledger.total_entries
        );

        Ok(())
    }

    // == Get ==
    /// Retrieves the entry under `(namespace, key)`, counting a hit.
    ///
    /// On a hit the incremented hit count and access stamp are written back
    /// before the entry is returned. A miss has no side effects and is not an
    /// error. Never evicts.
    pub fn get(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>> {
        let composite = composite_key(namespace, key);

        let mut backend = self.backend.write();
        if backend.check_key(&composite).is_err() {
            self.stats.lock().record_miss();
            return Ok(None);
        }

        match read_entry(&*backend, &composite)? {
            Some(mut entry) => {
                entry.record_hit(self.clock.now_ms());
                backend.write(&composite, &entry.encode()?)?;
                self.stats.lock().record_hit();
                debug!("Cache hit {} (hits={})", composite, entry.hits);
                Ok(Some(entry))
            }
            None => {
                self.stats.lock().record_miss();
                debug!("Cache miss {}", composite);
                Ok(None)
            }
        }
    }

    // == Peek ==
    /// Looks up an entry without recording a hit.
    pub fn peek(&self, namespace: &str, key: &str) -> Result<Option<CacheEntry>> {
        let composite = composite_key(namespace, key);
        let backend = self.backend.read();
        if backend.check_key(&composite).is_err() {
            return Ok(None);
        }
        read_entry(&*backend, &composite)
    }

    // == Evict ==
    /// Runs an eviction pass reclaiming at least `target` bytes if possible.
    pub fn evict(&self, target: u64) -> Result<EvictionOutcome> {
        let mut backend = self.backend.write();
        self.evict_locked(&mut *backend, target, None)
    }

    // == Clear ==
    /// Deletes every entry and the ledger. Returns the number of entries removed.
    pub fn clear(&self) -> Result<u64> {
        let mut backend = self.backend.write();

        let mut removed = 0;
        for key in backend.list_keys()? {
            if key == LEDGER_KEY {
                continue;
            }
            if let Err(e) = backend.delete(&key) {
                let remaining = scan_totals(&*backend)?;
                SizeLedger::store(&mut *backend, remaining)?;
                warn!("Clear aborted after {} entries: {}", removed, e);
                return Err(e);
            }
            removed += 1;
        }
        SizeLedger::reset(&mut *backend)?;

        info!("Cache cleared: removed {} entries", removed);
        Ok(removed)
    }

    // == Ledger ==
    /// Returns the persisted totals.
    pub fn ledger(&self) -> Result<Ledger> {
        let backend = self.backend.read();
        SizeLedger::load(&*backend)
    }

    // == Scan ==
    /// Recomputes totals from the stored entries without touching the ledger.
    pub fn scan(&self) -> Result<Ledger> {
        let backend = self.backend.read();
        scan_totals(&*backend)
    }

    // == Reconcile ==
    /// Rewrites the ledger from a full scan of the stored entries.
    ///
    /// Repairs drift left by a process dying between an entry write and its
    /// ledger update. Returns the rewritten ledger.
    pub fn reconcile(&self) -> Result<Ledger> {
        let mut backend = self.backend.write();

        let recorded = SizeLedger::load(&*backend)?;
        let actual = scan_totals(&*backend)?;
        if recorded != actual {
            warn!(
                "Ledger drift: recorded {} bytes / {} entries, found {} bytes / {} entries",
                recorded.total_size,
                recorded.total_entries,
                actual.total_size,
                actual.total_entries
            );
        }
        SizeLedger::store(&mut *backend, actual)?;

        Ok(actual)
    }

    // == Stats ==
    /// Session counters together with the persisted totals.
    pub fn stats(&self) -> Result<CacheStats> {
        let ledger = self.ledger()?;
        let mut stats = self.stats.lock().clone();
        stats.set_ledger(ledger);
        Ok(stats)
    }

    // == Hit Report ==
    /// Per-entry hits and sizes, most hit first.
    pub fn hit_report(&self) -> Result<HitReport> {
        let backend = self.backend.read();

        let ledger = SizeLedger::load(&*backend)?;
        let rows = stored_entries(&*backend, None)?
            .into_iter()
            .map(|(key, entry)| {
                let size = entry.size_under(&key);
                HitReportRow::new(key, entry.hits, size, entry.last_access)
            })
            .collect();

        Ok(HitReport::new(ledger, rows))
    }

    // == Evict (locked) ==
    /// Deletes least recently used entries until `target` bytes are freed or
    /// no candidates remain, then applies the total to the ledger once.
    ///
    /// A failing delete aborts the pass; the ledger is still reduced by the
    /// entries deleted before the failure.
    fn evict_locked(
        &self,
        backend: &mut B,
        target: u64,
        keep: Option<&str>,
    ) -> Result<EvictionOutcome> {
        let candidates = stored_entries(&*backend, keep)?
            .into_iter()
            .map(|(key, entry)| {
                let size = entry.size_under(&key);
                EvictionCandidate::new(key, size, entry.last_access)
            })
            .collect();
        let victims = lru::select_victims(candidates, target);

        let mut outcome = EvictionOutcome::default();
        let mut failure = None;
        for victim in &victims {
            if let Err(e) = backend.delete(&victim.key) {
                failure = Some(e);
                break;
            }
            debug!("Evicted {} ({} bytes)", victim.key, victim.size);
            outcome.evicted += 1;
            outcome.freed += victim.size;
        }

        if outcome.evicted > 0 {
            SizeLedger::apply(backend, -(outcome.freed as i64), -(outcome.evicted as i64))?;
        }
        self.stats
            .lock()
            .record_eviction_pass(outcome.evicted, outcome.freed);

        if let Some(e) = failure {
            warn!(
                "Eviction aborted after {} entries ({} bytes): {}",
                outcome.evicted, outcome.freed, e
            );
            return Err(e);
        }

        if outcome.freed < target {
            info!(
                "Eviction freed {} of {} bytes across {} entries, no candidates left",
                outcome.freed, target, outcome.evicted
            );
        } else {
            info!(
                "Eviction freed {} bytes across {} entries",
                outcome.freed, outcome.evicted
            );
        }

        Ok(outcome)
    }
}

// == Helpers ==
fn read_entry<B: EntryBackend + ?Sized>(
    backend: &B,
    composite: &str,
) -> Result<Option<CacheEntry>> {
    backend
        .read(composite)?
        .map(|raw| CacheEntry::decode(&raw))
        .transpose()
}

/// Every stored entry except the ledger record and `keep`.
///
/// Records that fail to decode are logged and skipped; a medium failure
/// still aborts the scan.
fn stored_entries<B: EntryBackend + ?Sized>(
    backend: &B,
    keep: Option<&str>,
) -> Result<Vec<(String, CacheEntry)>> {
    let mut entries = Vec::new();
    for key in backend.list_keys()? {
        if key == LEDGER_KEY || Some(key.as_str()) == keep {
            continue;
        }
        // Listed keys can vanish before they are read
        let Some(raw) = backend.read(&key)? else {
            continue;
        };
        match CacheEntry::decode(&raw) {
            Ok(entry) => entries.push((key, entry)),
            Err(e) => warn!("Skipping undecodable record {}: {}", key, e),
        }
    }
    Ok(entries)
}

fn scan_totals<B: EntryBackend + ?Sized>(backend: &B) -> Result<Ledger> {
    let mut ledger = Ledger::default();
    for (key, entry) in stored_entries(backend, None)? {
        ledger.total_size += entry.size_under(&key);
        ledger.total_entries += 1;
    }
    Ok(ledger)
}
