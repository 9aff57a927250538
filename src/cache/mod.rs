//! Cache Module
//!
//! Size-bounded persistent cache store with a persisted size ledger and LRU
//! eviction.

mod backend;
mod clock;
mod disk;
mod entry;
mod ledger;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use backend::{EntryBackend, MemoryBackend};
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use disk::{DiskBackend, MAX_FILE_NAME_LEN};
pub use entry::{composite_key, size_contribution, CacheEntry};
pub use ledger::{Ledger, SizeLedger, LEDGER_KEY};
pub use lru::{select_victims, EvictionCandidate};
pub use stats::CacheStats;
pub use store::{CacheStore, EvictionOutcome};

// == Public Constants ==
/// Joins a namespace and a caller key into a composite key
pub const KEY_SEPARATOR: char = '-';
