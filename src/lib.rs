//! Render Cache - a size-bounded persistent cache for memoized results
//!
//! Stores computation results under `(namespace, key)` pairs on disk, keeps a
//! persisted size ledger, and evicts least recently used entries when a write
//! would exceed the configured budget.

pub mod cache;
pub mod config;
pub mod error;
pub mod report;

pub use cache::{CacheEntry, CacheStore};
pub use config::{CacheLimits, Config};
pub use error::{CacheError, Result};
pub use report::HitReport;
