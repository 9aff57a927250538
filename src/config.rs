//! Configuration Module
//!
//! Handles loading and managing cache store configuration from code or
//! environment variables.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::error::{CacheError, Result};

/// Cache store configuration parameters.
///
/// Fixed once the store is constructed.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directory holding persisted entries and the ledger
    pub storage_location: Option<PathBuf>,
    /// Ceiling on the ledger's total size in bytes, None = never evict
    pub max_cache_size: Option<u64>,
    /// Lower bound on the bytes a single eviction pass tries to reclaim
    pub min_free_cache_size: Option<u64>,
    /// Upper bound on the bytes a single eviction pass tries to reclaim
    pub max_free_cache_size: Option<u64>,
}

/// Size limits resolved from a [`Config`], with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub max_cache_size: Option<u64>,
    pub min_free_cache_size: u64,
    pub max_free_cache_size: u64,
}

impl CacheLimits {
    /// Limits for a store that never evicts.
    pub fn unbounded() -> Self {
        Self {
            max_cache_size: None,
            min_free_cache_size: 0,
            max_free_cache_size: u64::MAX,
        }
    }

    // == Reclaim Target ==
    /// Bytes an eviction pass should reclaim to admit `growth` more bytes.
    ///
    /// `growth` is raised to the minimum and then capped by the maximum, so a
    /// misconfigured `min > max` collapses to the maximum.
    pub fn reclaim_target(&self, growth: u64) -> u64 {
        growth
            .max(self.min_free_cache_size)
            .min(self.max_free_cache_size)
    }

    /// Returns true if a store holding `projected` bytes is over budget.
    pub fn exceeds(&self, projected: u64) -> bool {
        match self.max_cache_size {
            Some(max) => projected > max,
            None => false,
        }
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Config {
    /// Creates a config storing entries under `storage_location` with no size limit.
    pub fn new(storage_location: impl Into<PathBuf>) -> Self {
        Self {
            storage_location: Some(storage_location.into()),
            ..Self::default()
        }
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `RENDER_CACHE_DIR` - Storage directory (no default)
    /// - `MAX_CACHE_SIZE` - Size ceiling in bytes (default: unbounded)
    /// - `MIN_FREE_CACHE_SIZE` - Minimum bytes reclaimed per eviction pass
    /// - `MAX_FREE_CACHE_SIZE` - Maximum bytes reclaimed per eviction pass
    pub fn from_env() -> Self {
        Self {
            storage_location: env::var("RENDER_CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            max_cache_size: env::var("MAX_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok()),
            min_free_cache_size: env::var("MIN_FREE_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok()),
            max_free_cache_size: env::var("MAX_FREE_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    pub fn with_max_cache_size(mut self, bytes: u64) -> Self {
        self.max_cache_size = Some(bytes);
        self
    }

    pub fn with_min_free_cache_size(mut self, bytes: u64) -> Self {
        self.min_free_cache_size = Some(bytes);
        self
    }

    pub fn with_max_free_cache_size(mut self, bytes: u64) -> Self {
        self.max_free_cache_size = Some(bytes);
        self
    }

    // == Storage Location ==
    /// Returns the configured storage directory.
    ///
    /// Fails with [`CacheError::Configuration`] when none is set.
    pub fn require_storage_location(&self) -> Result<&PathBuf> {
        self.storage_location.as_ref().ok_or_else(|| {
            CacheError::Configuration("no cache storage location configured".to_string())
        })
    }

    // == Limits ==
    /// Resolves size limits, applying defaults for unset values.
    pub fn limits(&self) -> CacheLimits {
        let limits = CacheLimits {
            max_cache_size: self.max_cache_size,
            min_free_cache_size: self.min_free_cache_size.unwrap_or(0),
            max_free_cache_size: self
                .max_free_cache_size
                .or(self.max_cache_size)
                .unwrap_or(u64::MAX),
        };

        if limits.min_free_cache_size > limits.max_free_cache_size {
            warn!(
                "min_free_cache_size {} exceeds max_free_cache_size {}, eviction passes will target {} bytes",
                limits.min_free_cache_size, limits.max_free_cache_size, limits.max_free_cache_size
            );
        }

        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.storage_location.is_none());
        assert!(config.max_cache_size.is_none());
        assert_eq!(config.limits(), CacheLimits::unbounded());
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("RENDER_CACHE_DIR");
        env::remove_var("MAX_CACHE_SIZE");
        env::remove_var("MIN_FREE_CACHE_SIZE");
        env::remove_var("MAX_FREE_CACHE_SIZE");

        let config = Config::from_env();
        assert!(config.storage_location.is_none());
        assert!(config.max_cache_size.is_none());
        assert!(config.min_free_cache_size.is_none());
        assert!(config.max_free_cache_size.is_none());
    }

    #[test]
    fn test_missing_storage_location() {
        let config = Config::default();
        let result = config.require_storage_location();
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }

    #[test]
    fn test_limits_defaults_follow_max_cache_size() {
        let limits = Config::new("/tmp/cache").with_max_cache_size(500).limits();
        assert_eq!(limits.max_cache_size, Some(500));
        assert_eq!(limits.min_free_cache_size, 0);
        assert_eq!(limits.max_free_cache_size, 500);
    }

    #[test]
    fn test_reclaim_target_clamps() {
        let limits = Config::new("/tmp/cache")
            .with_max_cache_size(100)
            .with_min_free_cache_size(10)
            .with_max_free_cache_size(50)
            .limits();

        assert_eq!(limits.reclaim_target(40), 40);
        assert_eq!(limits.reclaim_target(3), 10);
        assert_eq!(limits.reclaim_target(75), 50);
    }

    #[test]
    fn test_reclaim_target_degenerate_range() {
        let limits = Config::new("/tmp/cache")
            .with_max_cache_size(100)
            .with_min_free_cache_size(60)
            .with_max_free_cache_size(20)
            .limits();

        assert_eq!(limits.reclaim_target(5), 20);
        assert_eq!(limits.reclaim_target(90), 20);
    }

    #[test]
    fn test_exceeds() {
        assert!(!CacheLimits::unbounded().exceeds(u64::MAX));

        let limits = Config::new("/tmp/cache").with_max_cache_size(100).limits();
        assert!(!limits.exceeds(100));
        assert!(limits.exceeds(101));
    }
}
