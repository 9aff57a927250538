//! Error types for the cache store
//!
//! Provides unified error handling using thiserror.

use std::io;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache store.
///
/// Cache misses and eviction shortfalls are not errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Missing or invalid configuration, raised at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The persistence medium failed a read, write, delete or listing
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Key the persistence medium can never hold
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

// == Conversions ==
impl From<io::Error> for CacheError {
    fn from(err: io::Error) -> Self {
        CacheError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::StorageUnavailable(format!("corrupt record: {}", err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache store.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_storage_unavailable() {
        let err: CacheError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, CacheError::StorageUnavailable(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_json_error_maps_to_storage_unavailable() {
        let parse: std::result::Result<u64, _> = serde_json::from_str("not json");
        let err: CacheError = parse.unwrap_err().into();
        assert!(matches!(err, CacheError::StorageUnavailable(_)));
        assert!(err.to_string().contains("corrupt record"));
    }

    #[test]
    fn test_configuration_error_message() {
        let err = CacheError::Configuration("no cache storage location configured".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: no cache storage location configured"
        );
    }
}
