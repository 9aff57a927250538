//! Entry Backend Module
//!
//! Durable key-value persistence the cache store sits on. Every call goes
//! straight to the medium; nothing is cached here.

use std::collections::HashMap;

use crate::error::Result;

// == Entry Backend ==
/// Persistence medium mapping record keys to serialized records.
pub trait EntryBackend: Send + Sync {
    /// Reads a record. A missing key is `Ok(None)`, never an error.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces a record. No partial write is observable.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes a record. No-op if the key is absent.
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Lists every stored key in unspecified order.
    fn list_keys(&self) -> Result<Vec<String>>;

    /// Rejects keys this medium can never hold.
    fn check_key(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

// == Memory Backend ==
/// Volatile backend for tests and throwaway stores.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    records: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntryBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.records.keys().cloned().collect())
    }
}
