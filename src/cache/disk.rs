//! Disk Backend Module
//!
//! Stores one file per record inside the cache directory. File names are the
//! record key with every byte outside `[a-z0-9_-]` written as `%XX`, so a
//! name never starts with `.`; dot-files are in-flight temporary writes.
//! Upper-case letters are escaped too, keeping `ns-A` and `ns-a` apart on
//! case-insensitive filesystems.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cache::backend::EntryBackend;
use crate::cache::ledger::LEDGER_KEY;
use crate::cache::KEY_SEPARATOR;
use crate::error::{CacheError, Result};

/// Longest file name accepted by common filesystems.
pub const MAX_FILE_NAME_LEN: usize = 255;

// leading '.' and trailing ".tmp"
const TEMP_OVERHEAD: usize = 5;

// == Disk Backend ==
/// Directory-backed persistence surviving process restarts.
///
/// Only files this backend could have written are listed: the name must be
/// the exact encoding of the ledger key or of a composite key. Anything else
/// in the directory is left alone.
#[derive(Debug, Clone)]
pub struct DiskBackend {
    dir: PathBuf,
}

impl DiskBackend {
    /// Opens (creating if needed) the cache directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            CacheError::StorageUnavailable(format!(
                "cannot create cache directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        debug!("Opened disk cache at {}", dir.display());
        Ok(Self { dir })
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(encode_key(key))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.tmp", encode_key(key)))
    }
}

impl EntryBackend for DiskBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_key(key)?;

        let temp = self.temp_path_for(key);
        let result = (|| -> io::Result<()> {
            let mut file = File::create(&temp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, self.path_for(key))
        })();

        if let Err(e) = result {
            // Best effort: the temp file is invisible to readers either way
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else {
                warn!("Skipping non UTF-8 file in cache directory: {:?}", name);
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            match decode_key(name) {
                Some(key) if is_record_name(name, &key) => keys.push(key),
                _ => debug!("Skipping foreign file in cache directory: {}", name),
            }
        }
        Ok(keys)
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("empty key".to_string()));
        }
        let encoded_len = encoded_len(key);
        if encoded_len + TEMP_OVERHEAD > MAX_FILE_NAME_LEN {
            return Err(CacheError::InvalidKey(format!(
                "key encodes to {} bytes, limit is {}",
                encoded_len,
                MAX_FILE_NAME_LEN - TEMP_OVERHEAD
            )));
        }
        Ok(())
    }
}

// == Key Encoding ==
fn is_plain(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-'
}

/// True if `name` is exactly what this backend writes for `key`.
fn is_record_name(name: &str, key: &str) -> bool {
    (key == LEDGER_KEY || key.contains(KEY_SEPARATOR)) && encode_key(key) == name
}

fn encoded_len(key: &str) -> usize {
    key.bytes().map(|b| if is_plain(b) { 1 } else { 3 }).sum()
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(encoded_len(key));
    for b in key.bytes() {
        if is_plain(b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{:02X}", b);
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
