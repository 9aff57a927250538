//! LRU Eviction Module
//!
//! Chooses which entries an eviction pass removes. Pure functions over
//! candidate descriptions; the store performs the deletions.

use std::cmp::Ordering;

// == Eviction Candidate ==
/// What the planner needs to know about one stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionCandidate {
    /// Composite key the entry is stored under
    pub key: String,
    /// Size contribution in bytes
    pub size: u64,
    /// Last write or read (Unix milliseconds)
    pub last_access: u64,
}

impl EvictionCandidate {
    pub fn new(key: impl Into<String>, size: u64, last_access: u64) -> Self {
        Self {
            key: key.into(),
            size,
            last_access,
        }
    }
}

/// Least recently used first; equal access times fall back to key order.
fn lru_order(a: &EvictionCandidate, b: &EvictionCandidate) -> Ordering {
    a.last_access
        .cmp(&b.last_access)
        .then_with(|| a.key.cmp(&b.key))
}

// == Select Victims ==
/// Returns the entries to evict to free at least `target` bytes, oldest first.
///
/// Stops as soon as the freed total reaches `target`. If every candidate is
/// taken without reaching it, all candidates are returned; a shortfall is the
/// caller's to accept. A zero target selects nothing.
pub fn select_victims(
    mut candidates: Vec<EvictionCandidate>,
    target: u64,
) -> Vec<EvictionCandidate> {
    candidates.sort_by(lru_order);

    let mut freed: u64 = 0;
    let mut cut = 0;
    for candidate in &candidates {
        if freed >= target {
            break;
        }
        freed = freed.saturating_add(candidate.size);
        cut += 1;
    }

    candidates.truncate(cut);
    candidates
}
