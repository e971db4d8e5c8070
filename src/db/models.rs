// Data models: Rust structs that map to cache rows.
//
// Kept apart from the queries so other modules can use them without
// depending on rusqlite directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached corpus, serialized.
#[derive(Debug, Clone)]
pub struct CachedCorpus {
    pub key: String,
    pub fingerprint: String,
    pub record_count: i64,
    pub skipped_count: i64,
    pub assignment_count: i64,
    pub corpus_json: String,
    pub built_at: DateTime<Utc>,
}

/// A cache row without its payload, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub fingerprint: String,
    pub record_count: i64,
    pub skipped_count: i64,
    pub assignment_count: i64,
    pub built_at: DateTime<Utc>,
    /// Size of the serialized corpus in bytes
    pub payload_bytes: i64,
}

impl CacheEntry {
    /// The cached roots, one per line of the key.
    pub fn roots(&self) -> Vec<&str> {
        self.key.lines().collect()
    }
}

/// How a corpus was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheOutcome {
    /// Fingerprint matched; the stored corpus was used
    Hit,
    /// No entry for these roots
    Miss,
    /// An entry existed but the files changed
    Stale,
    /// Rebuild requested by the caller
    Refreshed,
    /// Caching is turned off
    Bypassed,
}

impl std::fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CacheOutcome::Hit => "cache hit",
            CacheOutcome::Miss => "cache miss",
            CacheOutcome::Stale => "cache stale",
            CacheOutcome::Refreshed => "refreshed",
            CacheOutcome::Bypassed => "cache bypassed",
        };
        write!(f, "{s}")
    }
}
