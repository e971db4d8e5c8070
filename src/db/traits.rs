// Corpus store trait: backend-agnostic interface for the corpus cache.
//
// The SQLite store is the only implementation. Loading code talks to the
// trait so tests and callers can swap in another store.

use anyhow::Result;

use super::models::{CacheEntry, CachedCorpus};

pub trait CorpusStore {
    /// Load the cached corpus for a cache key.
    fn get(&self, key: &str) -> Result<Option<CachedCorpus>>;

    /// Save or replace a cached corpus.
    fn put(&self, entry: &CachedCorpus) -> Result<()>;

    /// Drop the entry for a cache key. Returns whether one existed.
    fn forget(&self, key: &str) -> Result<bool>;

    /// Drop every entry. Returns how many were removed.
    fn clear(&self) -> Result<usize>;

    /// All entries, most recently built first.
    fn list(&self) -> Result<Vec<CacheEntry>>;
}
