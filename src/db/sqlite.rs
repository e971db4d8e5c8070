// SqliteCorpusStore: rusqlite backend implementing the CorpusStore trait.
//
// Thin wrapper: each method delegates to the free functions in queries.rs,
// which stay usable against a bare Connection in tests.

use anyhow::Result;
use rusqlite::Connection;

use super::models::{CacheEntry, CachedCorpus};
use super::queries;
use super::traits::CorpusStore;

pub struct SqliteCorpusStore {
    conn: Connection,
}

impl SqliteCorpusStore {
    /// Wrap an already-opened connection whose tables exist.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl CorpusStore for SqliteCorpusStore {
    fn get(&self, key: &str) -> Result<Option<CachedCorpus>> {
        queries::get_corpus(&self.conn, key)
    }

    fn put(&self, entry: &CachedCorpus) -> Result<()> {
        queries::save_corpus(&self.conn, entry)
    }

    fn forget(&self, key: &str) -> Result<bool> {
        queries::delete_corpus(&self.conn, key)
    }

    fn clear(&self) -> Result<usize> {
        queries::clear_corpora(&self.conn)
    }

    fn list(&self) -> Result<Vec<CacheEntry>> {
        queries::list_entries(&self.conn)
    }
}
