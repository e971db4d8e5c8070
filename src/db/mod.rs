// Database layer: SQLite cache of parsed corpora.
//
// Parsing a large reflection tree is the one expensive step worth
// memoizing. The database file lives wherever TEXTMINING_CACHE_PATH points
// (defaults to ./textmining-cache.db). rusqlite's "bundled" feature means
// there is no system SQLite dependency.

pub mod fingerprint;
pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::corpus::{load_corpus, Corpus};

pub use models::{CacheEntry, CacheOutcome, CachedCorpus};
pub use sqlite::SqliteCorpusStore;
pub use traits::CorpusStore;

/// Open (or create) the cache database and run migrations.
pub fn initialize(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Failed to create directory for cache database: {}",
                    db_path.display()
                )
            })?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open cache database at {}", db_path.display()))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open the cache at `db_path` as a store.
pub fn open_store(db_path: &Path) -> Result<SqliteCorpusStore> {
    Ok(SqliteCorpusStore::new(initialize(db_path)?))
}

/// Load the corpus for `roots`, reusing the cached copy when the files have
/// not changed since it was built. `refresh` forces a rebuild.
pub fn load_corpus_cached(
    store: &dyn CorpusStore,
    roots: &[PathBuf],
    refresh: bool,
) -> Result<(Corpus, CacheOutcome)> {
    let key = fingerprint::cache_key(roots)?;
    let current = fingerprint::corpus_fingerprint(roots)?;

    let outcome = if refresh {
        CacheOutcome::Refreshed
    } else {
        match store.get(&key)? {
            Some(cached) if cached.fingerprint == current => {
                match serde_json::from_str::<Corpus>(&cached.corpus_json) {
                    Ok(corpus) => {
                        debug!(
                            records = corpus.len(),
                            built_at = %cached.built_at,
                            "Using cached corpus"
                        );
                        return Ok((corpus, CacheOutcome::Hit));
                    }
                    Err(e) => {
                        warn!(error = %e, "Cached corpus is unreadable; rebuilding");
                        CacheOutcome::Stale
                    }
                }
            }
            Some(_) => CacheOutcome::Stale,
            None => CacheOutcome::Miss,
        }
    };

    let corpus = load_corpus(roots)?;
    let entry = CachedCorpus {
        key,
        fingerprint: current,
        record_count: corpus.len() as i64,
        skipped_count: corpus.skipped().len() as i64,
        assignment_count: corpus.assignments().len() as i64,
        corpus_json: serde_json::to_string(&corpus).context("Failed to serialize corpus")?,
        built_at: Utc::now(),
    };
    store.put(&entry)?;
    info!(%outcome, records = corpus.len(), "Cached corpus");

    Ok((corpus, outcome))
}

/// Drop the cached corpus for `roots`, which need not exist any more.
/// Returns whether an entry was found.
pub fn forget_roots(store: &dyn CorpusStore, roots: &[PathBuf]) -> Result<bool> {
    store.forget(&fingerprint::lenient_cache_key(roots))
}
