// Database schema: table creation and migrations.
//
// A `schema_version` table tracks which migrations have run, and each
// migration is a function that executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet. Safe to call on every open.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One cached corpus per ordered set of document roots
        CREATE TABLE IF NOT EXISTS corpus_cache (
            cache_key TEXT PRIMARY KEY,        -- canonical roots, newline-joined
            fingerprint TEXT NOT NULL,         -- SHA-256 over file paths, sizes, mtimes
            record_count INTEGER NOT NULL,
            skipped_count INTEGER NOT NULL,
            corpus_json TEXT NOT NULL,
            built_at TEXT NOT NULL             -- RFC 3339
        );
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: assignment count, shown by `cache list` without
    // deserializing the corpus
    run_migration(conn, 2, |c| {
        c.execute_batch(
            "ALTER TABLE corpus_cache ADD COLUMN assignment_count INTEGER NOT NULL DEFAULT 0;",
        )
    })?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the number of tables in the database.
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
