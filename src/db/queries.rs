// Database queries: every SQL statement against the corpus cache.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{CacheEntry, CachedCorpus};

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp in cache: {value}"))?
        .with_timezone(&Utc))
}

/// Save or replace the cached corpus for `entry.key`.
pub fn save_corpus(conn: &Connection, entry: &CachedCorpus) -> Result<()> {
    conn.execute(
        "INSERT INTO corpus_cache
            (cache_key, fingerprint, record_count, skipped_count, assignment_count,
             corpus_json, built_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(cache_key) DO UPDATE SET
            fingerprint = ?2,
            record_count = ?3,
            skipped_count = ?4,
            assignment_count = ?5,
            corpus_json = ?6,
            built_at = ?7",
        params![
            entry.key,
            entry.fingerprint,
            entry.record_count,
            entry.skipped_count,
            entry.assignment_count,
            entry.corpus_json,
            entry.built_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Load the cached corpus for `key`, if any.
pub fn get_corpus(conn: &Connection, key: &str) -> Result<Option<CachedCorpus>> {
    let mut stmt = conn.prepare(
        "SELECT cache_key, fingerprint, record_count, skipped_count, assignment_count,
                corpus_json, built_at
         FROM corpus_cache WHERE cache_key = ?1",
    )?;
    let row = stmt
        .query_row(params![key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .optional()?;

    row.map(
        |(key, fingerprint, record_count, skipped_count, assignment_count, corpus_json, built_at)|
         -> Result<CachedCorpus> {
            Ok(CachedCorpus {
                key,
                fingerprint,
                record_count,
                skipped_count,
                assignment_count,
                corpus_json,
                built_at: parse_timestamp(&built_at)?,
            })
        },
    )
    .transpose()
}

/// Every cache entry, most recently built first.
pub fn list_entries(conn: &Connection) -> Result<Vec<CacheEntry>> {
    let mut stmt = conn.prepare(
        "SELECT cache_key, fingerprint, record_count, skipped_count, assignment_count,
                built_at, length(corpus_json)
         FROM corpus_cache
         ORDER BY built_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, i64>(6)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (key, fingerprint, record_count, skipped_count, assignment_count, built_at, bytes) =
            row?;
        entries.push(CacheEntry {
            key,
            fingerprint,
            record_count,
            skipped_count,
            assignment_count,
            built_at: parse_timestamp(&built_at)?,
            payload_bytes: bytes,
        });
    }
    Ok(entries)
}

/// Delete the entry for `key`. Returns whether one existed.
pub fn delete_corpus(conn: &Connection, key: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM corpus_cache WHERE cache_key = ?1", params![key])?;
    Ok(deleted > 0)
}

/// Delete every entry. Returns how many were removed.
pub fn clear_corpora(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM corpus_cache", [])?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn entry(key: &str, fingerprint: &str) -> CachedCorpus {
        CachedCorpus {
            key: key.to_string(),
            fingerprint: fingerprint.to_string(),
            record_count: 3,
            skipped_count: 1,
            assignment_count: 2,
            corpus_json: "{}".to_string(),
            built_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_and_get() {
        let conn = conn();
        save_corpus(&conn, &entry("/a", "f1")).unwrap();
        let got = get_corpus(&conn, "/a").unwrap().unwrap();
        assert_eq!(got.fingerprint, "f1");
        assert_eq!(got.record_count, 3);
        assert!(get_corpus(&conn, "/b").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces() {
        let conn = conn();
        save_corpus(&conn, &entry("/a", "f1")).unwrap();
        save_corpus(&conn, &entry("/a", "f2")).unwrap();
        assert_eq!(get_corpus(&conn, "/a").unwrap().unwrap().fingerprint, "f2");
        assert_eq!(list_entries(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_and_clear() {
        let conn = conn();
        save_corpus(&conn, &entry("/a", "f1")).unwrap();
        save_corpus(&conn, &entry("/b\n/c", "f2")).unwrap();
        assert!(delete_corpus(&conn, "/a").unwrap());
        assert!(!delete_corpus(&conn, "/a").unwrap());

        let entries = list_entries(&conn).unwrap();
        assert_eq!(entries[0].roots(), vec!["/b", "/c"]);
        assert_eq!(entries[0].payload_bytes, 2);

        assert_eq!(clear_corpora(&conn).unwrap(), 1);
        assert!(list_entries(&conn).unwrap().is_empty());
    }
}
