//! Persistence (spec §6): the only thing this gateway persists across restarts is the resolved-URL
//! cache, when a durable path is configured. Grounded on the teacher's `persistence/mod.rs::Db`
//! for the open/WAL/`Mutex<Connection>` shape, trimmed to the one table this crate actually needs
//! — no downloads/segments/batches/rules tables, since there is no local download engine here,
//! only the remote SABnzbd-shaped `Downloader`.

use anyhow::Context;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;

/// `CacheStore` backs `cache::ResolvedUrlCache`'s durable tier. A single connection behind a
/// mutex is enough: cache reads/writes are infrequent relative to the in-memory `UrlCache` hits
/// they back up, so there is no hot path here worth a connection pool.
#[derive(Clone)]
pub struct CacheStore {
  conn: Arc<Mutex<Connection>>,
}

/// One persisted cache row, as loaded back at startup.
pub struct CacheRow {
  pub key: String,
  pub value: String,
  pub expires_at_ms: i64,
}

impl CacheStore {
  pub fn open(path: PathBuf) -> anyhow::Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).context("failed to create cache db parent dir")?;
    }
    let conn = Connection::open(&path).context("failed to open cache sqlite db")?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let store = Self { conn: Arc::new(Mutex::new(conn)) };
    store.init_schema()?;
    Ok(store)
  }

  fn init_schema(&self) -> anyhow::Result<()> {
    self.conn.lock().execute_batch(
      r#"
      CREATE TABLE IF NOT EXISTS resolved_url_cache (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        expires_at_ms INTEGER NOT NULL
      );
      CREATE INDEX IF NOT EXISTS idx_resolved_url_cache_expires ON resolved_url_cache(expires_at_ms);
      "#,
    )?;
    Ok(())
  }

  /// Loads every non-expired row, for warming the in-memory `UrlCache` at startup.
  pub fn load_all(&self, now_ms: i64) -> anyhow::Result<Vec<CacheRow>> {
    let conn = self.conn.lock();
    let mut stmt = conn.prepare("SELECT key, value, expires_at_ms FROM resolved_url_cache WHERE expires_at_ms > ?1")?;
    let rows = stmt
      .query_map(params![now_ms], |row| {
        Ok(CacheRow { key: row.get(0)?, value: row.get(1)?, expires_at_ms: row.get(2)? })
      })?
      .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
  }

  pub fn upsert(&self, key: &str, value: &str, expires_at_ms: i64) -> anyhow::Result<()> {
    self.conn.lock().execute(
      "INSERT INTO resolved_url_cache (key, value, expires_at_ms) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at_ms = excluded.expires_at_ms",
      params![key, value, expires_at_ms],
    )?;
    Ok(())
  }

  #[allow(dead_code)]
  pub fn delete(&self, key: &str) -> anyhow::Result<()> {
    self.conn.lock().execute("DELETE FROM resolved_url_cache WHERE key = ?1", params![key])?;
    Ok(())
  }

  /// Sweeps rows past their TTL. Called from `ResolvedUrlCache::spawn_purge_loop`'s periodic
  /// loop, so stale rows don't accumulate forever.
  pub fn purge_expired(&self, now_ms: i64) -> anyhow::Result<usize> {
    Ok(self.conn.lock().execute("DELETE FROM resolved_url_cache WHERE expires_at_ms <= ?1", params![now_ms])?)
  }

  #[allow(dead_code)]
  pub fn get_raw(&self, key: &str) -> anyhow::Result<Option<String>> {
    let conn = self.conn.lock();
    Ok(conn
      .query_row("SELECT value FROM resolved_url_cache WHERE key = ?1", params![key], |row| row.get(0))
      .optional()?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("streamgate-test-{name}-{}.sqlite3", std::process::id()))
  }

  #[test]
  fn upsert_and_load_all_round_trips() {
    let path = temp_path("roundtrip");
    let store = CacheStore::open(path.clone()).unwrap();
    store.upsert("k1", "v1", 9_999_999_999_999).unwrap();
    let rows = store.load_all(0).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, "k1");
    assert_eq!(rows[0].value, "v1");
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn load_all_excludes_expired_rows() {
    let path = temp_path("expired");
    let store = CacheStore::open(path.clone()).unwrap();
    store.upsert("expired", "v", 1).unwrap();
    store.upsert("fresh", "v", 9_999_999_999_999).unwrap();
    let rows = store.load_all(1_000).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, "fresh");
    let _ = std::fs::remove_file(&path);
  }

  #[test]
  fn purge_expired_removes_stale_rows() {
    let path = temp_path("purge");
    let store = CacheStore::open(path.clone()).unwrap();
    store.upsert("old", "v", 1).unwrap();
    let removed = store.purge_expired(1_000).unwrap();
    assert_eq!(removed, 1);
    assert!(store.get_raw("old").unwrap().is_none());
    let _ = std::fs::remove_file(&path);
  }
}
