//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;

use crate::query::QueryKey;

/// A query result read back from storage.
#[derive(Debug, Clone)]
pub struct PersistedQuery {
  pub key: QueryKey,
  pub data: Value,
  /// When the result was written
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Store (or replace) the payload for a key.
  fn store(&self, key: &QueryKey, data: &Value) -> Result<()>;

  /// Get the stored payload for a key.
  fn load(&self, key: &QueryKey) -> Result<Option<PersistedQuery>>;

  /// Every stored query, for hydrating a fresh cache.
  fn load_all(&self) -> Result<Vec<PersistedQuery>>;

  /// Delete every stored query whose key starts with `prefix`.
  fn remove_prefix(&self, prefix: &QueryKey) -> Result<usize>;

  fn clear(&self) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when persistence is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn store(&self, _key: &QueryKey, _data: &Value) -> Result<()> {
    Ok(()) // Discard
  }

  fn load(&self, _key: &QueryKey) -> Result<Option<PersistedQuery>> {
    Ok(None) // Always miss
  }

  fn load_all(&self) -> Result<Vec<PersistedQuery>> {
    Ok(Vec::new())
  }

  fn remove_prefix(&self, _prefix: &QueryKey) -> Result<usize> {
    Ok(0)
  }

  fn clear(&self) -> Result<()> {
    Ok(())
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// A throwaway database, mostly for tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- One row per query key
CREATE TABLE IF NOT EXISTS query_cache (
    query_hash TEXT PRIMARY KEY,
    query_key TEXT NOT NULL,
    resource TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_query_cache_resource ON query_cache(resource);
"#;

impl CacheStorage for SqliteStorage {
  fn store(&self, key: &QueryKey, data: &Value) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let data = serde_json::to_vec(data).map_err(|e| eyre!("Failed to serialize payload: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO query_cache (query_hash, query_key, resource, data, cached_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![
          key.stable_hash(),
          key.to_json(),
          key.resource().unwrap_or(""),
          data
        ],
      )
      .map_err(|e| eyre!("Failed to store query {}: {}", key, e))?;

    Ok(())
  }

  fn load(&self, key: &QueryKey) -> Result<Option<PersistedQuery>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data, cached_at FROM query_cache WHERE query_hash = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(Vec<u8>, String)> = stmt
      .query_row(params![key.stable_hash()], |row| Ok((row.get(0)?, row.get(1)?)))
      .ok();

    match row {
      Some((data, cached_at)) => Ok(Some(PersistedQuery {
        key: key.clone(),
        data: serde_json::from_slice(&data)
          .map_err(|e| eyre!("Failed to deserialize payload for {}: {}", key, e))?,
        cached_at: parse_datetime(&cached_at)?,
      })),
      None => Ok(None),
    }
  }

  fn load_all(&self) -> Result<Vec<PersistedQuery>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT query_key, data, cached_at FROM query_cache ORDER BY query_key")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let rows: Vec<(String, Vec<u8>, String)> = stmt
      .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
      .map_err(|e| eyre!("Failed to query cache: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    // Rows written by an incompatible version are skipped
    let queries = rows
      .into_iter()
      .filter_map(|(key, data, cached_at)| {
        Some(PersistedQuery {
          key: QueryKey::from_json(&key).ok()?,
          data: serde_json::from_slice(&data).ok()?,
          cached_at: parse_datetime(&cached_at).ok()?,
        })
      })
      .collect();

    Ok(queries)
  }

  fn remove_prefix(&self, prefix: &QueryKey) -> Result<usize> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let candidates: Vec<(String, String)> = {
      let (sql, resource) = match prefix.resource() {
        Some(r) => (
          "SELECT query_hash, query_key FROM query_cache WHERE resource = ?",
          Some(r),
        ),
        None => ("SELECT query_hash, query_key FROM query_cache", None),
      };
      let mut stmt = conn
        .prepare(sql)
        .map_err(|e| eyre!("Failed to prepare query: {}", e))?;
      let rows = match resource {
        Some(r) => stmt.query_map(params![r], hash_and_key),
        None => stmt.query_map([], hash_and_key),
      }
      .map_err(|e| eyre!("Failed to query cache: {}", e))?;
      let rows: Vec<(String, String)> = rows.filter_map(|r| r.ok()).collect();
      rows
    };

    let mut removed = 0;
    for (hash, key) in candidates {
      let matches = QueryKey::from_json(&key)
        .map(|k| k.starts_with(prefix))
        .unwrap_or(false);
      if matches {
        removed += conn
          .execute("DELETE FROM query_cache WHERE query_hash = ?", params![hash])
          .map_err(|e| eyre!("Failed to delete cached query: {}", e))?;
      }
    }

    Ok(removed)
  }

  fn clear(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM query_cache", [])
      .map_err(|e| eyre!("Failed to clear cache: {}", e))?;

    Ok(())
  }
}

fn hash_and_key(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String)> {
  Ok((row.get(0)?, row.get(1)?))
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
