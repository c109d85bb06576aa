//! On-disk persistence for query results and offline support.
//!
//! Successful query payloads are written through to storage. On start-up the
//! in-memory query cache is hydrated from it with every entry marked stale,
//! so the first mount still refetches but a failed request can fall back to
//! the last known payload.

mod storage;

pub use storage::{CacheStorage, NoopStorage, PersistedQuery, SqliteStorage};
