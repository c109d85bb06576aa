//! The shared query cache.
//!
//! Entries live in a `BTreeMap` keyed by [`QueryKey`]; every key extending a
//! prefix sorts right after it, so prefix invalidation is one range scan.
//! The map sits behind a `std::sync::Mutex` that is never held across an
//! `.await`.

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{CacheStorage, NoopStorage};
use crate::error::ApiError;

use super::key::QueryKey;
use super::state::{QueryState, QueryStatus};

/// Outcome of a fetch as every waiter sees it.
pub type FetchResult = Result<Arc<Value>, Arc<ApiError>>;

/// Produces one request per call. Stored per entry so invalidation and
/// polling can refetch without the caller.
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<Value, ApiError>> + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
{
  Arc::new(move || f().boxed())
}

/// Client-wide defaults, overridable per observer.
#[derive(Debug, Clone, Copy)]
pub struct QueryDefaults {
  /// Age after which cached data is refetched on mount
  pub stale_time: Duration,
  /// How long an entry without subscribers is kept
  pub gc_time: Duration,
}

impl Default for QueryDefaults {
  fn default() -> Self {
    Self {
      stale_time: Duration::ZERO,
      gc_time: Duration::from_secs(5 * 60),
    }
  }
}

struct Entry {
  /// Distinguishes an entry from one later created under the same key
  id: u64,
  state: watch::Sender<QueryState>,
  updated_at: Option<Instant>,
  invalidated: bool,
  /// Bumped by every invalidation; a fetch remembers the value it started with
  epoch: u64,
  in_flight: Option<(u64, SharedFetch)>,
  fetcher: Option<Fetcher>,
  observers: usize,
  /// Observers that are enabled; only these make invalidation refetch
  active: usize,
  /// Bumped whenever a pending collection must be cancelled
  gc_generation: u64,
}

impl Entry {
  fn new(id: u64) -> Self {
    let (state, _) = watch::channel(QueryState::default());
    Self {
      id,
      state,
      updated_at: None,
      invalidated: false,
      epoch: 0,
      in_flight: None,
      fetcher: None,
      observers: 0,
      active: 0,
      gc_generation: 0,
    }
  }

  fn fresh_data(&self, stale_time: Duration) -> Option<Arc<Value>> {
    if self.invalidated {
      return None;
    }
    let updated_at = self.updated_at?;
    if updated_at.elapsed() >= stale_time {
      return None;
    }
    self.state.borrow().data.clone()
  }
}

struct Inner {
  entries: Mutex<BTreeMap<QueryKey, Entry>>,
  defaults: QueryDefaults,
  storage: Arc<dyn CacheStorage>,
  fetch_ids: AtomicU64,
  entry_ids: AtomicU64,
}

/// Handle to the query cache. Cheap to clone; clones share the cache.
///
/// Must be used from within a Tokio runtime: fetches and garbage collection
/// run as spawned tasks.
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<Inner>,
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new(QueryDefaults::default())
  }
}

impl QueryClient {
  /// An in-memory cache with no persistence.
  pub fn new(defaults: QueryDefaults) -> Self {
    Self::with_storage(defaults, Arc::new(NoopStorage))
  }

  /// A cache that writes successful results through to `storage`.
  pub fn with_storage(defaults: QueryDefaults, storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(BTreeMap::new()),
        defaults,
        storage,
        fetch_ids: AtomicU64::new(0),
        entry_ids: AtomicU64::new(0),
      }),
    }
  }

  pub fn defaults(&self) -> QueryDefaults {
    self.inner.defaults
  }

  pub fn storage(&self) -> &Arc<dyn CacheStorage> {
    &self.inner.storage
  }

  fn new_entry(&self) -> Entry {
    Entry::new(self.inner.entry_ids.fetch_add(1, Ordering::Relaxed))
  }

  fn entries(&self) -> MutexGuard<'_, BTreeMap<QueryKey, Entry>> {
    // No code path panics while holding the lock; recover the map regardless
    self
      .inner
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Read through the cache.
  ///
  /// Returns cached data younger than `stale_time`, joins a request already
  /// in flight for the key, or starts a new one.
  pub async fn fetch_query(
    &self,
    key: &QueryKey,
    fetcher: Fetcher,
    stale_time: Option<Duration>,
  ) -> FetchResult {
    let stale_time = stale_time.unwrap_or(self.inner.defaults.stale_time);

    let fetch = {
      let mut entries = self.entries();
      let entry = entries.entry(key.clone()).or_insert_with(|| self.new_entry());
      if entry.fetcher.is_none() {
        entry.fetcher = Some(fetcher.clone());
      }

      if let Some((_, fetch)) = &entry.in_flight {
        debug!(key = %key, "joining in-flight fetch");
        fetch.clone()
      } else if let Some(data) = entry.fresh_data(stale_time) {
        debug!(key = %key, "cache hit");
        return Ok(data);
      } else {
        self.start_fetch(key, entry, fetcher)
      }
    };

    fetch.await
  }

  /// Refetch a known key now, joining a fetch already in flight.
  ///
  /// `None` if the key has never been fetched.
  pub async fn refetch(&self, key: &QueryKey) -> Option<FetchResult> {
    let fetch = self.trigger(key)?;
    Some(fetch.await)
  }

  /// Mark every entry under `prefix` stale.
  ///
  /// Entries with an enabled subscriber refetch right away, superseding any
  /// fetch in flight; the rest refetch on their next mount. Returns the number of
  /// matched entries.
  pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
    let mut entries = self.entries();
    let mut matched = 0;
    let mut refetched = 0;

    for (key, entry) in entries
      .range_mut(prefix.clone()..)
      .take_while(|(k, _)| k.starts_with(prefix))
    {
      matched += 1;
      entry.epoch += 1;
      entry.invalidated = true;
      entry.state.send_modify(|s| s.is_invalidated = true);

      if entry.active > 0 {
        if let Some(fetcher) = entry.fetcher.clone() {
          drop(self.start_fetch(key, entry, fetcher));
          refetched += 1;
        }
      }
    }

    info!(prefix = %prefix, matched, refetched, "invalidated queries");
    matched
  }

  pub fn get_query_data(&self, key: &QueryKey) -> Option<Arc<Value>> {
    self
      .entries()
      .get(key)
      .and_then(|e| e.state.borrow().data.clone())
  }

  /// Write a payload directly, as if a fetch had just returned it.
  pub fn set_query_data(&self, key: &QueryKey, data: Value) {
    let data = Arc::new(data);
    {
      let mut entries = self.entries();
      let entry = entries.entry(key.clone()).or_insert_with(|| self.new_entry());
      entry.updated_at = Some(Instant::now());
      entry.invalidated = false;
      entry.state.send_modify(|s| {
        s.status = QueryStatus::Success;
        s.data = Some(data.clone());
        s.error = None;
        s.data_updated_at = Some(Utc::now());
        s.is_invalidated = false;
      });
      if entry.observers == 0 {
        self.schedule_gc(key, entry);
      }
    }
    self.persist(key, &data);
  }

  /// Current snapshot of one entry.
  pub fn state(&self, key: &QueryKey) -> Option<QueryState> {
    self.entries().get(key).map(|e| e.state.borrow().clone())
  }

  pub fn is_fetching(&self, key: &QueryKey) -> bool {
    self
      .entries()
      .get(key)
      .map(|e| e.in_flight.is_some())
      .unwrap_or(false)
  }

  pub fn observer_count(&self, key: &QueryKey) -> usize {
    self.entries().get(key).map(|e| e.observers).unwrap_or(0)
  }

  pub fn keys(&self) -> Vec<QueryKey> {
    self.entries().keys().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries().is_empty()
  }

  /// Drop every entry under `prefix`, in memory and in storage.
  /// Subscribers of removed entries stop receiving updates.
  pub fn remove_queries(&self, prefix: &QueryKey) -> usize {
    let removed = {
      let mut entries = self.entries();
      let doomed: Vec<QueryKey> = entries
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, _)| k.clone())
        .collect();
      for key in &doomed {
        entries.remove(key);
      }
      doomed.len()
    };
    if let Err(e) = self.inner.storage.remove_prefix(prefix) {
      warn!(prefix = %prefix, error = %e, "failed to remove persisted queries");
    }
    debug!(prefix = %prefix, removed, "removed queries");
    removed
  }

  /// Drop every in-memory entry. Persisted results are kept.
  pub fn clear(&self) {
    self.entries().clear();
  }

  /// Load persisted results as stale entries.
  ///
  /// Keys already in memory are left alone. Returns the number loaded.
  pub fn hydrate(&self) -> color_eyre::Result<usize> {
    let persisted = self.inner.storage.load_all()?;
    let mut entries = self.entries();
    let mut loaded = 0;

    for query in persisted {
      if entries.contains_key(&query.key) {
        continue;
      }
      let mut entry = self.new_entry();
      entry.invalidated = true;
      entry.state.send_modify(|s| {
        s.status = QueryStatus::Success;
        s.data = Some(Arc::new(query.data));
        s.data_updated_at = Some(query.cached_at);
        s.is_invalidated = true;
      });
      self.schedule_gc(&query.key, &mut entry);
      entries.insert(query.key, entry);
      loaded += 1;
    }

    debug!(loaded, "hydrated query cache");
    Ok(loaded)
  }

  // ==========================================================================
  // Observer bookkeeping
  // ==========================================================================

  /// Register an observer. Returns the id of the entry it joined, which
  /// later bookkeeping calls must pass back.
  pub(super) fn subscribe(
    &self,
    key: &QueryKey,
    fetcher: Fetcher,
    enabled: bool,
  ) -> (u64, watch::Receiver<QueryState>) {
    let mut entries = self.entries();
    let entry = entries.entry(key.clone()).or_insert_with(|| self.new_entry());
    entry.observers += 1;
    if enabled {
      entry.active += 1;
    }
    entry.gc_generation += 1;
    entry.fetcher = Some(fetcher);
    (entry.id, entry.state.subscribe())
  }

  /// The entry `entry_id` was subscribed to, if it is still cached.
  fn subscribed<'a>(
    entries: &'a mut BTreeMap<QueryKey, Entry>,
    key: &QueryKey,
    entry_id: u64,
  ) -> Option<&'a mut Entry> {
    entries.get_mut(key).filter(|e| e.id == entry_id)
  }

  pub(super) fn unsubscribe(&self, key: &QueryKey, entry_id: u64, enabled: bool) {
    let mut entries = self.entries();
    // A replacement entry under the same key has its own observers
    if let Some(entry) = Self::subscribed(&mut entries, key, entry_id) {
      entry.observers = entry.observers.saturating_sub(1);
      if enabled {
        entry.active = entry.active.saturating_sub(1);
      }
      if entry.observers == 0 {
        self.schedule_gc(key, entry);
      }
    }
  }

  pub(super) fn set_active(&self, key: &QueryKey, entry_id: u64, enabled: bool) {
    let mut entries = self.entries();
    if let Some(entry) = Self::subscribed(&mut entries, key, entry_id) {
      if enabled {
        entry.active += 1;
      } else {
        entry.active = entry.active.saturating_sub(1);
      }
    }
  }

  /// Fetch on mount unless the entry is fresh or already fetching.
  pub(super) fn ensure(&self, key: &QueryKey, entry_id: u64, stale_time: Duration) -> bool {
    let mut entries = self.entries();
    let Some(entry) = Self::subscribed(&mut entries, key, entry_id) else {
      return false;
    };
    if entry.in_flight.is_some() || entry.fresh_data(stale_time).is_some() {
      return false;
    }
    let Some(fetcher) = entry.fetcher.clone() else {
      return false;
    };
    drop(self.start_fetch(key, entry, fetcher));
    true
  }

  /// Start a fetch unless one is in flight; return whichever runs.
  pub(super) fn trigger(&self, key: &QueryKey) -> Option<SharedFetch> {
    let mut entries = self.entries();
    let entry = entries.get_mut(key)?;
    if let Some((_, fetch)) = &entry.in_flight {
      return Some(fetch.clone());
    }
    let fetcher = entry.fetcher.clone()?;
    Some(self.start_fetch(key, entry, fetcher))
  }

  // ==========================================================================
  // Fetch lifecycle
  // ==========================================================================

  fn start_fetch(&self, key: &QueryKey, entry: &mut Entry, fetcher: Fetcher) -> SharedFetch {
    let id = self.inner.fetch_ids.fetch_add(1, Ordering::Relaxed);
    let epoch = entry.epoch;
    let client = Arc::downgrade(&self.inner);
    let settle_key = key.clone();

    let fetch: BoxFuture<'static, FetchResult> = async move {
      let result = fetcher().await;
      match client.upgrade() {
        Some(inner) => QueryClient { inner }.settle(&settle_key, id, epoch, result),
        None => result.map(Arc::new).map_err(Arc::new),
      }
    }
    .boxed();
    let fetch = fetch.shared();

    entry.in_flight = Some((id, fetch.clone()));
    entry.state.send_modify(|s| s.status = QueryStatus::Loading);

    // Runs to completion even if every waiter goes away
    tokio::spawn(fetch.clone());
    debug!(key = %key, fetch = id, "fetch started");

    fetch
  }

  fn settle(&self, key: &QueryKey, id: u64, epoch: u64, result: Result<Value, ApiError>) -> FetchResult {
    let result: FetchResult = result.map(Arc::new).map_err(Arc::new);

    let persist = {
      let mut entries = self.entries();
      let Some(entry) = entries.get_mut(key) else {
        debug!(key = %key, fetch = id, "entry gone before fetch settled");
        return result;
      };
      if !matches!(&entry.in_flight, Some((current, _)) if *current == id) {
        debug!(key = %key, fetch = id, "fetch superseded");
        return result;
      }
      entry.in_flight = None;

      let persist = match &result {
        Ok(data) => {
          entry.updated_at = Some(Instant::now());
          // An invalidation that raced this fetch still stands
          entry.invalidated = entry.epoch != epoch;
          let invalidated = entry.invalidated;
          entry.state.send_modify(|s| {
            s.status = QueryStatus::Success;
            s.data = Some(data.clone());
            s.error = None;
            s.data_updated_at = Some(Utc::now());
            s.is_invalidated = invalidated;
          });
          debug!(key = %key, fetch = id, "fetch succeeded");
          Some(data.clone())
        }
        Err(err) => {
          entry.state.send_modify(|s| {
            s.status = QueryStatus::Error;
            s.error = Some(err.clone());
          });
          debug!(key = %key, fetch = id, error = %err, "fetch failed");
          None
        }
      };

      if entry.observers == 0 {
        self.schedule_gc(key, entry);
      }
      persist
    };

    if let Some(data) = persist {
      self.persist(key, &data);
    }
    result
  }

  fn persist(&self, key: &QueryKey, data: &Value) {
    if let Err(e) = self.inner.storage.store(key, data) {
      warn!(key = %key, error = %e, "failed to persist query result");
    }
  }

  fn schedule_gc(&self, key: &QueryKey, entry: &mut Entry) {
    entry.gc_generation += 1;
    let generation = entry.gc_generation;

    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
      return;
    };
    let client = Arc::downgrade(&self.inner);
    let key = key.clone();
    let gc_time = self.inner.defaults.gc_time;

    runtime.spawn(async move {
      tokio::time::sleep(gc_time).await;
      if let Some(inner) = client.upgrade() {
        QueryClient { inner }.collect(&key, generation);
      }
    });
  }

  fn collect(&self, key: &QueryKey, generation: u64) {
    let mut entries = self.entries();
    let unused = entries
      .get(key)
      .map(|e| e.observers == 0 && e.gc_generation == generation && e.in_flight.is_none())
      .unwrap_or(false);
    if unused {
      entries.remove(key);
      debug!(key = %key, "garbage collected");
    }
  }
}

impl std::fmt::Debug for QueryClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryClient")
      .field("defaults", &self.inner.defaults)
      .field("entries", &self.len())
      .finish_non_exhaustive()
  }
}
