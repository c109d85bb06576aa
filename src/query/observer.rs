use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::client::{FetchResult, Fetcher, QueryClient};
use super::key::QueryKey;
use super::state::QueryState;

/// Per-subscriber options.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
  /// A disabled observer issues no requests
  pub enabled: bool,
  /// Overrides the client's default stale time
  pub stale_time: Option<Duration>,
  /// Poll period while mounted and enabled
  pub refetch_interval: Option<Duration>,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      enabled: true,
      stale_time: None,
      refetch_interval: None,
    }
  }
}

impl QueryOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  pub fn stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = Some(stale_time);
    self
  }

  pub fn refetch_interval(mut self, period: Duration) -> Self {
    self.refetch_interval = Some(period);
    self
  }
}

/// A mounted subscription to one cache entry.
///
/// Holding an observer keeps the entry alive; dropping it unmounts,
/// stops polling and lets the entry be collected after the GC delay.
pub struct QueryObserver {
  client: QueryClient,
  key: QueryKey,
  /// Id of the cache entry this observer is counted on
  entry: u64,
  options: QueryOptions,
  receiver: watch::Receiver<QueryState>,
  poller: Option<JoinHandle<()>>,
}

impl QueryClient {
  /// Subscribe to `key`, fetching on mount when enabled and not fresh.
  pub fn observe(&self, key: QueryKey, fetcher: Fetcher, options: QueryOptions) -> QueryObserver {
    let (entry, receiver) = self.subscribe(&key, fetcher, options.enabled);
    let mut observer = QueryObserver {
      client: self.clone(),
      key,
      entry,
      options,
      receiver,
      poller: None,
    };
    if observer.options.enabled {
      observer.mount();
    }
    observer
  }
}

impl QueryObserver {
  fn mount(&mut self) {
    let stale_time = self
      .options
      .stale_time
      .unwrap_or(self.client.defaults().stale_time);
    if self.client.ensure(&self.key, self.entry, stale_time) {
      debug!(key = %self.key, "fetching on mount");
    }

    if let Some(period) = self.options.refetch_interval {
      self.poller = Some(self.spawn_poller(period));
    }
  }

  fn spawn_poller(&self, period: Duration) -> JoinHandle<()> {
    let client = self.client.clone();
    let key = self.key.clone();

    tokio::spawn(async move {
      let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
      ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticks.tick().await;
        debug!(key = %key, "polling");
        drop(client.trigger(&key));
      }
    })
  }

  /// Toggle fetching. Enabling mounts (fetch if stale, start polling);
  /// disabling stops polling but keeps the subscription and its data.
  pub fn set_enabled(&mut self, enabled: bool) {
    if enabled == self.options.enabled {
      return;
    }
    self.options.enabled = enabled;
    self.client.set_active(&self.key, self.entry, enabled);
    if enabled {
      self.mount();
    } else if let Some(poller) = self.poller.take() {
      poller.abort();
    }
  }

  pub fn is_enabled(&self) -> bool {
    self.options.enabled
  }

  pub fn key(&self) -> &QueryKey {
    &self.key
  }

  pub fn options(&self) -> &QueryOptions {
    &self.options
  }

  pub fn state(&self) -> QueryState {
    self.receiver.borrow().clone()
  }

  pub fn data(&self) -> Option<Arc<Value>> {
    self.receiver.borrow().data.clone()
  }

  pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
    self.receiver.borrow().data_as()
  }

  /// The new state if it changed since last seen, without waiting.
  pub fn poll(&mut self) -> Option<QueryState> {
    match self.receiver.has_changed() {
      Ok(true) => Some(self.receiver.borrow_and_update().clone()),
      _ => None,
    }
  }

  /// Wait for the next change. `None` once the entry has been removed.
  pub async fn changed(&mut self) -> Option<QueryState> {
    self.receiver.changed().await.ok()?;
    Some(self.receiver.borrow_and_update().clone())
  }

  /// Wait until the entry holds a success or an error.
  ///
  /// Never resolves for a disabled observer on an entry nobody fetches.
  pub async fn settled(&mut self) -> Option<QueryState> {
    let state = self.receiver.wait_for(QueryState::is_settled).await.ok()?;
    Some(state.clone())
  }

  /// Refetch now regardless of staleness, joining a fetch in flight.
  pub async fn refetch(&self) -> Option<FetchResult> {
    self.client.refetch(&self.key).await
  }
}

impl Drop for QueryObserver {
  fn drop(&mut self) {
    if let Some(poller) = self.poller.take() {
      poller.abort();
    }
    self.client.unsubscribe(&self.key, self.entry, self.options.enabled);
  }
}

impl std::fmt::Debug for QueryObserver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryObserver")
      .field("key", &self.key)
      .field("options", &self.options)
      .finish_non_exhaustive()
  }
}
