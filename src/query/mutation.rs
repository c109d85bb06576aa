//! Write operations bound to the cache.
//!
//! A [`Mutation`] wraps one request function together with the key prefixes
//! it makes stale. Invalidation runs only after the request has succeeded.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ApiError;

use super::client::QueryClient;
use super::key::QueryKey;
use super::state::{MutationState, QueryStatus};

type MutateFn<P> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<Value, ApiError>> + Send + Sync>;
type SuccessHook = Arc<dyn Fn(&Value) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&ApiError) + Send + Sync>;

pub struct Mutation<P> {
  client: QueryClient,
  mutate_fn: MutateFn<P>,
  invalidates: Vec<QueryKey>,
  on_success: Vec<SuccessHook>,
  on_error: Vec<ErrorHook>,
  state: Arc<watch::Sender<MutationState>>,
}

impl<P> Clone for Mutation<P> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      mutate_fn: self.mutate_fn.clone(),
      invalidates: self.invalidates.clone(),
      on_success: self.on_success.clone(),
      on_error: self.on_error.clone(),
      state: self.state.clone(),
    }
  }
}

impl<P: Send + 'static> Mutation<P> {
  pub fn new<F, Fut>(client: &QueryClient, mutate_fn: F) -> Self
  where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
  {
    let (state, _) = watch::channel(MutationState::default());
    Self {
      client: client.clone(),
      mutate_fn: Arc::new(move |params: P| mutate_fn(params).boxed()),
      invalidates: Vec::new(),
      on_success: Vec::new(),
      on_error: Vec::new(),
      state: Arc::new(state),
    }
  }

  /// Mark every query under `prefix` stale once the request succeeds.
  pub fn invalidates(mut self, prefix: QueryKey) -> Self {
    self.invalidates.push(prefix);
    self
  }

  /// Called with the response body after invalidation.
  pub fn on_success(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
    self.on_success.push(Arc::new(hook));
    self
  }

  /// Called with the failure; the server message is intact.
  pub fn on_error(mut self, hook: impl Fn(&ApiError) + Send + Sync + 'static) -> Self {
    self.on_error.push(Arc::new(hook));
    self
  }

  pub fn prefixes(&self) -> &[QueryKey] {
    &self.invalidates
  }

  pub fn state(&self) -> MutationState {
    self.state.borrow().clone()
  }

  pub fn subscribe(&self) -> watch::Receiver<MutationState> {
    self.state.subscribe()
  }

  /// Run the request once.
  pub async fn mutate(&self, params: P) -> Result<Value, ApiError> {
    self.state.send_replace(MutationState {
      status: QueryStatus::Loading,
      ..Default::default()
    });

    match (self.mutate_fn)(params).await {
      Ok(data) => {
        for prefix in &self.invalidates {
          self.client.invalidate_queries(prefix);
        }

        let data = Arc::new(data);
        self.state.send_replace(MutationState {
          status: QueryStatus::Success,
          data: Some(data.clone()),
          error: None,
        });
        for hook in &self.on_success {
          hook(&data);
        }
        debug!(invalidated = self.invalidates.len(), "mutation succeeded");
        Ok(data.as_ref().clone())
      }
      Err(err) => {
        warn!(error = %err, "mutation failed");
        self.state.send_replace(MutationState {
          status: QueryStatus::Error,
          data: None,
          error: Some(Arc::new(err.clone())),
        });
        for hook in &self.on_error {
          hook(&err);
        }
        Err(err)
      }
    }
  }
}

impl<P> std::fmt::Debug for Mutation<P> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Mutation")
      .field("invalidates", &self.invalidates)
      .field("state", &*self.state.borrow())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query_key;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;
  use std::time::Duration;

  #[tokio::test]
  async fn test_success_invalidates_after_response() {
    let client = QueryClient::default();
    let list = query_key!["address", "list"];
    client.set_query_data(&list, json!([]));

    let successes = Arc::new(AtomicUsize::new(0));
    let counter = successes.clone();
    let add = Mutation::new(&client, |name: String| async move {
      tokio::time::sleep(Duration::from_millis(30)).await;
      Ok(json!({"status": true, "data": {"name": name}}))
    })
    .invalidates(query_key!["address"])
    .on_success(move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
    });

    let pending = {
      let add = add.clone();
      tokio::spawn(async move { add.mutate("Home".to_string()).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(add.state().is_loading());
    assert!(!client.state(&list).unwrap().is_invalidated);

    let body = pending.await.unwrap().unwrap();
    assert_eq!(body["data"]["name"], json!("Home"));
    assert!(client.state(&list).unwrap().is_invalidated);
    assert!(add.state().is_success());
    assert_eq!(successes.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_error_reaches_hook_without_invalidating() {
    let client = QueryClient::default();
    let balance = query_key!["wallet", "balance"];
    client.set_query_data(&balance, json!({"balance": 10}));

    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let withdraw = Mutation::new(&client, |_amount: f64| async {
      Err(ApiError::from_response(
        400,
        json!({"status": false, "message": "Insufficient balance"}),
      ))
    })
    .invalidates(query_key!["wallet"])
    .on_error(move |err| {
      *sink.lock().unwrap() = Some(err.message());
    });

    let err = withdraw.mutate(500.0).await.unwrap_err();

    assert_eq!(err.message(), "Insufficient balance");
    assert_eq!(seen.lock().unwrap().as_deref(), Some("Insufficient balance"));
    assert!(!client.state(&balance).unwrap().is_invalidated);
    assert!(withdraw.state().is_error());
  }

  #[tokio::test]
  async fn test_multiple_prefixes() {
    let client = QueryClient::default();
    for key in [
      query_key!["product", "list"],
      query_key!["product", "seller"],
      query_key!["dropship", "products"],
      query_key!["order", "list"],
    ] {
      client.set_query_data(&key, json!([]));
    }

    let create = Mutation::new(&client, |_: ()| async { Ok(json!({"status": true})) })
      .invalidates(query_key!["product"])
      .invalidates(query_key!["dropship"]);
    assert_eq!(create.prefixes().len(), 2);

    create.mutate(()).await.unwrap();

    assert!(client.state(&query_key!["product", "list"]).unwrap().is_invalidated);
    assert!(client.state(&query_key!["product", "seller"]).unwrap().is_invalidated);
    assert!(client.state(&query_key!["dropship", "products"]).unwrap().is_invalidated);
    assert!(!client.state(&query_key!["order", "list"]).unwrap().is_invalidated);
  }
}
