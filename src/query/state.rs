use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiError;

/// Lifecycle of a query or mutation instance.
///
/// `Loading` may be re-entered while a refetch runs; data from the previous
/// success stays available throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Nothing has been requested yet
  Idle,
  /// A request is in flight
  Loading,
  /// The last request succeeded
  Success,
  /// The last request failed
  Error,
}

/// Snapshot of one cache entry as its subscribers see it.
#[derive(Debug, Clone)]
pub struct QueryState {
  pub status: QueryStatus,
  /// Last successful payload, kept across failures and refetches
  pub data: Option<Arc<Value>>,
  /// Error of the last request, cleared by the next success
  pub error: Option<Arc<ApiError>>,
  /// When `data` was received (or written to disk, for hydrated entries)
  pub data_updated_at: Option<DateTime<Utc>>,
  /// Marked stale by an invalidation and not refetched since
  pub is_invalidated: bool,
}

impl Default for QueryState {
  fn default() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      data_updated_at: None,
      is_invalidated: false,
    }
  }
}

impl QueryState {
  pub fn is_idle(&self) -> bool {
    self.status == QueryStatus::Idle
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  /// Finished one way or the other.
  pub fn is_settled(&self) -> bool {
    self.is_success() || self.is_error()
  }

  pub fn data(&self) -> Option<&Value> {
    self.data.as_deref()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_deref()
  }

  /// Decode the payload into a concrete type.
  pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
    self
      .data
      .as_deref()
      .map(|v| T::deserialize(v))
      .transpose()
  }
}

/// State of a mutation instance.
#[derive(Debug, Clone)]
pub struct MutationState {
  pub status: QueryStatus,
  pub data: Option<Arc<Value>>,
  pub error: Option<Arc<ApiError>>,
}

impl Default for MutationState {
  fn default() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
    }
  }
}

impl MutationState {
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Deserialize;
  use serde_json::json;

  #[test]
  fn test_default_is_idle() {
    let state = QueryState::default();
    assert!(state.is_idle());
    assert!(!state.is_settled());
    assert!(state.data().is_none());
  }

  #[test]
  fn test_data_as() {
    #[derive(Deserialize)]
    struct Balance {
      balance: f64,
    }

    let state = QueryState {
      status: QueryStatus::Success,
      data: Some(Arc::new(json!({"balance": 9.5}))),
      ..Default::default()
    };
    let balance: Balance = state.data_as().unwrap().unwrap();
    assert_eq!(balance.balance, 9.5);

    assert!(QueryState::default().data_as::<Balance>().unwrap().is_none());
  }
}
