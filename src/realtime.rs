//! Server-pushed notification events.
//!
//! The socket connection itself is not handled here: anything that yields
//! decoded [`NotificationEvent`]s can drive a [`NotificationListener`].

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::hooks::keys;
use crate::query::QueryClient;

/// One `notification` event as the server pushes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
  /// ORDER, RFQ, WALLET, SYSTEM
  #[serde(rename = "type", default)]
  pub kind: Option<String>,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
  #[serde(default)]
  pub data: Value,
}

impl NotificationEvent {
  /// Decode one JSON text frame.
  pub fn decode(frame: &str) -> Result<Self, ApiError> {
    Ok(serde_json::from_str(frame)?)
  }
}

type ToastFn = Box<dyn Fn(&NotificationEvent) + Send + Sync>;

/// Keeps notification queries current as events arrive.
pub struct NotificationListener {
  queries: QueryClient,
  on_toast: Option<ToastFn>,
}

impl NotificationListener {
  pub fn new(queries: QueryClient) -> Self {
    Self {
      queries,
      on_toast: None,
    }
  }

  /// Called for every event that carries a title.
  pub fn on_toast(mut self, toast: impl Fn(&NotificationEvent) + Send + Sync + 'static) -> Self {
    self.on_toast = Some(Box::new(toast));
    self
  }

  pub fn handle(&self, event: &NotificationEvent) {
    info!(kind = ?event.kind, "notification received");
    self.queries.invalidate_queries(&keys::notification::all());

    if event.title.is_some() {
      if let Some(toast) = &self.on_toast {
        toast(event);
      }
    }
  }

  /// Handle events until the stream ends. Returns how many were handled.
  pub async fn run<S>(&self, events: S) -> usize
  where
    S: Stream<Item = NotificationEvent>,
  {
    let mut events = std::pin::pin!(events);
    let mut handled = 0;
    while let Some(event) = events.next().await {
      self.handle(&event);
      handled += 1;
    }
    debug!(handled, "notification stream ended");
    handled
  }
}

impl std::fmt::Debug for NotificationListener {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NotificationListener")
      .field("toast", &self.on_toast.is_some())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::NotificationFilter;
  use serde_json::json;
  use std::sync::{Arc, Mutex};

  #[test]
  fn test_decode_frame() {
    let event = NotificationEvent::decode(
      r##"{"type":"ORDER","title":"Order shipped","message":"#1042 is on its way","data":{"orderId":1042}}"##,
    )
    .unwrap();
    assert_eq!(event.kind.as_deref(), Some("ORDER"));
    assert_eq!(event.data["orderId"], json!(1042));

    let bare = NotificationEvent::decode("{}").unwrap();
    assert!(bare.title.is_none());
    assert!(bare.data.is_null());

    assert!(NotificationEvent::decode("not json").is_err());
  }

  #[tokio::test]
  async fn test_events_invalidate_and_toast() {
    let queries = QueryClient::default();
    let list = keys::notification::list(&NotificationFilter::default());
    queries.set_query_data(&keys::notification::unread_count(), json!({"count": 0}));
    queries.set_query_data(&list, json!([]));
    queries.set_query_data(&keys::wallet::balance(), json!({}));

    let toasts = Arc::new(Mutex::new(Vec::new()));
    let sink = toasts.clone();
    let listener = NotificationListener::new(queries.clone())
      .on_toast(move |event| sink.lock().unwrap().push(event.title.clone().unwrap_or_default()));

    let events = futures::stream::iter(vec![
      NotificationEvent::decode(r#"{"type":"RFQ","title":"New quote"}"#).unwrap(),
      NotificationEvent::decode(r#"{"type":"SYSTEM"}"#).unwrap(),
    ]);
    assert_eq!(listener.run(events).await, 2);

    assert_eq!(*toasts.lock().unwrap(), vec!["New quote".to_string()]);
    assert!(queries.state(&keys::notification::unread_count()).unwrap().is_invalidated);
    assert!(queries.state(&list).unwrap().is_invalidated);
    assert!(!queries.state(&keys::wallet::balance()).unwrap().is_invalidated);
  }
}
