//! Recording transport for tests.

use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::ApiError;

use super::transport::{HttpRequest, HttpResponse, Transport};

type Responder = Box<dyn Fn(usize) -> Result<(u16, Value), ApiError> + Send + Sync>;

/// Answers by `(method, path)` and records every request it sees.
///
/// Unknown routes answer 404.
#[derive(Default)]
pub struct FakeTransport {
  routes: Mutex<HashMap<(String, String), Responder>>,
  calls: Mutex<HashMap<(String, String), usize>>,
  requests: Mutex<Vec<HttpRequest>>,
  delay: Mutex<Option<Duration>>,
}

impl FakeTransport {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
    self.respond_with(method, path, move |_| Ok((status, body.clone())));
  }

  /// Route whose answer depends on how many times it was called before.
  pub fn respond_with<F>(&self, method: &str, path: &str, f: F)
  where
    F: Fn(usize) -> Result<(u16, Value), ApiError> + Send + Sync + 'static,
  {
    self
      .routes
      .lock()
      .unwrap()
      .insert((method.to_string(), path.to_string()), Box::new(f));
  }

  pub fn fail(&self, method: &str, path: &str, message: &str) {
    let message = message.to_string();
    self.respond_with(method, path, move |_| Err(ApiError::Transport(message.clone())));
  }

  /// Hold every response for `delay` before answering.
  pub fn set_delay(&self, delay: Duration) {
    *self.delay.lock().unwrap() = Some(delay);
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn calls(&self, method: &str, path: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .get(&(method.to_string(), path.to_string()))
      .copied()
      .unwrap_or(0)
  }
}

impl Transport for FakeTransport {
  fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ApiError>> {
    Box::pin(async move {
      let route = (request.method.to_string(), request.url.path().to_string());
      let index = {
        let mut calls = self.calls.lock().unwrap();
        let count = calls.entry(route.clone()).or_insert(0);
        *count += 1;
        *count - 1
      };
      self.requests.lock().unwrap().push(request);

      let delay = *self.delay.lock().unwrap();
      if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
      }

      let answer = match self.routes.lock().unwrap().get(&route) {
        Some(responder) => responder(index),
        None => Ok((404, json!({"status": false, "message": "Not found"}))),
      };

      let (status, body) = answer?;
      Ok(HttpResponse {
        status,
        body: serde_json::to_vec(&body)?,
      })
    })
  }
}

/// A client pointed at `https://api.example.com/api/v1` with a signed-in jar.
pub fn client(transport: &Arc<FakeTransport>) -> super::ApiClient {
  let jar = crate::auth::CookieJar::in_memory();
  jar.set_transient("accessToken", "test-token");
  super::ApiClient::with_transport("https://api.example.com/api/v1", transport.clone(), jar, "accessToken")
    .expect("valid base url")
}

/// The decoded JSON body of a recorded request.
pub fn body_of(request: &HttpRequest) -> Value {
  request
    .body
    .as_deref()
    .map(|b| serde_json::from_slice(b).expect("json body"))
    .unwrap_or(Value::Null)
}
