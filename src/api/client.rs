use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::auth::CookieJar;
use crate::config::Config;
use crate::error::ApiError;

use super::transport::{HttpRequest, HttpTransport, Transport};

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Authenticated,
  Public,
}

/// A request relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  pub method: Method,
  pub path: String,
  pub query: Vec<(String, String)>,
  pub body: Option<Value>,
  pub access: Access,
}

impl ApiRequest {
  pub fn new(method: Method, path: impl Into<String>) -> Self {
    Self {
      method,
      path: path.into(),
      query: Vec::new(),
      body: None,
      access: Access::Authenticated,
    }
  }

  pub fn get(path: impl Into<String>) -> Self {
    Self::new(Method::GET, path)
  }

  pub fn post(path: impl Into<String>) -> Self {
    Self::new(Method::POST, path)
  }

  pub fn put(path: impl Into<String>) -> Self {
    Self::new(Method::PUT, path)
  }

  pub fn patch(path: impl Into<String>) -> Self {
    Self::new(Method::PATCH, path)
  }

  pub fn delete(path: impl Into<String>) -> Self {
    Self::new(Method::DELETE, path)
  }

  /// Append query-string parameters from a plain object.
  ///
  /// `null` members are skipped and arrays repeat their key.
  pub fn query<P: Serialize + ?Sized>(mut self, params: &P) -> Result<Self, ApiError> {
    self.query.extend(encode_query(&serde_json::to_value(params)?));
    Ok(self)
  }

  pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
    self.body = Some(serde_json::to_value(body)?);
    Ok(self)
  }

  /// Send without the bearer token even when one is available.
  pub fn public(mut self) -> Self {
    self.access = Access::Public;
    self
  }
}

fn encode_query(params: &Value) -> Vec<(String, String)> {
  let Value::Object(map) = params else {
    return Vec::new();
  };

  let mut pairs = Vec::new();
  for (name, value) in map {
    match value {
      Value::Null => {}
      Value::Array(items) => {
        for item in items.iter().filter(|i| !i.is_null()) {
          pairs.push((name.clone(), scalar_to_string(item)));
        }
      }
      other => pairs.push((name.clone(), scalar_to_string(other))),
    }
  }
  pairs
}

fn scalar_to_string(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// The raw response of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
  pub status: u16,
  pub body: Value,
}

impl ApiResponse {
  /// The full response body (`{status, message, data, ...}`).
  pub fn into_body(self) -> Value {
    self.body
  }

  /// The body's `data` member, `Null` if absent.
  pub fn data(&self) -> &Value {
    self.body.get("data").unwrap_or(&Value::Null)
  }

  pub fn message(&self) -> Option<&str> {
    self.body.get("message").and_then(Value::as_str)
  }
}

/// Marketplace REST client.
///
/// Every resource module adds its request functions to this type; each one
/// issues exactly one HTTP call through `send`.
#[derive(Clone)]
pub struct ApiClient {
  base_url: Url,
  transport: Arc<dyn Transport>,
  cookies: CookieJar,
  token_cookie: String,
}

impl ApiClient {
  pub fn new(config: &Config, cookies: CookieJar) -> Result<Self, ApiError> {
    let transport = HttpTransport::new(config.api.timeout_secs.map(Duration::from_secs))?;
    Self::with_transport(
      &config.api.base_url,
      Arc::new(transport),
      cookies,
      &config.auth.token_cookie,
    )
  }

  pub fn with_transport(
    base_url: &str,
    transport: Arc<dyn Transport>,
    cookies: CookieJar,
    token_cookie: &str,
  ) -> Result<Self, ApiError> {
    // Url::join drops the last segment unless the base ends with '/'
    let base_url = if base_url.ends_with('/') {
      Url::parse(base_url)?
    } else {
      Url::parse(&format!("{}/", base_url))?
    };

    Ok(Self {
      base_url,
      transport,
      cookies,
      token_cookie: token_cookie.to_string(),
    })
  }

  pub fn cookies(&self) -> &CookieJar {
    &self.cookies
  }

  pub fn token_cookie(&self) -> &str {
    &self.token_cookie
  }

  /// Resolve a request into what goes over the wire.
  pub fn prepare(&self, request: ApiRequest) -> Result<HttpRequest, ApiError> {
    let mut url = self.base_url.join(request.path.trim_start_matches('/'))?;
    if !request.query.is_empty() {
      url.query_pairs_mut().extend_pairs(request.query.iter());
    }

    let mut headers = vec![
      ("Content-Type", "application/json".to_string()),
      ("Accept", "application/json".to_string()),
    ];

    if request.access == Access::Authenticated {
      // Read per request so login/logout apply immediately
      if let Some(token) = self.cookies.get(&self.token_cookie) {
        headers.push(("Authorization", format!("Bearer {}", token)));
      }
    }

    let body = match &request.body {
      Some(body) => Some(serde_json::to_vec(body)?),
      None => None,
    };

    Ok(HttpRequest {
      method: request.method,
      url,
      headers,
      body,
    })
  }

  /// Issue one call and classify the response.
  pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
    let request = self.prepare(request)?;
    debug!(method = %request.method, url = %request.url, "api request");

    let response = self.transport.execute(request).await?;

    let body = if response.body.is_empty() {
      Value::Null
    } else if (200..300).contains(&response.status) {
      serde_json::from_slice(&response.body)?
    } else {
      // Error pages are not always JSON; keep whatever we can
      serde_json::from_slice(&response.body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&response.body).into_owned()))
    };

    if !(200..300).contains(&response.status) {
      debug!(status = response.status, "api request failed");
      return Err(ApiError::from_response(response.status, body));
    }

    Ok(ApiResponse {
      status: response.status,
      body,
    })
  }
}

impl std::fmt::Debug for ApiClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiClient")
      .field("base_url", &self.base_url.as_str())
      .field("token_cookie", &self.token_cookie)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::FakeTransport;
  use serde_json::json;

  fn client(transport: &Arc<FakeTransport>, jar: CookieJar) -> ApiClient {
    ApiClient::with_transport("https://api.example.com/api/v1", transport.clone(), jar, "accessToken").unwrap()
  }

  #[tokio::test]
  async fn test_authenticated_request_carries_bearer() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/user/address", 200, json!({"status": true, "data": []}));
    let jar = CookieJar::in_memory();
    jar.set_transient("accessToken", "tok-123");

    client(&transport, jar).send(ApiRequest::get("user/address")).await.unwrap();

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].header("Authorization"), Some("Bearer tok-123"));
    assert_eq!(sent[0].header("Content-Type"), Some("application/json"));
    assert_eq!(sent[0].header("Accept"), Some("application/json"));
  }

  #[tokio::test]
  async fn test_public_request_omits_bearer() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/banner", 200, json!({"status": true, "data": []}));
    let jar = CookieJar::in_memory();
    jar.set_transient("accessToken", "tok-123");

    client(&transport, jar).send(ApiRequest::get("banner").public()).await.unwrap();

    assert_eq!(transport.requests()[0].header("Authorization"), None);
  }

  #[tokio::test]
  async fn test_missing_cookie_sends_unauthenticated() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/order", 200, json!({"status": true}));

    client(&transport, CookieJar::in_memory()).send(ApiRequest::get("order")).await.unwrap();

    assert_eq!(transport.requests()[0].header("Authorization"), None);
  }

  #[tokio::test]
  async fn test_token_read_on_every_request() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/order", 200, json!({"status": true}));
    let jar = CookieJar::in_memory();
    let api = client(&transport, jar.clone());

    api.send(ApiRequest::get("order")).await.unwrap();
    jar.set_transient("accessToken", "fresh");
    api.send(ApiRequest::get("order")).await.unwrap();

    let sent = transport.requests();
    assert_eq!(sent[0].header("Authorization"), None);
    assert_eq!(sent[1].header("Authorization"), Some("Bearer fresh"));
  }

  #[test]
  fn test_query_string_from_params() {
    #[derive(Serialize)]
    struct Params {
      page: u32,
      limit: u32,
      term: Option<String>,
      status: Vec<&'static str>,
    }

    let api = client(&FakeTransport::new(), CookieJar::in_memory());
    let request = ApiRequest::get("/product")
      .query(&Params {
        page: 2,
        limit: 10,
        term: None,
        status: vec!["ACTIVE", "DRAFT"],
      })
      .unwrap();

    let prepared = api.prepare(request).unwrap();
    assert_eq!(prepared.url.path(), "/api/v1/product");
    let pairs: Vec<(String, String)> = prepared.url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("page".into(), "2".into())));
    assert!(pairs.contains(&("limit".into(), "10".into())));
    assert!(!pairs.iter().any(|(k, _)| k == "term"));
    assert_eq!(pairs.iter().filter(|(k, _)| k == "status").count(), 2);
  }

  #[test]
  fn test_json_body_encoded() {
    let api = client(&FakeTransport::new(), CookieJar::in_memory());
    let request = ApiRequest::post("wallet/deposit").json(&json!({"amount": 50})).unwrap();
    let prepared = api.prepare(request).unwrap();
    assert_eq!(prepared.method, Method::POST);
    let body: Value = serde_json::from_slice(prepared.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"amount": 50}));
  }

  #[tokio::test]
  async fn test_non_2xx_keeps_server_message() {
    let transport = FakeTransport::new();
    transport.respond(
      "POST",
      "/api/v1/wallet/withdraw",
      400,
      json!({"status": false, "message": "Insufficient balance"}),
    );

    let err = client(&transport, CookieJar::in_memory())
      .send(ApiRequest::post("wallet/withdraw"))
      .await
      .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.message(), "Insufficient balance");
  }

  #[tokio::test]
  async fn test_transport_failure_propagates() {
    let transport = FakeTransport::new();
    transport.fail("GET", "/api/v1/order", "connection refused");

    let err = client(&transport, CookieJar::in_memory())
      .send(ApiRequest::get("order"))
      .await
      .unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
  }

  #[tokio::test]
  async fn test_response_accessors() {
    let transport = FakeTransport::new();
    transport.respond("GET", "/api/v1/wallet/balance", 200, json!({"status": true, "message": "ok", "data": {"balance": 12.5}}));

    let response = client(&transport, CookieJar::in_memory())
      .send(ApiRequest::get("wallet/balance"))
      .await
      .unwrap();

    assert_eq!(response.message(), Some("ok"));
    assert_eq!(response.data()["balance"], json!(12.5));
  }
}
