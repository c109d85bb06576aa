//! The HTTP seam. Everything above this only sees `HttpRequest`/`HttpResponse`.

use futures::future::BoxFuture;
use reqwest::Method;
use std::time::Duration;
use url::Url;

use crate::error::ApiError;

/// A fully resolved request: absolute URL, headers and encoded body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub method: Method,
  pub url: Url,
  pub headers: Vec<(&'static str, String)>,
  pub body: Option<Vec<u8>>,
}

impl HttpRequest {
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

/// Executes one HTTP call. Implementations must not retry.
pub trait Transport: Send + Sync {
  fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ApiError>>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  pub fn new(timeout: Option<Duration>) -> Result<Self, ApiError> {
    let mut builder = reqwest::Client::builder().user_agent(concat!("mercato/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    Ok(Self {
      client: builder.build()?,
    })
  }
}

impl Transport for HttpTransport {
  fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ApiError>> {
    Box::pin(async move {
      let mut builder = self.client.request(request.method, request.url);
      for (name, value) in request.headers {
        builder = builder.header(name, value);
      }
      if let Some(body) = request.body {
        builder = builder.body(body);
      }

      let response = builder.send().await?;
      let status = response.status().as_u16();
      let body = response.bytes().await?.to_vec();

      Ok(HttpResponse { status, body })
    })
  }
}
