use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by request functions.
///
/// `Status` keeps the server's `message` verbatim so callers can show it
/// to the user as-is.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
  /// The request never produced an HTTP response
  #[error("network error: {0}")]
  Transport(String),

  /// The backend answered with a non-2xx status
  #[error("{message}")]
  Status {
    status: u16,
    message: String,
    body: Value,
  },

  /// The response body was not the JSON we expected
  #[error("failed to decode response: {0}")]
  Decode(String),

  #[error("invalid request url: {0}")]
  Url(#[from] url::ParseError),

  /// A query ran before the parameter it depends on was known
  #[error("missing request parameter: {0}")]
  MissingParam(&'static str),
}

impl ApiError {
  /// Build a status error from a response body, pulling out `message`.
  pub fn from_response(status: u16, body: Value) -> Self {
    let message = body
      .get("message")
      .and_then(Value::as_str)
      .map(String::from)
      .unwrap_or_else(|| format!("Request failed with status {}", status));

    Self::Status {
      status,
      message,
      body,
    }
  }

  /// HTTP status, if the backend answered at all.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// The message to show a user.
  pub fn message(&self) -> String {
    match self {
      Self::Status { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self.status(), Some(401))
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(err: serde_json::Error) -> Self {
    Self::Decode(err.to_string())
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    Self::Transport(err.to_string())
  }
}
