use thiserror::Error;

/// Errors from calling a downstream service.
#[derive(Debug, Error)]
pub enum InvokeError {
  /// The HTTP client could not be constructed.
  #[error("failed to build http client: {0}")]
  Client(#[source] reqwest::Error),

  /// The request could not be sent or no response arrived.
  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The response body could not be read.
  #[error("failed to read response from {url}: {source}")]
  Body {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The service could not be reached for a reason outside HTTP.
  #[error("service {url} unavailable: {message}")]
  Unavailable { url: String, message: String },
}

impl InvokeError {
  /// Create an unavailable error (used by non-HTTP invokers).
  pub fn unavailable(url: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Unavailable {
      url: url.into(),
      message: message.into(),
    }
  }
}
