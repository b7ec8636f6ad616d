use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::ServiceInvoker;
use crate::error::InvokeError;

/// Transport settings for [`HttpInvoker`].
#[derive(Debug, Clone, Default)]
pub struct InvokerConfig {
  /// Total time allowed per call. `None` waits forever.
  pub timeout: Option<Duration>,
  /// Time allowed to establish a connection.
  pub connect_timeout: Option<Duration>,
}

/// Calls downstream services with `POST` and a JSON content type.
#[derive(Debug, Clone)]
pub struct HttpInvoker {
  client: reqwest::Client,
}

impl HttpInvoker {
  pub fn new(config: InvokerConfig) -> Result<Self, InvokeError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.timeout {
      builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout {
      builder = builder.connect_timeout(connect_timeout);
    }

    let client = builder.build().map_err(InvokeError::Client)?;
    Ok(Self { client })
  }
}

#[async_trait]
impl ServiceInvoker for HttpInvoker {
  async fn invoke(&self, url: &str, payload: Bytes) -> Result<Bytes, InvokeError> {
    debug!(url = %url, bytes = payload.len(), "service_request");

    let response = self
      .client
      .post(url)
      .header(CONTENT_TYPE, "application/json")
      .body(payload)
      .send()
      .await
      .map_err(|source| InvokeError::Request {
        url: url.to_string(),
        source,
      })?;

    // Error statuses still carry a body the caller may want to see.
    let status = response.status();
    if !status.is_success() {
      warn!(url = %url, status = %status, "service_error_status");
    }

    let body = response.bytes().await.map_err(|source| InvokeError::Body {
      url: url.to_string(),
      source,
    })?;

    debug!(url = %url, status = %status, bytes = body.len(), "service_response");
    Ok(body)
  }
}
