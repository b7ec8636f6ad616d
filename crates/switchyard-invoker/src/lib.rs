//! Switchyard Invoker
//!
//! Delivers a request payload to a downstream inference service and hands the
//! raw response bytes back to the router. The router only depends on the
//! [`ServiceInvoker`] trait; [`HttpInvoker`] is the production implementation.
//!
//! No retry policy lives here. A failed call is reported once and the router
//! decides what it means for the request.

mod error;
mod http;

use async_trait::async_trait;
use bytes::Bytes;

pub use error::InvokeError;
pub use http::{HttpInvoker, InvokerConfig};

/// Sends one payload to one downstream service.
#[async_trait]
pub trait ServiceInvoker: Send + Sync {
  /// POST `payload` to `url` and return the response body.
  async fn invoke(&self, url: &str, payload: Bytes) -> Result<Bytes, InvokeError>;
}
