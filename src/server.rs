//! HTTP front door: every `POST` is one routed request.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;
use switchyard_router::Router as GraphRouter;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Build the axum app around a graph router.
///
/// Any path other than `/health` routes the graph, and request bodies are not
/// size-limited.
pub fn app(router: Arc<GraphRouter>) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/", post(route_request))
    .route("/{*path}", post(route_request))
    .layer(DefaultBodyLimit::disable())
    .with_state(router)
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(
  bind: SocketAddr,
  router: Arc<GraphRouter>,
  shutdown: CancellationToken,
) -> anyhow::Result<()> {
  let listener = tokio::net::TcpListener::bind(bind)
    .await
    .with_context(|| format!("failed to bind {}", bind))?;

  info!(addr = %bind, nodes = router.graph().len(), "server_listening");

  axum::serve(listener, app(router))
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .context("server error")?;

  info!("server_stopped");
  Ok(())
}

async fn route_request(State(router): State<Arc<GraphRouter>>, body: Bytes) -> Response {
  match router.execute(body).await {
    Ok(response) => ([(header::CONTENT_TYPE, "application/json")], response).into_response(),
    Err(e) => (
      StatusCode::INTERNAL_SERVER_ERROR,
      Json(json!({ "error": e.to_string() })),
    )
      .into_response(),
  }
}

async fn health() -> Json<serde_json::Value> {
  Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use axum::body::Body;
  use axum::http::Request;
  use serde_json::Value;
  use switchyard_config::{GraphDef, NodeDef, RouterType, StepDef};
  use switchyard_graph::Graph;
  use switchyard_invoker::{InvokeError, ServiceInvoker};
  use tower::ServiceExt;

  use super::*;

  /// Echoes the payload back, except for urls containing "down".
  struct EchoInvoker;

  #[async_trait]
  impl ServiceInvoker for EchoInvoker {
    async fn invoke(&self, url: &str, payload: Bytes) -> Result<Bytes, InvokeError> {
      if url.contains("down") {
        return Err(InvokeError::unavailable(url, "connection refused"));
      }
      Ok(payload)
    }
  }

  fn test_app(url: &str) -> Router {
    let def = GraphDef::default().with_node(
      "root",
      NodeDef::new(RouterType::Sequence, vec![StepDef::service(url)]),
    );
    let router = GraphRouter::new(Graph::new(def), Arc::new(EchoInvoker));
    app(Arc::new(router))
  }

  async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn test_post_routes_request() {
    let request = Request::builder()
      .method("POST")
      .uri("/")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"instances": [1, 2]}"#))
      .unwrap();

    let response = test_app("http://model").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
      response.headers().get(header::CONTENT_TYPE).unwrap(),
      "application/json"
    );
    assert_eq!(body_json(response).await, json!({"instances": [1, 2]}));
  }

  #[tokio::test]
  async fn test_routing_failure_is_500() {
    let request = Request::builder()
      .method("POST")
      .uri("/")
      .body(Body::from("{}"))
      .unwrap();

    let response = test_app("http://down").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("http://down"));
  }

  #[tokio::test]
  async fn test_post_to_sub_path_routes_request() {
    let request = Request::builder()
      .method("POST")
      .uri("/v1/models/m:predict")
      .body(Body::from(r#"{"instances": [3]}"#))
      .unwrap();

    let response = test_app("http://model").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"instances": [3]}));
  }

  #[tokio::test]
  async fn test_large_payload_is_accepted() {
    let image = "A".repeat(3 * 1024 * 1024);
    let payload = serde_json::to_vec(&json!({ "image": image })).unwrap();
    let request = Request::builder()
      .method("POST")
      .uri("/")
      .body(Body::from(payload))
      .unwrap();

    let response = test_app("http://model").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["image"].as_str().map(str::len), Some(3 * 1024 * 1024));
  }

  #[tokio::test]
  async fn test_health() {
    let request = Request::builder()
      .uri("/health")
      .body(Body::empty())
      .unwrap();

    let response = test_app("http://model").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
  }

  #[tokio::test]
  async fn test_get_root_not_allowed() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = test_app("http://model").oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
  }
}
