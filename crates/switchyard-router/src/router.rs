//! Graph router.
//!
//! The [`Router`] is the entry point for routing requests. It owns an
//! immutable graph, the service invoker, and the draw source used by
//! `Splitter` nodes, and provides `execute(input)` to route one request
//! from the root node.

use std::sync::Arc;

use bytes::Bytes;
use switchyard_graph::{GRAPH_ROOT_NODE, Graph};
use switchyard_invoker::ServiceInvoker;
use tracing::{error, info, instrument};

use crate::error::RoutingError;
use crate::events::{NoopNotifier, RoutingEvent, RoutingNotifier};
use crate::interpreter::{RouteContext, route_node};
use crate::selector::{DrawSource, RandomDraw};

/// Default limit on nested node activations per request.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Configuration for the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
  /// Deepest chain of node activations a request may reach before it fails.
  pub max_depth: usize,
}

impl Default for RouterConfig {
  fn default() -> Self {
    Self {
      max_depth: DEFAULT_MAX_DEPTH,
    }
  }
}

/// Routes requests through an inference graph.
///
/// Generic over `N: RoutingNotifier` to allow different notification strategies.
/// Use `Router::new()` for a router with no-op notifications, or
/// `Router::with_notifier()` to observe routing events.
pub struct Router<N: RoutingNotifier = NoopNotifier> {
  graph: Arc<Graph>,
  invoker: Arc<dyn ServiceInvoker>,
  draw: Arc<dyn DrawSource>,
  notifier: Arc<N>,
  config: RouterConfig,
}

impl Router<NoopNotifier> {
  /// Create a router with no-op notifications.
  pub fn new(graph: impl Into<Arc<Graph>>, invoker: Arc<dyn ServiceInvoker>) -> Self {
    Self::with_notifier(graph, invoker, NoopNotifier)
  }
}

impl<N: RoutingNotifier + 'static> Router<N> {
  /// Create a router with a custom notifier.
  pub fn with_notifier(
    graph: impl Into<Arc<Graph>>,
    invoker: Arc<dyn ServiceInvoker>,
    notifier: N,
  ) -> Self {
    Self {
      graph: graph.into(),
      invoker,
      draw: Arc::new(RandomDraw),
      notifier: Arc::new(notifier),
      config: RouterConfig::default(),
    }
  }

  pub fn with_config(mut self, config: RouterConfig) -> Self {
    self.config = config;
    self
  }

  /// Replace the random draw used by `Splitter` nodes.
  pub fn with_draw_source(mut self, draw: Arc<dyn DrawSource>) -> Self {
    self.draw = draw;
    self
  }

  /// Route a request from the root node and return the final response.
  pub async fn execute(&self, input: Bytes) -> Result<Bytes, RoutingError> {
    self.execute_node(GRAPH_ROOT_NODE, input).await
  }

  /// Route a request starting at `node` instead of the root.
  pub async fn execute_node(&self, node: &str, input: Bytes) -> Result<Bytes, RoutingError> {
    let request_id = uuid::Uuid::new_v4().to_string();
    self.run(node, input, request_id).await
  }

  #[instrument(
    name = "router_execute",
    skip(self, input),
    fields(input_bytes = input.len())
  )]
  async fn run(&self, node: &str, input: Bytes, request_id: String) -> Result<Bytes, RoutingError> {
    info!(request_id = %request_id, node = %node, "request_started");
    self.notifier.notify(RoutingEvent::RequestStarted {
      request_id: request_id.clone(),
      node: node.to_string(),
    });

    let ctx = RouteContext {
      graph: self.graph.clone(),
      invoker: self.invoker.clone(),
      draw: self.draw.clone(),
      notifier: self.notifier.clone(),
      request_id: request_id.clone(),
      max_depth: self.config.max_depth,
    };

    let result = route_node(ctx, node.to_string(), input, 0).await;

    match &result {
      Ok(response) => {
        info!(request_id = %request_id, output_bytes = response.len(), "request_completed");
        self.notifier.notify(RoutingEvent::RequestCompleted { request_id });
      }
      Err(e) => {
        error!(request_id = %request_id, node = %e.node(), error = %e, "request_failed");
        self.notifier.notify(RoutingEvent::RequestFailed {
          request_id,
          error: e.to_string(),
        });
      }
    }

    result
  }

  /// Get a reference to the graph.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }
}
