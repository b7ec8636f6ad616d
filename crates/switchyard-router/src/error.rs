//! Router error types.

use switchyard_invoker::InvokeError;

/// Errors that fail a routed request.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
  /// A step names a node that is not in the graph.
  #[error("node not found: {node}")]
  NodeNotFound { node: String },

  /// A step has neither a node name nor a service url.
  #[error("step {step} of node '{node}' has no node name or service url")]
  MissingTarget { node: String, step: usize },

  /// A downstream service call failed.
  #[error("service call from node '{node}' to {url} failed: {source}")]
  Invoke {
    node: String,
    url: String,
    #[source]
    source: InvokeError,
  },

  /// Recursion went deeper than the configured limit, usually a cycle.
  #[error("routing depth limit {max_depth} exceeded at node '{node}'")]
  DepthExceeded { node: String, max_depth: usize },

  /// A spawned ensemble branch panicked or was aborted.
  #[error("branch of node '{node}' did not complete: {message}")]
  TaskJoin { node: String, message: String },

  /// A merged response could not be serialized.
  #[error("failed to serialize response of node '{node}': {source}")]
  Serialization {
    node: String,
    #[source]
    source: serde_json::Error,
  },
}

impl RoutingError {
  /// The node the failure originated at.
  pub fn node(&self) -> &str {
    match self {
      RoutingError::NodeNotFound { node }
      | RoutingError::MissingTarget { node, .. }
      | RoutingError::Invoke { node, .. }
      | RoutingError::DepthExceeded { node, .. }
      | RoutingError::TaskJoin { node, .. }
      | RoutingError::Serialization { node, .. } => node,
    }
  }
}
