//! Node interpretation.
//!
//! One activation runs per node visited by a request. An activation looks the
//! node up by name, dispatches on its router type, and either recurses into
//! child nodes or calls downstream services. Responses are decoded as JSON and
//! the node's result is re-encoded before it is handed to the parent.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use switchyard_graph::{DataSource, Graph, Node, RouterType, Step, StepTarget};
use switchyard_invoker::ServiceInvoker;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::condition::pick_by_condition;
use crate::error::RoutingError;
use crate::events::{RoutingEvent, RoutingNotifier};
use crate::selector::{DrawSource, pick_weighted};

/// Everything an activation needs. Cloned into every spawned branch.
#[derive(Clone)]
pub(crate) struct RouteContext {
  pub graph: Arc<Graph>,
  pub invoker: Arc<dyn ServiceInvoker>,
  pub draw: Arc<dyn DrawSource>,
  pub notifier: Arc<dyn RoutingNotifier>,
  pub request_id: String,
  pub max_depth: usize,
}

impl RouteContext {
  fn notify(&self, event: RoutingEvent) {
    self.notifier.notify(event);
  }
}

/// Run one activation of `node_name` with `input`.
///
/// Boxed so activations can recurse.
pub(crate) fn route_node(
  ctx: RouteContext,
  node_name: String,
  input: Bytes,
  depth: usize,
) -> BoxFuture<'static, Result<Bytes, RoutingError>> {
  async move {
    if depth > ctx.max_depth {
      return Err(RoutingError::DepthExceeded {
        node: node_name,
        max_depth: ctx.max_depth,
      });
    }

    let graph = ctx.graph.clone();
    let node = graph
      .get_node(&node_name)
      .ok_or_else(|| RoutingError::NodeNotFound {
        node: node_name.clone(),
      })?;

    debug!(
      request_id = %ctx.request_id,
      node = %node.name,
      router_type = %node.router_type,
      depth,
      "node_started"
    );
    ctx.notify(RoutingEvent::NodeStarted {
      request_id: ctx.request_id.clone(),
      node: node.name.clone(),
      router_type: node.router_type,
    });

    let started = Instant::now();
    let result = match node.router_type {
      RouterType::Splitter => route_splitter(&ctx, node, input, depth).await,
      RouterType::Switch => route_switch(&ctx, node, input, depth).await,
      RouterType::Ensemble => route_ensemble(&ctx, node, input, depth).await,
      RouterType::Sequence => route_sequence(&ctx, node, input, depth).await,
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &result {
      Ok(_) => {
        info!(
          request_id = %ctx.request_id,
          node = %node.name,
          elapsed_ms,
          "node_completed"
        );
        ctx.notify(RoutingEvent::NodeCompleted {
          request_id: ctx.request_id.clone(),
          node: node.name.clone(),
          elapsed_ms,
        });
      }
      Err(e) => {
        warn!(
          request_id = %ctx.request_id,
          node = %node.name,
          elapsed_ms,
          error = %e,
          "node_failed"
        );
        ctx.notify(RoutingEvent::NodeFailed {
          request_id: ctx.request_id.clone(),
          node: node.name.clone(),
          error: e.to_string(),
        });
      }
    }

    result
  }
  .boxed()
}

/// Take the one step whose weight band contains this request's draw.
async fn route_splitter(
  ctx: &RouteContext,
  node: &Node,
  input: Bytes,
  depth: usize,
) -> Result<Bytes, RoutingError> {
  let point = ctx.draw.draw();
  match pick_weighted(&node.steps, point) {
    Some(step) => {
      debug!(request_id = %ctx.request_id, node = %node.name, point, step = step.index, "route_selected");
      route_selected(ctx, node, step, input, depth).await
    }
    None => {
      warn!(request_id = %ctx.request_id, node = %node.name, point, "splitter_missed");
      selection_missed(ctx, node)
    }
  }
}

/// Take the first step whose condition matches the request.
async fn route_switch(
  ctx: &RouteContext,
  node: &Node,
  input: Bytes,
  depth: usize,
) -> Result<Bytes, RoutingError> {
  match pick_by_condition(&node.name, &input, &node.steps) {
    Some(step) => {
      debug!(request_id = %ctx.request_id, node = %node.name, step = step.index, "route_selected");
      route_selected(ctx, node, step, input, depth).await
    }
    None => {
      debug!(request_id = %ctx.request_id, node = %node.name, "switch_no_match");
      selection_missed(ctx, node)
    }
  }
}

async fn route_selected(
  ctx: &RouteContext,
  node: &Node,
  step: &Step,
  input: Bytes,
  depth: usize,
) -> Result<Bytes, RoutingError> {
  ctx.notify(RoutingEvent::StepSelected {
    request_id: ctx.request_id.clone(),
    node: node.name.clone(),
    step: step.index,
  });

  let response = call_step(ctx, &node.name, step, input, depth).await?;
  let value = decode(ctx, &node.name, &response);
  encode(&node.name, &value)
}

fn selection_missed(ctx: &RouteContext, node: &Node) -> Result<Bytes, RoutingError> {
  ctx.notify(RoutingEvent::SelectionMissed {
    request_id: ctx.request_id.clone(),
    node: node.name.clone(),
  });
  encode(&node.name, &Value::Object(Map::new()))
}

/// Start every step before awaiting any, then merge the responses by step name.
///
/// Branches live in a `JoinSet`, so a failed branch or a dropped request
/// aborts the ones still running.
async fn route_ensemble(
  ctx: &RouteContext,
  node: &Node,
  input: Bytes,
  depth: usize,
) -> Result<Bytes, RoutingError> {
  let mut branches = JoinSet::new();

  for step in &node.steps {
    let ctx = ctx.clone();
    let node_name = node.name.clone();
    let step = step.clone();
    let input = input.clone();

    branches.spawn(async move {
      let result = call_step(&ctx, &node_name, &step, input, depth).await;
      (step.index, result)
    });
  }

  debug!(request_id = %ctx.request_id, node = %node.name, branches = branches.len(), "ensemble_started");

  let mut responses: Vec<Option<Bytes>> = vec![None; node.steps.len()];
  while let Some(joined) = branches.join_next().await {
    let (index, result) = joined.map_err(|e| RoutingError::TaskJoin {
      node: node.name.clone(),
      message: e.to_string(),
    })?;
    let response = result?;
    if let Some(slot) = responses.get_mut(index) {
      *slot = Some(response);
    }
  }

  // Declared order, so a later step wins a duplicate name
  let mut merged = Map::new();
  for (step, response) in node.steps.iter().zip(responses) {
    if let Some(response) = response {
      merged.insert(step.merge_key(), decode(ctx, &node.name, &response));
    }
  }

  encode(&node.name, &Value::Object(merged))
}

/// Run steps in order; a `$response` step receives the previous step's raw bytes.
async fn route_sequence(
  ctx: &RouteContext,
  node: &Node,
  input: Bytes,
  depth: usize,
) -> Result<Bytes, RoutingError> {
  let mut previous: Option<Bytes> = None;

  for step in &node.steps {
    let request = match (step.data, &previous) {
      (DataSource::PreviousResponse, Some(response)) => response.clone(),
      _ => input.clone(),
    };
    previous = Some(call_step(ctx, &node.name, step, request, depth).await?);
  }

  let value = match previous {
    Some(response) => decode(ctx, &node.name, &response),
    None => Value::Object(Map::new()),
  };
  encode(&node.name, &value)
}

/// Send `input` to a step's target and return the raw response.
async fn call_step(
  ctx: &RouteContext,
  node_name: &str,
  step: &Step,
  input: Bytes,
  depth: usize,
) -> Result<Bytes, RoutingError> {
  match &step.target {
    StepTarget::Node(child) => route_node(ctx.clone(), child.clone(), input, depth + 1).await,
    StepTarget::Service(url) => {
      ctx
        .invoker
        .invoke(url, input)
        .await
        .map_err(|source| RoutingError::Invoke {
          node: node_name.to_string(),
          url: url.clone(),
          source,
        })
    }
    StepTarget::Unset => Err(RoutingError::MissingTarget {
      node: node_name.to_string(),
      step: step.index,
    }),
  }
}

/// Decode a response body; anything that is not JSON becomes `null`.
fn decode(ctx: &RouteContext, node_name: &str, response: &[u8]) -> Value {
  serde_json::from_slice(response).unwrap_or_else(|e| {
    warn!(
      request_id = %ctx.request_id,
      node = %node_name,
      bytes = response.len(),
      error = %e,
      "response_not_json"
    );
    Value::Null
  })
}

fn encode(node_name: &str, value: &Value) -> Result<Bytes, RoutingError> {
  serde_json::to_vec(value)
    .map(Bytes::from)
    .map_err(|source| RoutingError::Serialization {
      node: node_name.to_string(),
      source,
    })
}
