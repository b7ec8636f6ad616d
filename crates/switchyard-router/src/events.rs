//! Routing events and notifiers for observability.
//!
//! Events are emitted while a request moves through the graph so consumers
//! can record which routes were taken, export timings, stream to a UI, etc.

use serde::{Deserialize, Serialize};
use switchyard_graph::RouterType;
use tokio::sync::mpsc;

/// Events emitted while routing a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoutingEvent {
  /// A request entered the graph.
  RequestStarted { request_id: String, node: String },

  /// A node activation has started.
  NodeStarted {
    request_id: String,
    node: String,
    router_type: RouterType,
  },

  /// A `Splitter` or `Switch` node selected a step.
  StepSelected {
    request_id: String,
    node: String,
    step: usize,
  },

  /// A `Splitter` or `Switch` node found no step to take.
  SelectionMissed { request_id: String, node: String },

  /// A node activation produced its response.
  NodeCompleted {
    request_id: String,
    node: String,
    elapsed_ms: u64,
  },

  /// A node activation failed.
  NodeFailed {
    request_id: String,
    node: String,
    error: String,
  },

  /// The request produced a response.
  RequestCompleted { request_id: String },

  /// The request failed.
  RequestFailed { request_id: String, error: String },
}

/// Trait for receiving routing events.
///
/// The router calls `notify` for each event from whichever task produced it,
/// so implementations must be cheap and must not block.
pub trait RoutingNotifier: Send + Sync {
  fn notify(&self, event: RoutingEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl RoutingNotifier for NoopNotifier {
  fn notify(&self, _event: RoutingEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls routing; volume is a handful
  // of events per node activation.
  sender: mpsc::UnboundedSender<RoutingEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<RoutingEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<RoutingEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl RoutingNotifier for ChannelNotifier {
  fn notify(&self, event: RoutingEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
