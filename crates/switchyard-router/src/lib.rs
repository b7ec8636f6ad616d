//! Switchyard Router
//!
//! This crate executes inference graphs. For every request it starts one
//! activation at the graph's root node and interprets nodes recursively:
//!
//! - `Splitter` takes one step at random, weighted by percentage bands
//! - `Switch` takes the first step whose condition matches the request body
//! - `Ensemble` calls every step concurrently and merges responses by step name
//! - `Sequence` calls steps in order, optionally forwarding each response
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Router                             │
//! │  - execute(input) → response bytes                          │
//! │  - owns Arc<Graph>, ServiceInvoker, DrawSource, notifier    │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     route_node (recursive)                  │
//! │  - pick_weighted / pick_by_condition                        │
//! │  - JoinSet fan-out for Ensemble                             │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ServiceInvoker                         │
//! │  - POST payload to a downstream service                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use switchyard_graph::Graph;
//! use switchyard_invoker::{HttpInvoker, InvokerConfig};
//! use switchyard_router::Router;
//!
//! let graph = Graph::from_json(&json)?;
//! let invoker = Arc::new(HttpInvoker::new(InvokerConfig::default())?);
//! let router = Router::new(graph, invoker);
//!
//! let response = router.execute(request_body).await?;
//! ```

mod condition;
mod error;
mod events;
mod interpreter;
mod router;
mod selector;

pub use condition::pick_by_condition;
pub use error::RoutingError;
pub use events::{ChannelNotifier, NoopNotifier, RoutingEvent, RoutingNotifier};
pub use router::{DEFAULT_MAX_DEPTH, Router, RouterConfig};
pub use selector::{DRAW_RANGE, DrawSource, FixedDraw, RandomDraw, pick_weighted};
pub use switchyard_graph::{ConditionError, Predicate};
