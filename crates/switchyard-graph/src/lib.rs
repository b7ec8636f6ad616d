//! Switchyard Graph
//!
//! This crate provides the "locked" graph representation the router executes.
//! A locked graph is built once from a [`switchyard_config::GraphDef`] and is
//! immutable afterwards, so it can be shared behind an `Arc` by every
//! in-flight request without locking.
//!
//! Key differences from `switchyard-config`:
//! - Nodes live in an arena keyed by name; steps refer to other nodes by name,
//!   never by pointer, so there are no ownership cycles
//! - Each step's target is resolved into a single [`StepTarget`]
//! - Empty strings in the definition are treated as unset
//! - The data directive is resolved into a [`DataSource`]
//! - Switch conditions are parsed into a [`Predicate`] once, when the graph
//!   is locked
//!
//! Dangling node references and cycles are not checked here. They surface as
//! routing faults when a request reaches them.

mod error;
mod graph;
mod node;
mod predicate;

pub use error::ConditionError;
pub use graph::Graph;
pub use node::{Condition, DataSource, Node, Step, StepTarget};
pub use predicate::Predicate;
pub use switchyard_config::{GRAPH_ROOT_NODE, RouterType};
