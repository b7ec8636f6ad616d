//! Switchyard Config
//!
//! This crate contains the serializable inference graph definition types.
//! These types represent a routing graph as it is written by an operator,
//! before it is locked into the immutable arena the router executes.
//!
//! A definition can be loaded from:
//! - a JSON string (via CLI with `--graph-json=...` or the `GRAPH_JSON` env var)
//! - a JSON file (via CLI with `--graph-file=graph.json`)
//!
//! # Example
//!
//! ```json
//! {
//!   "nodes": {
//!     "root": {
//!       "routerType": "Splitter",
//!       "steps": [
//!         { "serviceUrl": "http://model-a/v1/models/a:predict", "weight": 80 },
//!         { "serviceUrl": "http://model-b/v1/models/b:predict", "weight": 20 }
//!       ]
//!     }
//!   }
//! }
//! ```

mod error;
mod graph;
mod node;
mod step;

pub use error::ConfigError;
pub use graph::{GRAPH_ROOT_NODE, GraphDef};
pub use node::{NodeDef, RouterType};
pub use step::{DATA_REQUEST, DATA_RESPONSE, StepDef};
