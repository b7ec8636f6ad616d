use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::node::NodeDef;

/// Name of the node every request enters the graph at.
pub const GRAPH_ROOT_NODE: &str = "root";

/// An inference graph definition: node name to node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDef {
  pub nodes: HashMap<String, NodeDef>,
}

impl GraphDef {
  /// Parse a graph definition from a JSON document.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  /// Read and parse a graph definition from a JSON file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&content)
  }

  /// Add a node, replacing any node with the same name.
  pub fn with_node(mut self, name: impl Into<String>, node: NodeDef) -> Self {
    self.nodes.insert(name.into(), node);
    self
  }

  pub fn root(&self) -> Option<&NodeDef> {
    self.nodes.get(GRAPH_ROOT_NODE)
  }
}
