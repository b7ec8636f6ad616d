use std::collections::HashMap;

use switchyard_config::{ConfigError, GRAPH_ROOT_NODE, GraphDef};

use crate::error::ConditionError;
use crate::node::{Node, Step};

/// An immutable routing graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
  nodes: HashMap<String, Node>,
}

impl Graph {
  /// Lock a graph definition.
  pub fn new(def: GraphDef) -> Self {
    let nodes = def
      .nodes
      .into_iter()
      .map(|(name, node)| (name.clone(), Node::lock(name, node)))
      .collect();

    Self { nodes }
  }

  /// Parse and lock a JSON graph definition.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    GraphDef::from_json(json).map(Self::new)
  }

  /// Get a node by name.
  pub fn get_node(&self, name: &str) -> Option<&Node> {
    self.nodes.get(name)
  }

  /// Get the node requests enter at.
  pub fn root(&self) -> Option<&Node> {
    self.get_node(GRAPH_ROOT_NODE)
  }

  /// Every step whose condition failed to parse, with its node.
  pub fn condition_errors(&self) -> impl Iterator<Item = (&Node, &Step, &ConditionError)> {
    self.nodes.values().flat_map(|node| {
      node.steps.iter().filter_map(move |step| {
        let error = step.condition.as_ref()?.predicate.as_ref().err()?;
        Some((node, step, error))
      })
    })
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}

impl From<GraphDef> for Graph {
  fn from(def: GraphDef) -> Self {
    Self::new(def)
  }
}
