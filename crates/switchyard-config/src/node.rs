use serde::{Deserialize, Serialize};

use crate::step::StepDef;

/// How a node dispatches to its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouterType {
  /// Pick one step at random, weighted by `weight`.
  Splitter,
  /// Pick the first step whose `condition` matches the request.
  Switch,
  /// Call every step concurrently and merge the responses by step name.
  Ensemble,
  /// Call steps in order, optionally forwarding each response to the next.
  Sequence,
}

impl std::fmt::Display for RouterType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      RouterType::Splitter => "Splitter",
      RouterType::Switch => "Switch",
      RouterType::Ensemble => "Ensemble",
      RouterType::Sequence => "Sequence",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
  pub router_type: RouterType,
  /// Ordered steps. Older graph documents call this field `routes`.
  #[serde(default, alias = "routes")]
  pub steps: Vec<StepDef>,
}

impl NodeDef {
  pub fn new(router_type: RouterType, steps: Vec<StepDef>) -> Self {
    Self { router_type, steps }
  }
}
