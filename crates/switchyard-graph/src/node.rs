use switchyard_config::{DATA_RESPONSE, NodeDef, RouterType, StepDef};

use crate::error::ConditionError;
use crate::predicate::Predicate;

/// Where a step sends its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTarget {
  /// Recurse into another node of the graph.
  Node(String),
  /// Call a downstream service at this URL.
  Service(String),
  /// Neither was configured.
  Unset,
}

/// Which payload a `Sequence` step receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSource {
  /// The request the node itself received.
  #[default]
  Request,
  /// The raw response of the preceding step.
  PreviousResponse,
}

/// A switch condition, parsed when the graph is locked.
///
/// A condition that fails to parse is kept with its error so it can be
/// reported at startup; it never matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
  pub source: String,
  pub predicate: Result<Predicate, ConditionError>,
}

impl Condition {
  pub fn parse(source: impl Into<String>) -> Self {
    let source = source.into();
    let predicate = Predicate::parse(&source);
    Self { source, predicate }
  }
}

/// A locked step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
  /// Position within the owning node.
  pub index: usize,
  pub name: Option<String>,
  pub target: StepTarget,
  /// Splitter weight; an unset weight counts as zero.
  pub weight: u32,
  pub condition: Option<Condition>,
  pub data: DataSource,
}

impl Step {
  pub(crate) fn lock(index: usize, def: StepDef) -> Self {
    let target = match (non_empty(def.node_name), non_empty(def.service_url)) {
      (Some(node), _) => StepTarget::Node(node),
      (None, Some(url)) => StepTarget::Service(url),
      (None, None) => StepTarget::Unset,
    };

    let data = match def.data.as_deref() {
      Some(DATA_RESPONSE) => DataSource::PreviousResponse,
      _ => DataSource::Request,
    };

    Self {
      index,
      name: non_empty(def.name),
      target,
      weight: def.weight.unwrap_or(0),
      condition: non_empty(def.condition).map(Condition::parse),
      data,
    }
  }

  /// Key this step's response is stored under when an `Ensemble` merges.
  ///
  /// Unnamed steps fall back to their position.
  pub fn merge_key(&self) -> String {
    self
      .name
      .clone()
      .unwrap_or_else(|| self.index.to_string())
  }
}

/// A locked routing node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
  pub name: String,
  pub router_type: RouterType,
  pub steps: Vec<Step>,
}

impl Node {
  pub(crate) fn lock(name: String, def: NodeDef) -> Self {
    let steps = def
      .steps
      .into_iter()
      .enumerate()
      .map(|(index, step)| Step::lock(index, step))
      .collect();

    Self {
      name,
      router_type: def.router_type,
      steps,
    }
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use switchyard_config::DATA_REQUEST;

  use super::*;

  #[test]
  fn test_node_name_wins_over_service_url() {
    let def = StepDef {
      node_name: Some("child".to_string()),
      service_url: Some("http://svc".to_string()),
      ..Default::default()
    };
    let step = Step::lock(0, def);
    assert_eq!(step.target, StepTarget::Node("child".to_string()));
  }

  #[test]
  fn test_empty_node_name_falls_back_to_service() {
    let def = StepDef {
      node_name: Some(String::new()),
      service_url: Some("http://svc".to_string()),
      ..Default::default()
    };
    let step = Step::lock(0, def);
    assert_eq!(step.target, StepTarget::Service("http://svc".to_string()));
  }

  #[test]
  fn test_no_target() {
    let step = Step::lock(3, StepDef::default());
    assert_eq!(step.target, StepTarget::Unset);
    assert_eq!(step.weight, 0);
    assert_eq!(step.merge_key(), "3");
  }

  #[test]
  fn test_data_directive() {
    let forward = Step::lock(1, StepDef::service("http://a").with_data(DATA_RESPONSE));
    assert_eq!(forward.data, DataSource::PreviousResponse);

    let request = Step::lock(1, StepDef::service("http://a").with_data(DATA_REQUEST));
    assert_eq!(request.data, DataSource::Request);

    let other = Step::lock(1, StepDef::service("http://a").with_data("$something"));
    assert_eq!(other.data, DataSource::Request);
  }

  #[test]
  fn test_merge_key_uses_name() {
    let step = Step::lock(0, StepDef::service("http://a").with_name("a"));
    assert_eq!(step.merge_key(), "a");
  }

  #[test]
  fn test_condition_parsed_on_lock() {
    let step = Step::lock(0, StepDef::service("http://a").with_condition("{.kind == \"cat\"}"));
    let condition = step.condition.unwrap();
    assert_eq!(condition.source, "{.kind == \"cat\"}");
    assert!(condition.predicate.is_ok());
  }

  #[test]
  fn test_malformed_condition_keeps_error() {
    let step = Step::lock(2, StepDef::service("http://a").with_condition("{.kind = 1}"));
    let condition = step.condition.unwrap();
    assert!(matches!(
      condition.predicate,
      Err(ConditionError::Unexpected { position: 6, .. })
    ));
  }

  #[test]
  fn test_blank_condition_is_unset() {
    let step = Step::lock(0, StepDef::service("http://a").with_condition("  "));
    assert_eq!(step.condition, None);
  }
}
