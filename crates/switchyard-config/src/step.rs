use serde::{Deserialize, Serialize};

/// Data directive: send the previous step's response instead of the request.
pub const DATA_RESPONSE: &str = "$response";

/// Data directive: send the original request (the default).
pub const DATA_REQUEST: &str = "$request";

/// One edge of a routing node.
///
/// Exactly one of `node_name` and `service_url` should be set. The remaining
/// fields only mean something for particular router types:
/// `weight` for `Splitter`, `condition` for `Switch`, `name` for `Ensemble`
/// and `data` for `Sequence`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDef {
  #[serde(default, alias = "stepName", skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_name: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service_url: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub weight: Option<u32>,

  /// Predicate such as `{ .instances[0].kind == "cat" }`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition: Option<String>,

  /// `$response` or `$request`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<String>,
}

impl StepDef {
  /// A step that calls a downstream service.
  pub fn service(url: impl Into<String>) -> Self {
    Self {
      service_url: Some(url.into()),
      ..Default::default()
    }
  }

  /// A step that recurses into another node of the graph.
  pub fn node(name: impl Into<String>) -> Self {
    Self {
      node_name: Some(name.into()),
      ..Default::default()
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_weight(mut self, weight: u32) -> Self {
    self.weight = Some(weight);
    self
  }

  pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
    self.condition = Some(condition.into());
    self
  }

  pub fn with_data(mut self, data: impl Into<String>) -> Self {
    self.data = Some(data.into());
    self
  }
}
