//! Predicate-based route selection for `Switch` nodes.

use serde_json::Value;
use switchyard_graph::Step;
use tracing::{debug, error};

/// Pick the first step whose condition matches `input`.
///
/// The request body is decoded once and wrapped as the only element of a
/// collection that each step's condition filters; a non-empty result is a
/// match. A body that is not JSON selects nothing. A condition that failed to
/// parse when the graph was locked is logged and treated as not matching. A
/// step without a condition always matches.
pub fn pick_by_condition<'a>(node: &str, input: &[u8], steps: &'a [Step]) -> Option<&'a Step> {
  let data: Value = match serde_json::from_slice(input) {
    Ok(data) => data,
    Err(e) => {
      error!(node = %node, error = %e, "condition_input_invalid");
      return None;
    }
  };
  let items = std::slice::from_ref(&data);

  steps.iter().find(|step| {
    let Some(condition) = step.condition.as_ref() else {
      return true;
    };

    match &condition.predicate {
      Ok(predicate) => {
        let matched = !predicate.filter(items).is_empty();
        debug!(node = %node, step = step.index, condition = %condition.source, matched, "condition_evaluated");
        matched
      }
      Err(e) => {
        error!(node = %node, step = step.index, condition = %condition.source, error = %e, "condition_invalid");
        false
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use switchyard_graph::{Condition, DataSource, StepTarget};

  use super::*;

  fn step(index: usize, condition: Option<&str>) -> Step {
    Step {
      index,
      name: None,
      target: StepTarget::Service(format!("http://svc-{}", index)),
      weight: 0,
      condition: condition.map(Condition::parse),
      data: DataSource::Request,
    }
  }

  fn picked(input: &str, steps: &[Step]) -> Option<usize> {
    pick_by_condition("switch", input.as_bytes(), steps).map(|s| s.index)
  }

  #[test]
  fn test_first_match_wins() {
    let steps = vec![
      step(0, Some("{.field == 1}")),
      step(1, Some("{.field == 2}")),
      step(2, Some("{.field >= 2}")),
    ];
    assert_eq!(picked(r#"{"field": 1}"#, &steps), Some(0));
    assert_eq!(picked(r#"{"field": 2}"#, &steps), Some(1));
    assert_eq!(picked(r#"{"field": 7}"#, &steps), Some(2));
  }

  #[test]
  fn test_no_match() {
    let steps = vec![step(0, Some("{.field == 1}")), step(1, Some("{.field == 2}"))];
    assert_eq!(picked(r#"{"field": 3}"#, &steps), None);
  }

  #[test]
  fn test_invalid_input_selects_nothing() {
    let steps = vec![step(0, None)];
    assert_eq!(picked("not json", &steps), None);
    assert_eq!(picked("", &steps), None);
  }

  #[test]
  fn test_invalid_condition_is_skipped() {
    let steps = vec![step(0, Some("{.field = 1}")), step(1, Some("{.field == 1}"))];
    assert_eq!(picked(r#"{"field": 1}"#, &steps), Some(1));
  }

  #[test]
  fn test_unconditional_step_is_default() {
    let steps = vec![step(0, Some(r#"{.kind == "cat"}"#)), step(1, None)];
    assert_eq!(picked(r#"{"kind": "cat"}"#, &steps), Some(0));
    assert_eq!(picked(r#"{"kind": "dog"}"#, &steps), Some(1));
  }

  #[test]
  fn test_non_object_input() {
    let steps = vec![step(0, Some("{.field == 1}"))];
    assert_eq!(picked("[1, 2, 3]", &steps), None);
    assert_eq!(picked("42", &steps), None);
  }
}
