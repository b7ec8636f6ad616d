//! Weighted route selection for `Splitter` nodes.

use rand::Rng;
use switchyard_graph::Step;

/// Upper bound (exclusive) of a draw. Step weights are percentages of this.
pub const DRAW_RANGE: u32 = 100;

/// Source of the per-request draw in `[0, DRAW_RANGE)`.
pub trait DrawSource: Send + Sync {
  fn draw(&self) -> u32;
}

/// Draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDraw;

impl DrawSource for RandomDraw {
  fn draw(&self) -> u32 {
    rand::rng().random_range(0..DRAW_RANGE)
  }
}

/// Always returns the same point.
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(pub u32);

impl DrawSource for FixedDraw {
  fn draw(&self) -> u32 {
    self.0
  }
}

/// Pick the step whose cumulative `[start, end)` weight band contains `point`.
///
/// Returns `None` when the bands leave `point` uncovered, e.g. when weights
/// sum to less than 100.
pub fn pick_weighted(steps: &[Step], point: u32) -> Option<&Step> {
  let point = u64::from(point);
  let mut end = 0u64;
  for step in steps {
    let start = end;
    end += u64::from(step.weight);
    if point >= start && point < end {
      return Some(step);
    }
  }
  None
}
