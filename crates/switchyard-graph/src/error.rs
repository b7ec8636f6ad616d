use thiserror::Error;

/// Errors from parsing a switch condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
  #[error("condition is empty")]
  Empty,

  #[error("condition has unbalanced braces")]
  UnbalancedBraces,

  #[error("unexpected {found} at position {position}, expected {expected}")]
  Unexpected {
    position: usize,
    found: String,
    expected: &'static str,
  },

  #[error("unterminated string starting at position {position}")]
  UnterminatedString { position: usize },

  #[error("invalid number '{text}' at position {position}")]
  InvalidNumber { position: usize, text: String },
}
