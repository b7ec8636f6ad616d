//! Switch conditions.
//!
//! A condition is a small boolean filter expression evaluated against the
//! JSON request body, optionally wrapped in braces:
//!
//! ```text
//! { .instances[0].kind == "cat" && .parameters.threshold >= 0.5 }
//! { @.model != 'legacy' || !(.debug) }
//! ```
//!
//! A bare path is true when it resolves to a non-null value. A comparison
//! against a path that does not resolve is never true.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::ConditionError;

/// A parsed condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
  expr: Expr,
}

impl Predicate {
  /// Parse a condition expression.
  pub fn parse(src: &str) -> Result<Self, ConditionError> {
    let body = strip_braces(src)?;

    let mut parser = Parser::new(body);
    parser.skip_ws();
    if parser.at_end() {
      return Err(ConditionError::Empty);
    }

    let expr = parser.parse_expr()?;
    parser.skip_ws();
    if !parser.at_end() {
      return Err(parser.unexpected("end of condition"));
    }

    Ok(Self { expr })
  }

  /// Whether `value` satisfies the condition.
  pub fn matches(&self, value: &Value) -> bool {
    self.expr.eval(value)
  }

  /// Select the items of a collection that satisfy the condition.
  pub fn filter<'a>(&self, items: &'a [Value]) -> Vec<&'a Value> {
    items.iter().filter(|item| self.matches(item)).collect()
  }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
  Or(Box<Expr>, Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Not(Box<Expr>),
  Exists(Path),
  Compare {
    path: Path,
    op: CompareOp,
    value: Value,
  },
}

impl Expr {
  fn eval(&self, root: &Value) -> bool {
    match self {
      Expr::Or(left, right) => left.eval(root) || right.eval(root),
      Expr::And(left, right) => left.eval(root) && right.eval(root),
      Expr::Not(inner) => !inner.eval(root),
      Expr::Exists(path) => path.resolve(root).is_some_and(|v| !v.is_null()),
      Expr::Compare { path, op, value } => path.resolve(root).is_some_and(|v| op.apply(v, value)),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
  Key(String),
  Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
struct Path(Vec<Segment>);

impl Path {
  fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
    self.0.iter().try_fold(root, |current, segment| match segment {
      Segment::Key(key) => current.as_object()?.get(key),
      Segment::Index(index) => current.as_array()?.get(*index),
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
}

impl CompareOp {
  fn apply(self, left: &Value, right: &Value) -> bool {
    let ordering = || compare(left, right);
    match self {
      CompareOp::Eq => values_equal(left, right),
      CompareOp::Ne => !values_equal(left, right),
      CompareOp::Lt => ordering().is_some_and(Ordering::is_lt),
      CompareOp::Le => ordering().is_some_and(Ordering::is_le),
      CompareOp::Gt => ordering().is_some_and(Ordering::is_gt),
      CompareOp::Ge => ordering().is_some_and(Ordering::is_ge),
    }
  }
}

/// Numbers compare by value so `1` equals `1.0`.
fn values_equal(left: &Value, right: &Value) -> bool {
  match (left, right) {
    (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
    _ => left == right,
  }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
  match (left, right) {
    (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
    _ => None,
  }
}

fn strip_braces(src: &str) -> Result<&str, ConditionError> {
  let trimmed = src.trim();
  match (trimmed.starts_with('{'), trimmed.ends_with('}')) {
    (true, true) if trimmed.len() >= 2 => Ok(&trimmed[1..trimmed.len() - 1]),
    (false, false) => Ok(trimmed),
    _ => Err(ConditionError::UnbalancedBraces),
  }
}

/// Recursive-descent parser over the condition body.
///
/// Grammar:
///
/// ```text
/// expr       := and ( "||" and )*
/// and        := unary ( "&&" unary )*
/// unary      := "!" unary | "(" expr ")" | comparison
/// comparison := path ( op literal )?
/// path       := [ "@" | "$" ] ( "." ident | "[" ( string | integer ) "]" )+
/// ```
struct Parser {
  chars: Vec<char>,
  pos: usize,
}

impl Parser {
  fn new(src: &str) -> Self {
    Self {
      chars: src.chars().collect(),
      pos: 0,
    }
  }

  fn peek(&self) -> Option<char> {
    self.chars.get(self.pos).copied()
  }

  fn peek_at(&self, offset: usize) -> Option<char> {
    self.chars.get(self.pos + offset).copied()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += 1;
    Some(c)
  }

  fn at_end(&self) -> bool {
    self.pos >= self.chars.len()
  }

  fn skip_ws(&mut self) {
    while self.peek().is_some_and(char::is_whitespace) {
      self.pos += 1;
    }
  }

  /// Consume `token` if the input continues with it.
  fn eat(&mut self, token: &str) -> bool {
    self.skip_ws();
    let matches = token
      .chars()
      .enumerate()
      .all(|(i, c)| self.peek_at(i) == Some(c));
    if matches {
      self.pos += token.chars().count();
    }
    matches
  }

  fn unexpected(&self, expected: &'static str) -> ConditionError {
    ConditionError::Unexpected {
      position: self.pos,
      found: self
        .peek()
        .map(|c| format!("'{}'", c))
        .unwrap_or_else(|| "end of input".to_string()),
      expected,
    }
  }

  fn parse_expr(&mut self) -> Result<Expr, ConditionError> {
    let mut left = self.parse_and()?;
    while self.eat("||") {
      let right = self.parse_and()?;
      left = Expr::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn parse_and(&mut self) -> Result<Expr, ConditionError> {
    let mut left = self.parse_unary()?;
    while self.eat("&&") {
      let right = self.parse_unary()?;
      left = Expr::And(Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> Result<Expr, ConditionError> {
    self.skip_ws();
    if self.peek() == Some('!') && self.peek_at(1) != Some('=') {
      self.pos += 1;
      let inner = self.parse_unary()?;
      return Ok(Expr::Not(Box::new(inner)));
    }

    if self.eat("(") {
      let inner = self.parse_expr()?;
      if !self.eat(")") {
        return Err(self.unexpected("')'"));
      }
      return Ok(inner);
    }

    self.parse_comparison()
  }

  fn parse_comparison(&mut self) -> Result<Expr, ConditionError> {
    let path = self.parse_path()?;
    match self.parse_op()? {
      Some(op) => {
        let value = self.parse_literal()?;
        Ok(Expr::Compare { path, op, value })
      }
      None => Ok(Expr::Exists(path)),
    }
  }

  fn parse_path(&mut self) -> Result<Path, ConditionError> {
    self.skip_ws();
    if matches!(self.peek(), Some('@') | Some('$')) {
      self.pos += 1;
    }

    let mut segments = Vec::new();
    loop {
      match self.peek() {
        Some('.') => {
          self.pos += 1;
          segments.push(Segment::Key(self.parse_ident()?));
        }
        Some('[') => {
          self.pos += 1;
          self.skip_ws();
          let segment = match self.peek() {
            Some(quote @ ('"' | '\'')) => Segment::Key(self.parse_string(quote)?),
            _ => Segment::Index(self.parse_index()?),
          };
          if !self.eat("]") {
            return Err(self.unexpected("']'"));
          }
          segments.push(segment);
        }
        _ => break,
      }
    }

    if segments.is_empty() {
      return Err(self.unexpected("a path such as .field"));
    }
    Ok(Path(segments))
  }

  fn parse_ident(&mut self) -> Result<String, ConditionError> {
    let start = self.pos;
    while self
      .peek()
      .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
      self.pos += 1;
    }
    if self.pos == start {
      return Err(self.unexpected("a field name"));
    }
    Ok(self.chars[start..self.pos].iter().collect())
  }

  fn parse_index(&mut self) -> Result<usize, ConditionError> {
    let start = self.pos;
    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
      self.pos += 1;
    }
    if self.pos == start {
      return Err(self.unexpected("an index or quoted key"));
    }
    let text: String = self.chars[start..self.pos].iter().collect();
    text
      .parse()
      .map_err(|_| ConditionError::InvalidNumber {
        position: start,
        text,
      })
  }

  fn parse_op(&mut self) -> Result<Option<CompareOp>, ConditionError> {
    self.skip_ws();
    let op = match (self.peek(), self.peek_at(1)) {
      (Some('='), Some('=')) => Some((CompareOp::Eq, 2)),
      (Some('!'), Some('=')) => Some((CompareOp::Ne, 2)),
      (Some('<'), Some('=')) => Some((CompareOp::Le, 2)),
      (Some('>'), Some('=')) => Some((CompareOp::Ge, 2)),
      (Some('<'), _) => Some((CompareOp::Lt, 1)),
      (Some('>'), _) => Some((CompareOp::Gt, 1)),
      (Some('='), _) => return Err(self.unexpected("'=='")),
      _ => None,
    };

    Ok(op.map(|(op, len)| {
      self.pos += len;
      op
    }))
  }

  fn parse_literal(&mut self) -> Result<Value, ConditionError> {
    self.skip_ws();
    match self.peek() {
      Some(quote @ ('"' | '\'')) => Ok(Value::String(self.parse_string(quote)?)),
      Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
      Some(c) if c.is_alphabetic() => {
        let start = self.pos;
        while self.peek().is_some_and(char::is_alphabetic) {
          self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
          "true" => Ok(Value::Bool(true)),
          "false" => Ok(Value::Bool(false)),
          "null" => Ok(Value::Null),
          _ => {
            self.pos = start;
            Err(self.unexpected("a string, number, true, false or null"))
          }
        }
      }
      _ => Err(self.unexpected("a string, number, true, false or null")),
    }
  }

  fn parse_number(&mut self) -> Result<Value, ConditionError> {
    let start = self.pos;
    while self
      .peek()
      .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
    {
      self.pos += 1;
    }
    let text: String = self.chars[start..self.pos].iter().collect();
    serde_json::from_str::<serde_json::Number>(&text)
      .map(Value::Number)
      .map_err(|_| ConditionError::InvalidNumber {
        position: start,
        text,
      })
  }

  fn parse_string(&mut self, quote: char) -> Result<String, ConditionError> {
    let start = self.pos;
    self.pos += 1;

    let mut out = String::new();
    loop {
      match self.bump() {
        None => return Err(ConditionError::UnterminatedString { position: start }),
        Some('\\') => match self.bump() {
          Some('n') => out.push('\n'),
          Some('t') => out.push('\t'),
          Some('r') => out.push('\r'),
          Some(c) => out.push(c),
          None => return Err(ConditionError::UnterminatedString { position: start }),
        },
        Some(c) if c == quote => return Ok(out),
        Some(c) => out.push(c),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn matches(condition: &str, value: Value) -> bool {
    Predicate::parse(condition).unwrap().matches(&value)
  }

  #[test]
  fn test_equality_with_braces() {
    assert!(matches(r#"{.field == "value"}"#, json!({ "field": "value" })));
    assert!(!matches(r#"{.field == "value"}"#, json!({ "field": "other" })));
  }

  #[test]
  fn test_at_prefix_and_whitespace() {
    assert!(matches(
      r#"  { @.field   ==   "value" }  "#,
      json!({ "field": "value" })
    ));
  }

  #[test]
  fn test_without_braces() {
    assert!(matches(".count == 2", json!({ "count": 2 })));
  }

  #[test]
  fn test_whitespace_inside_string_preserved() {
    assert!(matches(r#"{.name == "a b"}"#, json!({ "name": "a b" })));
    assert!(!matches(r#"{.name == "a b"}"#, json!({ "name": "ab" })));
  }

  #[test]
  fn test_numbers_compare_by_value() {
    assert!(matches("{.x == 1}", json!({ "x": 1.0 })));
    assert!(matches("{.x != 1}", json!({ "x": 2 })));
    assert!(matches("{.x < 10}", json!({ "x": 9.5 })));
    assert!(matches("{.x >= -3}", json!({ "x": -3 })));
    assert!(!matches("{.x > 10}", json!({ "x": 10 })));
    assert!(matches("{.x <= 1e3}", json!({ "x": 1000 })));
  }

  #[test]
  fn test_string_ordering() {
    assert!(matches(r#"{.v < "b"}"#, json!({ "v": "a" })));
    assert!(!matches(r#"{.v > "b"}"#, json!({ "v": "a" })));
  }

  #[test]
  fn test_mismatched_types_do_not_order() {
    assert!(!matches(r#"{.v < "10"}"#, json!({ "v": 5 })));
    assert!(!matches(r#"{.v >= "10"}"#, json!({ "v": 5 })));
    assert!(matches(r#"{.v != "5"}"#, json!({ "v": 5 })));
  }

  #[test]
  fn test_nested_paths_and_indexes() {
    let input = json!({
      "instances": [ { "kind": "cat" }, { "kind": "dog" } ],
      "meta": { "model-name": "resnet" }
    });
    assert!(matches(r#"{.instances[1].kind == "dog"}"#, input.clone()));
    assert!(matches(r#"{.meta["model-name"] == 'resnet'}"#, input.clone()));
    assert!(matches(r#"{.meta.model-name == "resnet"}"#, input.clone()));
    assert!(!matches(r#"{.instances[5].kind == "dog"}"#, input));
  }

  #[test]
  fn test_literals() {
    assert!(matches("{.flag == true}", json!({ "flag": true })));
    assert!(matches("{.flag == false}", json!({ "flag": false })));
    assert!(matches("{.gone == null}", json!({ "gone": null })));
  }

  #[test]
  fn test_existence() {
    assert!(matches("{.debug}", json!({ "debug": false })));
    assert!(!matches("{.debug}", json!({ "debug": null })));
    assert!(!matches("{.debug}", json!({})));
    assert!(matches("{!.debug}", json!({})));
  }

  #[test]
  fn test_missing_path_never_compares() {
    assert!(!matches(r#"{.missing == "x"}"#, json!({})));
    assert!(!matches(r#"{.missing != "x"}"#, json!({})));
  }

  #[test]
  fn test_boolean_operators() {
    let input = json!({ "a": 1, "b": 2 });
    assert!(matches("{.a == 1 && .b == 2}", input.clone()));
    assert!(!matches("{.a == 1 && .b == 3}", input.clone()));
    assert!(matches("{.a == 9 || .b == 2}", input.clone()));
    assert!(matches("{!(.a == 9) && (.b == 2 || .c)}", input.clone()));
    // && binds tighter than ||
    assert!(matches("{.a == 1 || .a == 9 && .b == 9}", input));
  }

  #[test]
  fn test_escaped_quotes() {
    assert!(matches(r#"{.q == "say \"hi\""}"#, json!({ "q": "say \"hi\"" })));
  }

  #[test]
  fn test_filter_single_element_collection() {
    let predicate = Predicate::parse(r#"{.field == "value"}"#).unwrap();
    let input = json!({ "field": "value" });
    let items = std::slice::from_ref(&input);
    assert_eq!(predicate.filter(items), vec![&input]);

    let other = json!({ "field": "nope" });
    assert!(predicate.filter(std::slice::from_ref(&other)).is_empty());
  }

  #[test]
  fn test_from_str() {
    let predicate: Predicate = "{.x == 1}".parse().unwrap();
    assert!(predicate.matches(&json!({ "x": 1 })));
  }

  #[test]
  fn test_parse_errors() {
    assert!(matches!(Predicate::parse(""), Err(ConditionError::Empty)));
    assert!(matches!(Predicate::parse("{ }"), Err(ConditionError::Empty)));
    assert!(matches!(
      Predicate::parse("{.a == 1"),
      Err(ConditionError::UnbalancedBraces)
    ));
    assert!(matches!(
      Predicate::parse(r#"{.a == "open}"#),
      Err(ConditionError::UnterminatedString { .. })
    ));
    assert!(matches!(
      Predicate::parse("{.a = 1}"),
      Err(ConditionError::Unexpected { expected: "'=='", .. })
    ));
    assert!(matches!(
      Predicate::parse("{field == 1}"),
      Err(ConditionError::Unexpected { .. })
    ));
    assert!(matches!(
      Predicate::parse("{.a == 1 junk}"),
      Err(ConditionError::Unexpected { .. })
    ));
    assert!(matches!(
      Predicate::parse("{.a == }"),
      Err(ConditionError::Unexpected { .. })
    ));
    assert!(matches!(
      Predicate::parse("{.a == maybe}"),
      Err(ConditionError::Unexpected { .. })
    ));
    assert!(matches!(
      Predicate::parse("{(.a == 1}"),
      Err(ConditionError::Unexpected { expected: "')'", .. })
    ));
    assert!(matches!(
      Predicate::parse("{.a == 1.}"),
      Err(ConditionError::InvalidNumber { .. })
    ));
    assert!(matches!(
      Predicate::parse("{.a[x] == 1}"),
      Err(ConditionError::Unexpected { .. })
    ));
  }

  #[test]
  fn test_error_position() {
    match Predicate::parse("{.a == 1 junk}") {
      Err(ConditionError::Unexpected { position, .. }) => assert_eq!(position, 8),
      other => panic!("unexpected result: {other:?}"),
    }
  }
}
