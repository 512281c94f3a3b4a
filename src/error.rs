use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// A 1-based location in the text handed to a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
  pub line: usize,
  pub column: usize,
}

impl Position {
  pub const START: Position = Position { line: 1, column: 1 };

  /// Computes the position of `offset` by scanning `text` from the start.
  pub fn of(text: &[u8], offset: usize) -> Position {
    let mut pos = Position::START;
    for &b in &text[..offset.min(text.len())] {
      if b == b'\n' {
        pos.line += 1;
        pos.column = 1;
      } else {
        pos.column += 1;
      }
    }
    pos
  }
}

impl Display for Position {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "line {}, column {}", self.line, self.column)
  }
}

/// The only error kind of the crate. Grammar defects and input defects are
/// both reported through it; the message tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
  message: String,
  position: Option<Position>,
}

impl SyntaxError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      position: None,
    }
  }

  /// An error tied to a place in the input; the position is prefixed to the
  /// message.
  pub fn at(position: Position, message: impl Display) -> Self {
    Self {
      message: format!("{}: {}", position, message),
      position: Some(position),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn position(&self) -> Option<Position> {
    self.position
  }
}

pub type Result<T, E = SyntaxError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn position_of_offset() {
    let text = b"ab\ncd\n";
    assert_eq!(Position::of(text, 0), Position { line: 1, column: 1 });
    assert_eq!(Position::of(text, 4), Position { line: 2, column: 2 });
    assert_eq!(Position::of(text, 6), Position { line: 3, column: 1 });
  }

  #[test]
  fn located_message() {
    let err = SyntaxError::at(Position { line: 3, column: 7 }, "unexpected \"/\"");
    insta::assert_snapshot!(err.to_string(), @r#"line 3, column 7: unexpected "/""#);
    assert_eq!(err.position(), Some(Position { line: 3, column: 7 }));
  }
}
