//! ABNF source text as the meta parser reads it.

use crate::error::Position;

/// Normalized ABNF text along with the original position of every byte.
///
/// Line breaks become LF, comments are removed, a line break followed by
/// whitespace (a continuation line) becomes a space, and the text always ends
/// with a line break.
#[derive(Debug, Clone)]
pub struct Source {
  text: Vec<u8>,
  /// one per byte of `text`, plus the end of input
  positions: Vec<Position>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
  Normal,
  Quoted,
  Prose,
  Comment,
}

impl Source {
  pub fn new(raw: &[u8]) -> Self {
    let mut chars = Vec::with_capacity(raw.len() + 1);
    let mut pos = Position::START;
    let mut i = 0;
    while i < raw.len() {
      let b = raw[i];
      i += 1;
      if b == b'\r' || b == b'\n' {
        if b == b'\r' && raw.get(i) == Some(&b'\n') {
          i += 1;
        }
        chars.push((b'\n', pos));
        pos.line += 1;
        pos.column = 1;
      } else {
        chars.push((b, pos));
        pos.column += 1;
      }
    }
    let end = pos;

    let chars = strip_comments(chars);
    let mut text = Vec::with_capacity(chars.len() + 1);
    let mut positions = Vec::with_capacity(chars.len() + 2);
    for (i, &(b, pos)) in chars.iter().enumerate() {
      let continued = b == b'\n' && matches!(chars.get(i + 1), Some((b' ' | b'\t', _)));
      text.push(if continued { b' ' } else { b });
      positions.push(pos);
    }
    if text.last().map_or(false, |&b| b != b'\n') {
      text.push(b'\n');
      positions.push(end);
    }
    positions.push(end);

    Source {
      text,
      positions,
    }
  }

  pub fn text(&self) -> &[u8] {
    &self.text
  }

  /// Where the byte at `offset` of [`Source::text`] came from. Offsets at or
  /// past the end map to the end of the original text.
  pub fn position(&self, offset: usize) -> Position {
    self.positions[offset.min(self.positions.len() - 1)]
  }
}

/// Drops `;` comments up to the line break. Semicolons inside quoted strings
/// and prose values are kept; neither may span lines.
fn strip_comments(chars: Vec<(u8, Position)>) -> Vec<(u8, Position)> {
  let mut mode = Mode::Normal;
  chars.into_iter()
    .filter(|&(b, _)| {
      if b == b'\n' {
        mode = Mode::Normal;
        return true;
      }
      mode = match (mode, b) {
        (Mode::Comment, _) => return false,
        (Mode::Normal, b';') => {
          mode = Mode::Comment;
          return false;
        }
        (Mode::Normal, b'"') => Mode::Quoted,
        (Mode::Normal, b'<') => Mode::Prose,
        (Mode::Quoted, b'"') | (Mode::Prose, b'>') => Mode::Normal,
        (mode, _) => mode,
      };
      true
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn text(raw: &str) -> String {
    String::from_utf8(Source::new(raw.as_bytes()).text().to_vec()).unwrap()
  }

  #[test]
  fn comments_and_line_breaks() {
    assert_eq!(text("a = b ; the b\r\nc = d\re = f"), "a = b \nc = d\ne = f\n");
    assert_eq!(text("; only a comment\n"), "\n");
    assert_eq!(text("; no line break"), "");
    assert_eq!(text(""), "");
  }

  #[test]
  fn semicolons_in_quotes_and_prose() {
    assert_eq!(text("a = \";\" <x;y> ; z\n"), "a = \";\" <x;y> \n");
    // an unterminated quote ends with its line
    assert_eq!(text("a = \"x\nb = c ; d\n"), "a = \"x\nb = c \n");
  }

  #[test]
  fn continuation_lines() {
    assert_eq!(text("a = b\n    / c ; more\n  / d\n"), "a = b     / c    / d\n");
    assert_eq!(text("a = b\n\tc\n"), "a = b \tc\n");
  }

  #[test]
  fn positions_point_into_the_original() {
    let source = Source::new(b"a = b ; x\r\nc = @\r\n");
    let at = source.text().iter().position(|&b| b == b'@').unwrap();

    assert_eq!(source.position(at), Position { line: 2, column: 5 });
    assert_eq!(source.position(source.text().len()), Position { line: 3, column: 1 });
    assert_eq!(source.position(usize::MAX), Position { line: 3, column: 1 });
  }
}
