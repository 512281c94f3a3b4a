//! Reading ABNF text into a [`RuleList`].
//!
//! The text is parsed with the parser generated from [`crate::meta`], then the
//! parse tree is lowered to the same RPN tokens the combinators produce.

mod builder;
mod core_rules;

pub use builder::RuleListBuilder;
pub use core_rules::{core_rule, CORE_RULE_NAMES};

use tracing::{debug, info};
use crate::automata::Range;
use crate::error::{Result, SyntaxError};
use crate::grammar::literal;
use crate::meta;
use crate::parser::{Node, Parser};
use crate::rule::{RuleList, Token};
use crate::source::Source;

pub struct AbnfParser {
  parser: Parser,
  ids: MetaIds,
  core_rules: bool,
}

/// Identifiers of the meta-grammar rules the tree walker looks at.
struct MetaIds {
  rule: u32,
  rulename: u32,
  defined_as: u32,
  alternation: u32,
  concatenation: u32,
  repetition: u32,
  repeat: u32,
  element: u32,
  group: u32,
  option: u32,
  char_val: u32,
  num_val: u32,
  bin_val: u32,
  dec_val: u32,
  hex_val: u32,
  prose_val: u32,
}

impl MetaIds {
  fn new(rules: &RuleList) -> Result<Self> {
    let id = |name: &str| rules.get(name).map(|rule| rule.id());
    Ok(MetaIds {
      rule: id("rule")?,
      rulename: id("rulename")?,
      defined_as: id("defined-as")?,
      alternation: id("alternation")?,
      concatenation: id("concatenation")?,
      repetition: id("repetition")?,
      repeat: id("repeat")?,
      element: id("element")?,
      group: id("group")?,
      option: id("option")?,
      char_val: id("char-val")?,
      num_val: id("num-val")?,
      bin_val: id("bin-val")?,
      dec_val: id("dec-val")?,
      hex_val: id("hex-val")?,
      prose_val: id("prose-val")?,
    })
  }
}

impl AbnfParser {
  /// Compiles the meta-grammar. Core rules are completed by default.
  pub fn new() -> Result<Self> {
    let parser = Parser::build(meta::rules()?)?;
    debug!(
      states = parser.table().state_count(),
      conflicts = parser.table().conflicts().len(),
      "meta grammar compiled");
    let ids = MetaIds::new(parser.rules())?;
    Ok(AbnfParser {
      parser,
      ids,
      core_rules: true,
    })
  }

  pub fn with_core_rules(mut self, enabled: bool) -> Self {
    self.core_rules = enabled;
    self
  }

  pub fn meta_parser(&self) -> &Parser {
    &self.parser
  }

  /// Reads ABNF text. Errors in a rule body are reported at the start of the
  /// rule.
  pub fn parse(&self, input: &[u8]) -> Result<RuleList> {
    let source = Source::new(input);
    let tree = self.parser.parse_located(source.text(), |offset| source.position(offset))?;

    let mut builder = RuleListBuilder::new().core_rules(self.core_rules);
    let mut offset = 0;
    for node in tree.children() {
      if node.rule() == Some(self.ids.rule) {
        self.add_rule(&mut builder, node)
          .map_err(|err| SyntaxError::at(source.position(offset), err.message()))?;
      }
      offset += node.text().len();
    }

    let rules = builder.build()?;
    info!(rules = rules.len(), "grammar read");
    Ok(rules)
  }

  fn add_rule(&self, builder: &mut RuleListBuilder, node: &Node) -> Result<()> {
    let name = text(self.child(node, self.ids.rulename)?);
    let incremental = self.child(node, self.ids.defined_as)?.text().ends_with(b"/");
    let tokens = self.alternation(self.child(node, self.ids.alternation)?)?;
    if incremental {
      builder.extend(&name, tokens)
    } else {
      builder.define(&name, tokens)
    }
  }

  fn alternation(&self, node: &Node) -> Result<Vec<Token>> {
    self.fold(node, self.ids.concatenation, Token::Alternation, |n| self.concatenation(n))
  }

  fn concatenation(&self, node: &Node) -> Result<Vec<Token>> {
    self.fold(node, self.ids.repetition, Token::Concatenation, |n| self.repetition(n))
  }

  /// Lowers the `id` children of `node` and joins them with `op`, folding to
  /// the left.
  fn fold(
    &self,
    node: &Node,
    id: u32,
    op: Token,
    lower: impl Fn(&Node) -> Result<Vec<Token>>,
  ) -> Result<Vec<Token>> {
    let mut out = vec![];
    let mut operands = node.children().iter().filter(|child| child.rule() == Some(id));
    let first = operands.next().ok_or_else(|| self.missing(id))?;
    out.extend(lower(first)?);
    for operand in operands {
      out.extend(lower(operand)?);
      out.push(op.clone());
    }
    Ok(out)
  }

  fn repetition(&self, node: &Node) -> Result<Vec<Token>> {
    let mut out = self.element(self.child(node, self.ids.element)?)?;
    if let Ok(repeat) = self.child(node, self.ids.repeat) {
      let (min, max) = repeat_bounds(&text(repeat))?;
      out.push(Token::Repetition { min, max });
    }
    Ok(out)
  }

  fn element(&self, node: &Node) -> Result<Vec<Token>> {
    let inner = node.children().first()
      .ok_or_else(|| self.missing(self.ids.element))?;
    let ids = &self.ids;
    match inner.rule() {
      Some(id) if id == ids.rulename => Ok(vec![Token::RuleName(text(inner))]),
      Some(id) if id == ids.group => self.alternation(self.child(inner, ids.alternation)?),
      Some(id) if id == ids.option => {
        let mut out = self.alternation(self.child(inner, ids.alternation)?)?;
        out.push(Token::Repetition { min: 0, max: Some(1) });
        Ok(out)
      }
      Some(id) if id == ids.char_val => {
        let quoted = inner.text();
        literal(&quoted[1..quoted.len() - 1])
      }
      Some(id) if id == ids.num_val => self.num_val(inner),
      Some(id) if id == ids.prose_val => Err(SyntaxError::new(format!(
        "prose values are not supported: {}", text(inner)))),
      _ => Err(self.missing(ids.element)),
    }
  }

  fn num_val(&self, node: &Node) -> Result<Vec<Token>> {
    let ids = &self.ids;
    for value in node.children() {
      let radix = match value.rule() {
        Some(id) if id == ids.bin_val => 2,
        Some(id) if id == ids.dec_val => 10,
        Some(id) if id == ids.hex_val => 16,
        _ => continue,
      };
      return num_value(&text(value), radix);
    }
    Err(self.missing(ids.num_val))
  }

  fn child<'n>(&self, node: &'n Node, id: u32) -> Result<&'n Node> {
    node.children().iter()
      .find(|child| child.rule() == Some(id))
      .ok_or_else(|| self.missing(id))
  }

  fn missing(&self, id: u32) -> SyntaxError {
    let name = self.parser.table().rule_name(id).unwrap_or("?");
    SyntaxError::new(format!("parse tree lacks a '{}' node", name))
  }
}

fn text(node: &Node) -> String {
  String::from_utf8_lossy(&node.text()).into_owned()
}

/// `n`, `n*`, `*m`, `n*m` or `*`.
fn repeat_bounds(repeat: &str) -> Result<(u32, Option<u32>)> {
  let count = |digits: &str| {
    digits.parse::<u32>()
      .map_err(|_| SyntaxError::new(format!("repeat count '{}' is too large", digits)))
  };
  match repeat.split_once('*') {
    None => {
      let n = count(repeat)?;
      Ok((n, Some(n)))
    }
    Some((min, max)) => {
      let min = if min.is_empty() { 0 } else { count(min)? };
      let max = if max.is_empty() { None } else { Some(count(max)?) };
      Ok((min, max))
    }
  }
}

/// A numeric value without its `%`: a base letter, then one value, a `.`
/// separated series, or a `-` range.
fn num_value(value: &str, radix: u32) -> Result<Vec<Token>> {
  let digits = &value[1..];
  let number = |digits: &str| {
    u32::from_str_radix(digits, radix)
      .map_err(|_| SyntaxError::new(format!("numeric value '%{}' is too large", value)))
  };

  if let Some((lo, hi)) = digits.split_once('-') {
    return Ok(vec![Token::Num(Range::new(number(lo)?, number(hi)?)?)]);
  }
  let mut out = vec![];
  for (i, code) in digits.split('.').enumerate() {
    out.push(Token::Char(number(code)?));
    if i > 0 {
      out.push(Token::Concatenation);
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use crate::rule::Token::*;

  fn parse(text: &str) -> Result<RuleList> {
    AbnfParser::new().unwrap().parse(text.as_bytes())
  }

  fn tokens(rules: &RuleList, name: &str) -> Vec<Token> {
    rules.get(name).unwrap().tokens().to_vec()
  }

  fn name(s: &str) -> Token {
    RuleName(s.to_owned())
  }

  #[test]
  fn meta_grammar_reads_itself() {
    let rules = parse(meta::META_GRAMMAR).unwrap();
    assert_eq!(rules, meta::rules().unwrap());
  }

  #[test]
  fn alternatives_and_sequences() {
    let rules = parse("greeting = \"hi\" SP name / %x21\nname = 1*ALPHA\n").unwrap();

    assert_eq!(tokens(&rules, "greeting"), vec![
      Char(b'h' as u32), Char(b'H' as u32), Alternation,
      Char(b'i' as u32), Char(b'I' as u32), Alternation,
      Concatenation,
      name("SP"),
      Concatenation,
      name("name"),
      Concatenation,
      Char(0x21),
      Alternation,
    ]);
    assert_eq!(tokens(&rules, "name"), vec![name("ALPHA"), Repetition { min: 1, max: None }]);

    let names = rules.iter().map(|rule| rule.name()).collect::<Vec<_>>();
    assert_eq!(names, vec!["greeting", "name", "SP", "ALPHA"]);
  }

  #[test]
  fn repeat_forms() {
    let rules = parse("a = 3b [b]\nb = *2\"-\" / 1*( \"+\" ) / 2*4%x7A\n").unwrap();

    assert_eq!(tokens(&rules, "a"), vec![
      name("b"), Repetition { min: 3, max: Some(3) },
      name("b"), Repetition { min: 0, max: Some(1) },
      Concatenation,
    ]);
    assert_eq!(tokens(&rules, "b"), vec![
      Char(0x2d), Repetition { min: 0, max: Some(2) },
      Char(0x2b), Repetition { min: 1, max: None },
      Alternation,
      Char(0x7a), Repetition { min: 2, max: Some(4) },
      Alternation,
    ]);
  }

  #[test]
  fn numeric_values() {
    let rules = parse("crlf = %d13.10 / %b101 / %x30-39\n").unwrap();

    assert_eq!(tokens(&rules, "crlf"), vec![
      Char(13), Char(10), Concatenation,
      Char(5),
      Alternation,
      Num(Range::new(0x30, 0x39).unwrap()),
      Alternation,
    ]);
  }

  #[test]
  fn comments_and_continuations() {
    let rules = parse("; header\r\n\r\nlist = item ; first\r\n       *( \",\" item )\r\nitem = %x61\r\n")
      .unwrap();

    assert_eq!(tokens(&rules, "list"), vec![
      name("item"),
      Char(0x2c), name("item"), Concatenation, Repetition { min: 0, max: None },
      Concatenation,
    ]);
  }

  #[test]
  fn incremental_alternatives() {
    let rules = parse("a = \"x\"\nb = a\na =/ %x79\n").unwrap();
    assert_eq!(tokens(&rules, "a"), vec![
      Char(b'x' as u32), Char(b'X' as u32), Alternation,
      Char(0x79),
      Alternation,
    ]);
  }

  #[test]
  fn empty_grammar() {
    assert!(parse("").unwrap().is_empty());
    assert!(parse("; nothing here\n\n   \n").unwrap().is_empty());
  }

  #[test]
  fn conversion_errors_point_at_the_rule() {
    let err = parse("a = b\nb = <some prose>\n").unwrap_err();
    insta::assert_snapshot!(err.to_string(),
      @"line 2, column 1: prose values are not supported: <some prose>");

    let err = parse("a = \"x\"\r\n\r\nA = \"y\"\r\n").unwrap_err();
    insta::assert_snapshot!(err.to_string(),
      @"line 3, column 1: rule 'A' is already defined, use '=/' to add alternatives");

    let err = parse("a = \"\"\n").unwrap_err();
    assert_eq!(err.message(), "line 1, column 1: empty quoted strings are not supported");

    let err = parse("a = %x100000000\n").unwrap_err();
    assert_eq!(err.message(), "line 1, column 1: numeric value '%x100000000' is too large");

    let err = parse("a = %x39-30\n").unwrap_err();
    assert!(err.message().contains("invalid range [57, 48]"), "{}", err);
  }

  #[test]
  fn syntax_errors() {
    let err = parse("a = b\nc = (d\nb = %x20\n").unwrap_err();
    assert_eq!(err.message(), "line 2, column 7: unexpected end of line");

    let err = parse("a = b\n").unwrap_err();
    assert_eq!(err.message(), "rule 'b' referenced by 'a' is not defined");
  }

  #[test]
  fn core_rules_can_be_disabled() {
    let parser = AbnfParser::new().unwrap();
    assert_eq!(parser.parse(b"a = DIGIT\n").unwrap().len(), 2);

    let parser = parser.with_core_rules(false);
    assert!(parser.parse(b"a = DIGIT\n").is_err());
  }
}
