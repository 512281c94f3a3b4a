//! Writing a compiled grammar out as source code.

use std::io::{self, Write};
use crate::automata::Dfa;
use crate::parser::{Action, ParsingTable};
use crate::rule::{END_OF_INPUT, MIN_RULE_ID};

/// Turns the reverse automata and parsing table of a grammar into a parser in
/// some target language.
pub trait CodeGenerator {
  fn generate(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// Generates a self-contained Rust module exposing `parse(&[u8])`.
pub struct RustCodeGenerator<'a> {
  reverse_dfas: &'a [Dfa],
  table: &'a ParsingTable,
}

impl<'a> RustCodeGenerator<'a> {
  pub fn new(
    reverse_dfas: &'a [Dfa],
    table: &'a ParsingTable,
  ) -> Self {
    assert_eq!(reverse_dfas.len(), table.rule_names().len(), "one reverse automaton per rule");
    RustCodeGenerator {
      reverse_dfas,
      table,
    }
  }

  fn write_constants(&self, out: &mut dyn Write) -> io::Result<()> {
    let names = self.table.rule_names();
    writeln!(out, "pub const END_OF_INPUT: u32 = {};", END_OF_INPUT)?;
    writeln!(out, "pub const MIN_RULE_ID: u32 = {};", MIN_RULE_ID)?;
    writeln!(out, "pub const START_RULE: u32 = {};", self.table.start_rule())?;
    write!(out, "pub const RULE_NAMES: [&str; {}] = [", names.len())?;
    for (i, name) in names.iter().enumerate() {
      if i > 0 {
        write!(out, ", ")?;
      }
      write!(out, "{:?}", name)?;
    }
    writeln!(out, "];")?;
    writeln!(out)
  }

  fn write_actions(&self, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "/// Per state: sorted `(lo, hi, action)` runs of lookaheads.")?;
    writeln!(out, "static ACTIONS: &[&[(u32, u32, Action)]] = &[")?;
    for state in 0..self.table.state_count() as u32 {
      let runs = self.table.actions(state).into_iter()
        .filter_map(|(lo, hi, action)| {
          let action = match action {
            Action::Shift(target) => format!("Action::Shift({})", target),
            Action::Reduce(rule) => format!("Action::Reduce({})", rule),
            Action::Accept => "Action::Accept".to_owned(),
            Action::Error => return None,
          };
          Some(format!("({}, {}, {})", lo, hi, action))
        })
        .collect::<Vec<_>>();
      writeln!(out, "  &[{}],", runs.join(", "))?;
    }
    writeln!(out, "];")?;
    writeln!(out)
  }

  fn write_gotos(&self, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "/// Per state: `(rule, target)` sorted by rule.")?;
    writeln!(out, "static GOTOS: &[&[(u32, u32)]] = &[")?;
    for state in 0..self.table.state_count() as u32 {
      let gotos = self.table.gotos(state).iter()
        .map(|(rule, target)| format!("({}, {})", rule, target))
        .collect::<Vec<_>>();
      writeln!(out, "  &[{}],", gotos.join(", "))?;
    }
    writeln!(out, "];")?;
    writeln!(out)
  }

  fn write_reverse_dfas(&self, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "/// Per rule: the states of its reverse automaton, `(accepting, edges)`.")?;
    writeln!(out, "static REVERSE_DFAS: &[&[(bool, &[(u32, u32, u32)])]] = &[")?;
    for (dfa, name) in self.reverse_dfas.iter().zip(self.table.rule_names()) {
      writeln!(out, "  // {}", name)?;
      writeln!(out, "  &[")?;
      for state in dfa.states() {
        let edges = state.edges.iter()
          .map(|edge| format!("({}, {}, {})", edge.range.lo(), edge.range.hi(), edge.target))
          .collect::<Vec<_>>();
        writeln!(out, "    ({}, &[{}]),", state.accepting, edges.join(", "))?;
      }
      writeln!(out, "  ],")?;
    }
    writeln!(out, "];")?;
    writeln!(out)
  }
}

impl CodeGenerator for RustCodeGenerator<'_> {
  fn generate(&self, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "// Generated by abnf-gen. Do not edit.")?;
    writeln!(out)?;
    self.write_constants(out)?;
    self.write_actions(out)?;
    self.write_gotos(out)?;
    self.write_reverse_dfas(out)?;
    out.write_all(RUNTIME.as_bytes())
  }
}

const RUNTIME: &str = r##"use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(u32),
    Reduce(u32),
    Accept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Char(u8),
    Rule { id: u32, children: Vec<Node> },
}

impl Node {
    pub fn text(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut Vec<u8>) {
        match self {
            Node::Char(b) => out.push(*b),
            Node::Rule { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    pub fn rule_name(&self) -> Option<&'static str> {
        match self {
            Node::Char(_) => None,
            Node::Rule { id, .. } => Some(RULE_NAMES[(id - MIN_RULE_ID) as usize]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// byte offset of the lookahead that failed
    pub offset: usize,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "offset {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

fn find<T: Copy>(runs: &[(u32, u32, T)], symbol: u32) -> Option<T> {
    let i = runs.partition_point(|&(_, hi, _)| hi < symbol);
    runs.get(i).filter(|&&(lo, _, _)| lo <= symbol).map(|&(_, _, value)| value)
}

fn goto(state: u32, rule: u32) -> Option<u32> {
    let gotos = GOTOS[state as usize];
    gotos.binary_search_by_key(&rule, |&(id, _)| id).ok().map(|i| gotos[i].1)
}

fn unexpected(input: &[u8], offset: usize) -> String {
    match input.get(offset) {
        None => "unexpected end of input".to_owned(),
        Some(&b) if b.is_ascii_graphic() || b == b' ' => format!("unexpected \"{}\"", b as char),
        Some(b) => format!("unexpected byte 0x{:02x}", b),
    }
}

/// Longest suffix of `symbols` accepted by the reverse automaton of `rule`
/// whose exposed state has a goto on `rule`.
fn pop_length(rule: u32, states: &[u32], symbols: &[(u32, Node)]) -> Option<(usize, u32)> {
    let dfa = REVERSE_DFAS[(rule - MIN_RULE_ID) as usize];
    let goto_at = |len: usize| goto(states[states.len() - 1 - len], rule);
    let mut best = None;
    let mut q = 0;
    if dfa[0].0 {
        best = goto_at(0).map(|target| (0, target));
    }
    for (len, (symbol, _)) in symbols.iter().rev().enumerate() {
        q = match find(dfa[q as usize].1, *symbol) {
            Some(next) => next,
            None => break,
        };
        if dfa[q as usize].0 {
            if let Some(target) = goto_at(len + 1) {
                best = Some((len + 1, target));
            }
        }
    }
    best
}

pub fn parse(input: &[u8]) -> Result<Node, ParseError> {
    let error = |offset: usize, message: String| ParseError { offset, message };
    let mut states: Vec<u32> = vec![0];
    let mut symbols: Vec<(u32, Node)> = Vec::new();
    let mut offset = 0;
    let mut streak = 0;
    let mut seen: HashSet<(Vec<u32>, Vec<u32>)> = HashSet::new();

    loop {
        let lookahead = input.get(offset).map_or(END_OF_INPUT, |&b| b as u32);
        let state = states[states.len() - 1];
        match find(ACTIONS[state as usize], lookahead) {
            Some(Action::Shift(target)) => {
                symbols.push((lookahead, Node::Char(input[offset])));
                states.push(target);
                offset += 1;
                streak = 0;
                seen.clear();
            }
            Some(Action::Reduce(rule)) => {
                streak += 1;
                if streak > ACTIONS.len() {
                    let stack = (states.clone(), symbols.iter().map(|(symbol, _)| *symbol).collect());
                    if !seen.insert(stack) {
                        return Err(error(offset, "the grammar is cyclic".to_owned()));
                    }
                }
                let (len, target) = pop_length(rule, &states, &symbols)
                    .ok_or_else(|| error(offset, unexpected(input, offset)))?;
                let children = symbols.drain(symbols.len() - len..).map(|(_, node)| node).collect();
                states.truncate(states.len() - len);
                symbols.push((rule, Node::Rule { id: rule, children }));
                states.push(target);
            }
            Some(Action::Accept) => {
                return symbols.pop()
                    .map(|(_, node)| node)
                    .ok_or_else(|| error(offset, "empty parse".to_owned()));
            }
            None => return Err(error(offset, unexpected(input, offset))),
        }
    }
}
"##;

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use crate::automata::reverse_dfas;
  use crate::grammar::*;

  fn generate(rules: &[(&str, Expr)]) -> String {
    let rules = grammar(rules).unwrap();
    let dfas = reverse_dfas(&rules).unwrap();
    let table = ParsingTable::new(&rules).unwrap();
    let mut out = vec![];
    RustCodeGenerator::new(&dfas, &table).generate(&mut out).unwrap();
    String::from_utf8(out).unwrap()
  }

  #[test]
  fn module_layout() {
    let code = generate(&[
      ("list", seq([sym("item"), many(seq([chr(0x2c), sym("item")]))])),
      ("item", some(range(0x61, 0x7a))),
    ]);

    assert!(code.starts_with("// Generated by abnf-gen. Do not edit.\n"));
    assert!(code.contains("pub const START_RULE: u32 = 257;\n"));
    assert!(code.contains("pub const RULE_NAMES: [&str; 2] = [\"list\", \"item\"];\n"));
    assert!(code.contains("  &[(97, 122, Action::Shift("));
    assert!(code.contains("  // item\n"));
    assert!(code.contains("pub fn parse(input: &[u8]) -> Result<Node, ParseError>"));
  }

  #[test]
  fn one_row_per_state() {
    let rules = grammar(&[("s", some(chr(0x61)))]).unwrap();
    let dfas = reverse_dfas(&rules).unwrap();
    let table = ParsingTable::new(&rules).unwrap();
    let mut out = vec![];
    RustCodeGenerator::new(&dfas, &table).generate(&mut out).unwrap();
    let code = String::from_utf8(out).unwrap();

    let section = |header: &str| {
      code.lines()
        .skip_while(|line| !line.starts_with(header))
        .skip(1)
        .take_while(|line| *line != "];")
        .count()
    };
    assert_eq!(section("static ACTIONS"), table.state_count());
    assert_eq!(section("static GOTOS"), table.state_count());
  }

  #[test]
  fn output_is_deterministic() {
    let rules = || [
      ("s", many(lit("ab") | seq([range(0x30, 0x39), option(lit("-"))]))),
    ];
    assert_eq!(generate(&rules()), generate(&rules()));
  }
}
