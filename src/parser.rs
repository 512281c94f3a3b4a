//! The table-driven parser.
//!
//! Shifts and reductions come from the [`ParsingTable`]. A rule body is a
//! regular expression, so the length of a reduction is not fixed: the rule's
//! reverse automaton walks down the symbol stack and the longest accepted
//! suffix that leaves a valid goto is popped.

use std::collections::HashSet;
use tracing::trace;
use crate::automata::{reverse_dfas, Dfa};
use crate::error::{Position, Result, SyntaxError};
use crate::rule::{RuleList, END_OF_INPUT, MIN_RULE_ID};

mod sets;
mod state;
mod table;
mod token_set;

pub use table::{Action, Conflict, ParsingTable};

/// A parse tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  Char(u8),
  Rule {
    id: u32,
    children: Vec<Node>,
  },
}

impl Node {
  /// The matched bytes, in input order.
  pub fn text(&self) -> Vec<u8> {
    let mut out = vec![];
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

  pub fn children(&self) -> &[Node] {
    match self {
      Node::Char(_) => &[],
      Node::Rule { children, .. } => children,
    }
  }

  /// The rule identifier of a rule node.
  pub fn rule(&self) -> Option<u32> {
    match self {
      Node::Char(_) => None,
      Node::Rule { id, .. } => Some(*id),
    }
  }
}

pub struct Parser {
  rules: RuleList,
  reverse_dfas: Vec<Dfa>,
  table: ParsingTable,
}

impl Parser {
  /// `reverse_dfas[i]` must be the reverse automaton of the `i`-th rule of
  /// `rules`, and `table` must have been built from the same rules.
  pub fn new(
    rules: RuleList,
    reverse_dfas: Vec<Dfa>,
    table: ParsingTable,
  ) -> Self {
    assert_eq!(rules.len(), reverse_dfas.len(), "one reverse automaton per rule");
    let alphabet = rules.alphabet();
    assert!(reverse_dfas.iter().all(|dfa| *dfa.alphabet() == alphabet), "automata over the rules' alphabet");
    Parser {
      rules,
      reverse_dfas,
      table,
    }
  }

  /// Compiles `rules` with the first rule as the start rule.
  pub fn build(rules: RuleList) -> Result<Self> {
    let reverse_dfas = reverse_dfas(&rules)?;
    let table = ParsingTable::new(&rules)?;
    Ok(Self::new(rules, reverse_dfas, table))
  }

  pub fn rules(&self) -> &RuleList {
    &self.rules
  }

  pub fn table(&self) -> &ParsingTable {
    &self.table
  }

  pub fn parse(&self, input: &[u8]) -> Result<Node> {
    self.parse_located(input, |offset| Position::of(input, offset))
  }

  /// Like [`Parser::parse`], with `locate` mapping a byte offset of `input`
  /// (or `input.len()` for end of input) to the position reported in errors.
  pub fn parse_located(
    &self,
    input: &[u8],
    locate: impl Fn(usize) -> Position,
  ) -> Result<Node> {
    let mut states: Vec<u32> = vec![0];
    let mut symbols: Vec<(u32, Node)> = vec![];
    let mut offset = 0;
    // reductions since the last shift, and the stacks seen once that run got
    // longer than the table has states
    let mut streak = 0;
    let mut seen = HashSet::new();

    loop {
      let lookahead = input.get(offset).map_or(END_OF_INPUT, |&b| b as u32);
      let state = *states.last().unwrap_or(&0);

      match self.table.action(state, lookahead) {
        Action::Shift(target) => {
          symbols.push((lookahead, Node::Char(input[offset])));
          states.push(target);
          offset += 1;
          streak = 0;
          seen.clear();
        }
        Action::Reduce(rule) => {
          // Between two shifts the lookahead is fixed and the stack height is
          // bounded, so the parser loops exactly when a stack comes back.
          streak += 1;
          if streak > self.table.state_count() {
            let stack = (states.clone(), symbols.iter().map(|&(symbol, _)| symbol).collect::<Vec<_>>());
            if !seen.insert(stack) {
              return Err(SyntaxError::at(locate(offset), format!(
                "rule '{}' keeps reducing without consuming input, the grammar is cyclic",
                self.rule_name(rule))));
            }
          }

          let (len, target) = self.pop_length(rule, &states, &symbols)
            .ok_or_else(|| SyntaxError::at(locate(offset), format!(
              "{} while reducing rule '{}'", unexpected(input.get(offset)), self.rule_name(rule))))?;
          trace!(rule = self.rule_name(rule), len, "reduce");

          let children = symbols.drain(symbols.len() - len..)
            .map(|(_, node)| node)
            .collect();
          states.truncate(states.len() - len);
          symbols.push((rule, Node::Rule { id: rule, children }));
          states.push(target);
        }
        Action::Accept => {
          return symbols.pop()
            .map(|(_, node)| node)
            .ok_or_else(|| SyntaxError::at(locate(offset), "empty parse"));
        }
        Action::Error => {
          return Err(SyntaxError::at(locate(offset), unexpected(input.get(offset))));
        }
      }
    }
  }

  /// Finds the longest suffix of the symbol stack accepted by `rule`'s reverse
  /// automaton whose exposed state has a goto on `rule`. Returns the suffix
  /// length and the goto target.
  fn pop_length(
    &self,
    rule: u32,
    states: &[u32],
    symbols: &[(u32, Node)],
  ) -> Option<(usize, u32)> {
    let dfa = &self.reverse_dfas[(rule - MIN_RULE_ID) as usize];
    let goto = |len: usize| self.table.goto(states[states.len() - 1 - len], rule);

    let mut best = None;
    let mut q = dfa.start();
    if dfa.is_accepting(q) {
      best = goto(0).map(|target| (0, target));
    }
    for (len, (symbol, _)) in symbols.iter().rev().enumerate() {
      q = match dfa.next(q, *symbol) {
        Some(next) => next,
        None => break,
      };
      if dfa.is_accepting(q) {
        if let Some(target) = goto(len + 1) {
          best = Some((len + 1, target));
        }
      }
    }
    best
  }

  fn rule_name(&self, id: u32) -> &str {
    self.table.rule_name(id).unwrap_or("?")
  }
}

fn unexpected(byte: Option<&u8>) -> String {
  match byte {
    None => "unexpected end of input".to_owned(),
    Some(b'\n') => "unexpected end of line".to_owned(),
    Some(&b) if b.is_ascii_graphic() || b == b' ' => format!("unexpected \"{}\"", b as char),
    Some(b) => format!("unexpected byte 0x{:02x}", b),
  }
}
