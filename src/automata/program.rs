//! Nondeterministic automaton fragments and the RPN evaluator that builds them.

use super::range::{Range, RangeSet};
use crate::error::{Result, SyntaxError};
use crate::rule::{RuleList, Token, END_MARKER};

/// A Thompson-style fragment: one start state, one accepting state, edges on
/// symbol ranges and epsilon edges.
///
/// Combinators take their operands by value, so a fragment is used by at most
/// one of them.
#[derive(Debug, Clone)]
pub struct Program {
  states: Vec<State>,
  start: usize,
  accept: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct State {
  pub(crate) edges: Vec<(Range, usize)>,
  pub(crate) epsilons: Vec<usize>,
}

/// Which way a rule body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Forward,
  /// Matches the body's symbols last to first.
  Reverse,
}

impl Program {
  /// Matches the empty string.
  pub fn empty() -> Self {
    Program {
      states: vec![State::default()],
      start: 0,
      accept: 0,
    }
  }

  pub fn new_char(code: u32) -> Self {
    Self::edge(Range::single(code))
  }

  pub fn new_char_class(ranges: &RangeSet) -> Self {
    let mut states = vec![State::default(), State::default()];
    states[0].edges = ranges.iter().map(|&r| (r, 1)).collect();
    Program {
      states,
      start: 0,
      accept: 1,
    }
  }

  fn edge(range: Range) -> Self {
    Self::new_char_class(&RangeSet::from(range))
  }

  pub fn or(mut self, other: Program) -> Self {
    let (other_start, other_accept) = self.absorb(other);
    let start = self.add_state();
    let accept = self.add_state();
    self.states[start].epsilons.extend([self.start, other_start]);
    self.states[self.accept].epsilons.push(accept);
    self.states[other_accept].epsilons.push(accept);
    self.start = start;
    self.accept = accept;
    self
  }

  pub fn concatenate(mut self, other: Program) -> Self {
    let (other_start, other_accept) = self.absorb(other);
    self.states[self.accept].epsilons.push(other_start);
    self.accept = other_accept;
    self
  }

  /// Between `min` and `max` consecutive matches; `max == None` is unbounded.
  pub fn repeat(self, min: u32, max: Option<u32>) -> Self {
    let mut result = Program::empty();
    for _ in 0..min {
      result = result.concatenate(self.clone());
    }
    match max {
      None => result.concatenate(self.star()),
      Some(max) => {
        for _ in min..max {
          result = result.concatenate(self.clone().optional());
        }
        result
      }
    }
  }

  fn star(mut self) -> Self {
    let start = self.add_state();
    let accept = self.add_state();
    self.states[start].epsilons.extend([self.start, accept]);
    self.states[self.accept].epsilons.extend([self.start, accept]);
    self.start = start;
    self.accept = accept;
    self
  }

  fn optional(self) -> Self {
    self.or(Program::empty())
  }

  fn add_state(&mut self) -> usize {
    self.states.push(State::default());
    self.states.len() - 1
  }

  /// Moves the states of `other` into `self`, returning its renumbered start
  /// and accepting states.
  fn absorb(&mut self, other: Program) -> (usize, usize) {
    let offset = self.states.len();
    self.states.extend(other.states.into_iter().map(|mut state| {
      for (_, target) in &mut state.edges {
        *target += offset;
      }
      for target in &mut state.epsilons {
        *target += offset;
      }
      state
    }));
    (other.start + offset, other.accept + offset)
  }

  pub(crate) fn states(&self) -> &[State] {
    &self.states
  }

  pub(crate) fn start(&self) -> usize {
    self.start
  }

  pub(crate) fn accept(&self) -> usize {
    self.accept
  }
}

/// Evaluates a rule body in RPN into one fragment.
///
/// Literal codes above [`END_MARKER`], unknown rule names and inverted
/// repetition bounds are reported as [`SyntaxError`]s. A token sequence that is
/// not valid RPN means whoever produced it is broken, and panics.
pub fn compile(
  rules: &RuleList,
  tokens: &[Token],
  direction: Direction,
) -> Result<Program> {
  let mut stack: Vec<Program> = Vec::with_capacity(tokens.len());

  for token in tokens {
    let program = match token {
      Token::Alternation => {
        let (lhs, rhs) = pop_pair(&mut stack);
        lhs.or(rhs)
      }
      Token::Concatenation => {
        let (lhs, rhs) = pop_pair(&mut stack);
        match direction {
          Direction::Forward => lhs.concatenate(rhs),
          Direction::Reverse => rhs.concatenate(lhs),
        }
      }
      Token::Repetition { min, max } => {
        if let Some(max) = *max {
          if max < *min {
            return Err(SyntaxError::new(format!(
              "repetition {}*{} has an upper bound below its lower bound", min, max)));
          }
        }
        pop(&mut stack).repeat(*min, *max)
      }
      Token::Char(code) => {
        check_literal(*code)?;
        Program::new_char(*code)
      }
      Token::Num(range) => {
        check_literal(range.hi())?;
        Program::new_char_class(&RangeSet::from(*range))
      }
      Token::RuleName(name) => Program::new_char(rules.get(name)?.id()),
    };
    stack.push(program);
  }

  match (stack.pop(), stack.is_empty()) {
    (Some(program), true) => Ok(program),
    (None, _) => panic!("rule body is not in Reverse Polish Notation: it is empty"),
    (Some(_), false) => panic!(
      "rule body is not in Reverse Polish Notation: {} fragments left on the stack",
      stack.len() + 1),
  }
}

fn check_literal(code: u32) -> Result<()> {
  if code > END_MARKER {
    return Err(SyntaxError::new(format!(
      "ABNF doesn't support Unicode, character codes must be in range [0, {}].", END_MARKER)));
  }
  Ok(())
}

fn pop(stack: &mut Vec<Program>) -> Program {
  stack.pop()
    .unwrap_or_else(|| panic!("rule body is not in Reverse Polish Notation: missing operand"))
}

fn pop_pair(stack: &mut Vec<Program>) -> (Program, Program) {
  let rhs = pop(stack);
  let lhs = pop(stack);
  (lhs, rhs)
}
