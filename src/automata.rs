mod dfa;
mod program;
mod range;

pub use dfa::{Dfa, DfaState, Edge};
pub use program::{compile, Direction, Program};
pub use range::{Range, RangeSet};

use crate::error::Result;
use crate::rule::{Rule, RuleList};

/// Builds the automaton for one rule of `rules`, over the alphabet of the
/// whole list.
pub fn build_dfa(
  rules: &RuleList,
  rule: &Rule,
  direction: Direction,
) -> Result<Dfa> {
  let program = compile(rules, rule.tokens(), direction)?;
  Dfa::new(program, rules.alphabet())
}

/// One reverse automaton per rule, in declaration order.
pub fn reverse_dfas(
  rules: &RuleList,
) -> Result<Vec<Dfa>> {
  rules.iter()
    .map(|rule| build_dfa(rules, rule, Direction::Reverse))
    .collect()
}
