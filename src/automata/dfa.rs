//! Subset construction from [`Program`] fragments.

use indexmap::IndexSet;
use super::program::Program;
use super::range::{Range, RangeSet};
use crate::bitset::BitSet;
use crate::error::{Result, SyntaxError};

/// Deterministic automaton over a bounded alphabet. State 0 is the start
/// state; a missing edge rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
  alphabet: RangeSet,
  states: Vec<DfaState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfaState {
  pub accepting: bool,
  /// sorted, non-overlapping
  pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
  pub range: Range,
  pub target: u32,
}

impl Dfa {
  pub const START: u32 = 0;

  /// Determinizes `program`. Every symbol the program mentions must lie inside
  /// `alphabet`.
  pub fn new(program: Program, alphabet: RangeSet) -> Result<Self> {
    for state in program.states() {
      for (range, _) in &state.edges {
        if !alphabet.includes(range) {
          return Err(SyntaxError::new(format!(
            "symbols {:?} are outside the alphabet {:?}", range, alphabet)));
        }
      }
    }

    let nfa = program.states();
    let mut sets = IndexSet::new();
    sets.insert(closure(&program, BitSet::from_bit(nfa.len(), program.start())));

    let mut states = vec![];
    let mut index = 0;
    while index < sets.len() {
      let set = sets[index].clone();
      index += 1;

      let mut bounds = vec![];
      for s in set.iter() {
        for (range, _) in &nfa[s].edges {
          bounds.push(range.lo());
          bounds.push(range.hi() + 1);
        }
      }
      bounds.sort_unstable();
      bounds.dedup();

      let mut edges: Vec<Edge> = vec![];
      for window in bounds.windows(2) {
        let (lo, hi) = (window[0], window[1] - 1);
        let mut targets = BitSet::new(nfa.len());
        for s in set.iter() {
          for (range, target) in &nfa[s].edges {
            if range.contains(lo) {
              targets.insert(*target);
            }
          }
        }
        if targets.is_empty() {
          continue;
        }
        let (target, _) = sets.insert_full(closure(&program, targets));
        let target = target as u32;
        match edges.last_mut() {
          Some(last) if last.target == target && last.range.hi() + 1 == lo => {
            last.range = Range::spanning(last.range.lo(), hi);
          }
          _ => edges.push(Edge {
            range: Range::spanning(lo, hi),
            target,
          }),
        }
      }

      states.push(DfaState {
        accepting: set.contains(program.accept()),
        edges,
      });
    }

    Ok(Dfa { alphabet, states })
  }

  pub fn start(&self) -> u32 {
    Self::START
  }

  pub fn state_count(&self) -> usize {
    self.states.len()
  }

  pub fn alphabet(&self) -> &RangeSet {
    &self.alphabet
  }

  pub fn states(&self) -> &[DfaState] {
    &self.states
  }

  pub fn is_accepting(&self, state: u32) -> bool {
    self.states[state as usize].accepting
  }

  pub fn edges(&self, state: u32) -> &[Edge] {
    &self.states[state as usize].edges
  }

  pub fn next(&self, state: u32, code: u32) -> Option<u32> {
    let edges = self.edges(state);
    let at = edges.partition_point(|e| e.range.hi() < code);
    edges.get(at)
      .filter(|e| e.range.contains(code))
      .map(|e| e.target)
  }

  /// Runs the automaton over `codes` from the start state.
  pub fn matches(&self, codes: impl IntoIterator<Item = u32>) -> bool {
    let mut state = self.start();
    for code in codes {
      match self.next(state, code) {
        Some(next) => state = next,
        None => return false,
      }
    }
    self.is_accepting(state)
  }
}

fn closure(program: &Program, mut set: BitSet) -> BitSet {
  let mut stack = set.iter().collect::<Vec<_>>();
  while let Some(s) = stack.pop() {
    for &t in &program.states()[s].epsilons {
      if set.insert(t) {
        stack.push(t);
      }
    }
  }
  set
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use crate::automata::{compile, Direction, RangeSet};
  use crate::grammar::*;
  use crate::rule::{RuleList, END_OF_INPUT, MIN_RULE_ID};

  fn dfa(expr: Expr, direction: Direction) -> Dfa {
    let rules = RuleList::default();
    let program = compile(&rules, &expr.to_tokens().unwrap(), direction).unwrap();
    Dfa::new(program, rules.alphabet()).unwrap()
  }

  fn bytes(s: &str) -> impl Iterator<Item = u32> + '_ {
    s.bytes().map(u32::from)
  }

  #[test]
  fn literal_and_alternation() {
    let dfa = dfa(lit("ab") | lit("c"), Direction::Forward);

    assert!(dfa.matches(bytes("ab")));
    assert!(dfa.matches(bytes("AB")));
    assert!(dfa.matches(bytes("c")));
    assert!(!dfa.matches(bytes("a")));
    assert!(!dfa.matches(bytes("abc")));
    assert!(!dfa.matches(bytes("")));
  }

  #[test]
  fn reverse_reads_backward() {
    let expr = seq([chr(0x61), many(chr(0x62)), chr(0x63)]);
    let forward = dfa(expr.clone(), Direction::Forward);
    let reverse = dfa(expr, Direction::Reverse);

    assert!(forward.matches(bytes("abbc")));
    assert!(!forward.matches(bytes("cbba")));
    assert!(reverse.matches(bytes("cbba")));
    assert!(reverse.matches(bytes("ca")));
    assert!(!reverse.matches(bytes("abbc")));
  }

  #[test]
  fn bounded_repetition() {
    let dfa = dfa(rep(2, Some(4), chr(0x78)), Direction::Forward);
    let counts = (0..7)
      .filter(|&n| dfa.matches(std::iter::repeat(0x78).take(n)))
      .collect::<Vec<_>>();

    assert_eq!(counts, vec![2, 3, 4]);
  }

  #[test]
  fn exact_and_open_repetition() {
    let exact = dfa(rep(3, Some(3), chr(1)), Direction::Forward);
    assert!(exact.matches([1, 1, 1]));
    assert!(!exact.matches([1, 1]));

    let open = dfa(rep(2, None, chr(1)), Direction::Forward);
    assert!(!open.matches([1]));
    assert!(open.matches([1; 9]));

    let nothing = dfa(rep(0, Some(0), chr(1)), Direction::Forward);
    assert!(nothing.matches(std::iter::empty()));
    assert!(!nothing.matches([1]));
  }

  #[test]
  fn adjacent_edges_merge() {
    let mut class = RangeSet::new();
    class.add(Range::new(0x30, 0x39).unwrap());
    class.add(Range::new(0x3a, 0x40).unwrap());
    assert_eq!(class.iter().count(), 2);

    let dfa = Dfa::new(Program::new_char_class(&class), RuleList::default().alphabet()).unwrap();

    assert_eq!(dfa.edges(dfa.start()).len(), 1);
    assert_eq!(dfa.edges(dfa.start())[0].range, Range::new(0x30, 0x40).unwrap());
  }

  #[test]
  fn construction_is_deterministic() {
    let expr = many(lit("ab") | seq([range(0x30, 0x39), option(lit("-"))]));

    let first = dfa(expr.clone(), Direction::Reverse);
    let second = dfa(expr, Direction::Reverse);

    assert_eq!(first, second);
  }

  #[test]
  fn symbols_outside_alphabet() {
    let rules = RuleList::default();
    let program = Program::new_char(MIN_RULE_ID + 3);
    let err = Dfa::new(program, rules.alphabet()).unwrap_err();
    assert!(err.message().contains("outside the alphabet"));

    let program = Program::new_char(END_OF_INPUT);
    assert!(Dfa::new(program, rules.alphabet()).is_err());
  }
}
