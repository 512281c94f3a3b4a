use crate::automata::{Dfa, Range};
use crate::rule::{END_MARKER, END_OF_INPUT, MIN_RULE_ID};
use super::token_set::TokenSet;

/// The literal codes covered by an edge, if any. Literal ranges and rule
/// ranges never share an edge because `END_OF_INPUT` separates them.
pub(super) fn char_span(range: Range) -> Option<(u32, u32)> {
  if range.lo() <= END_MARKER {
    Some((range.lo(), range.hi().min(END_MARKER)))
  } else {
    None
  }
}

/// Indices of the rules whose symbols an edge covers.
pub(super) fn rule_span(range: Range) -> std::ops::Range<usize> {
  let lo = range.lo().max(MIN_RULE_ID) - MIN_RULE_ID;
  let end = (range.hi() + 1).saturating_sub(MIN_RULE_ID);
  lo as usize..end as usize
}

pub(super) fn gen_nullable(
  dfas: &[Dfa],
) -> Vec<bool> {
  let mut nullable = vec![false; dfas.len()];

  loop {
    let mut changed = false;
    for (i, dfa) in dfas.iter().enumerate() {
      if !nullable[i] && reaches_accept(dfa, dfa.start(), &nullable) {
        nullable[i] = true;
        changed = true;
      }
    }
    if !changed {
      break;
    }
  }

  nullable
}

/// Whether an accepting state is reachable from `from` over nullable rules
/// only.
fn reaches_accept(dfa: &Dfa, from: u32, nullable: &[bool]) -> bool {
  let mut visited = vec![false; dfa.state_count()];
  let mut stack = vec![from];
  visited[from as usize] = true;
  while let Some(q) = stack.pop() {
    if dfa.is_accepting(q) {
      return true;
    }
    for edge in dfa.edges(q) {
      let target = edge.target as usize;
      if !visited[target] && rule_span(edge.range).any(|r| nullable[r]) {
        visited[target] = true;
        stack.push(edge.target);
      }
    }
  }
  false
}

pub(super) fn gen_first(
  dfas: &[Dfa],
  nullable: &[bool],
) -> Vec<TokenSet> {
  let mut buf = TokenSet::new();
  let mut first = vec![buf.clone(); dfas.len()];

  loop {
    let mut changed = false;
    for (i, dfa) in dfas.iter().enumerate() {
      buf.clear();
      compute_first_from(&mut buf, &first, nullable, dfa, dfa.start());
      changed |= first[i].union_with(&buf);
    }
    if !changed {
      break;
    }
  }

  first
}

/// Adds to `result` every literal that can come first when `dfa` continues
/// from state `from`. Returns whether the rule may also end there without
/// consuming anything more.
pub(super) fn compute_first_from(
  result: &mut TokenSet,
  first: &[TokenSet],
  nullable: &[bool],
  dfa: &Dfa,
  from: u32,
) -> bool {
  let mut visited = vec![false; dfa.state_count()];
  let mut stack = vec![from];
  visited[from as usize] = true;
  let mut may_end = false;

  while let Some(q) = stack.pop() {
    may_end |= dfa.is_accepting(q);
    for edge in dfa.edges(q) {
      if let Some((lo, hi)) = char_span(edge.range) {
        result.insert_range(lo, hi);
      }
      for rule in rule_span(edge.range) {
        result.union_with(&first[rule]);
        let target = edge.target as usize;
        if nullable[rule] && !visited[target] {
          visited[target] = true;
          stack.push(edge.target);
        }
      }
    }
  }

  may_end
}

pub(super) fn gen_follow(
  dfas: &[Dfa],
  nullable: &[bool],
  first: &[TokenSet],
  start: usize,
) -> Vec<TokenSet> {
  let mut buf = TokenSet::new();
  let mut follow = vec![buf.clone(); dfas.len()];
  follow[start].insert(END_OF_INPUT);

  loop {
    let mut changed = false;
    for (owner, dfa) in dfas.iter().enumerate() {
      for state in 0..dfa.state_count() as u32 {
        for edge in dfa.edges(state) {
          let rules = rule_span(edge.range);
          if rules.is_empty() {
            continue;
          }
          buf.clear();
          if compute_first_from(&mut buf, first, nullable, dfa, edge.target) {
            let inherited = follow[owner].clone();
            buf.union_with(&inherited);
          }
          for rule in rules {
            changed |= follow[rule].union_with(&buf);
          }
        }
      }
    }
    if !changed {
      break;
    }
  }

  follow
}
