use indexmap::IndexSet;
use crate::automata::{Dfa, Range};
use super::sets::rule_span;

/// A position inside a rule body: the rule's index and a state of its
/// forward automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Item {
  pub(crate) rule: usize,
  pub(crate) state: u32,
}

pub(crate) struct State {
  /// kernel items first, then the ones added by closure
  pub(crate) items: Vec<Item>,
  /// sorted, non-overlapping symbol ranges -> index of target state
  pub(crate) transitions: Vec<(Range, u32)>,
}

/// Sorted, deduplicated kernel items.
type StateKey = Vec<Item>;

/// Generates the item sets of the grammar whose rule automata are `dfas`.
/// `dfas[augmented]` accepts exactly the start rule's symbol; state 0 is
/// built from its start item.
pub(super) fn gen_states(
  dfas: &[Dfa],
  augmented: usize,
) -> Vec<State> {
  let mut kernels: IndexSet<StateKey> = IndexSet::new();
  kernels.insert(vec![Item {
    rule: augmented,
    state: dfas[augmented].start(),
  }]);

  let mut states = vec![];
  let mut index = 0;
  while index < kernels.len() {
    let kernel = kernels[index].clone();
    index += 1;

    let items = closure(dfas, kernel);

    let mut bounds = vec![];
    for item in &items {
      for edge in dfas[item.rule].edges(item.state) {
        bounds.push(edge.range.lo());
        bounds.push(edge.range.hi() + 1);
      }
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut transitions: Vec<(Range, u32)> = vec![];
    for window in bounds.windows(2) {
      let (lo, hi) = (window[0], window[1] - 1);
      let mut next = items.iter()
        .filter_map(|item| {
          dfas[item.rule].next(item.state, lo).map(|state| Item {
            rule: item.rule,
            state,
          })
        })
        .collect::<Vec<_>>();
      if next.is_empty() {
        continue;
      }
      next.sort_unstable();
      next.dedup();

      let (target, _) = kernels.insert_full(next);
      let target = target as u32;
      match transitions.last_mut() {
        Some((range, last)) if *last == target && range.hi() + 1 == lo => {
          *range = Range::spanning(range.lo(), hi);
        }
        _ => transitions.push((Range::spanning(lo, hi), target)),
      }
    }

    states.push(State {
      items,
      transitions,
    });
  }

  states
}

/// Adds the start item of every rule whose symbol labels an edge leaving an
/// item already in the set.
fn closure(
  dfas: &[Dfa],
  kernel: Vec<Item>,
) -> Vec<Item> {
  let mut items = kernel.into_iter().collect::<IndexSet<_>>();
  let mut i = 0;
  while i < items.len() {
    let item = items[i];
    i += 1;
    for edge in dfas[item.rule].edges(item.state) {
      for rule in rule_span(edge.range) {
        items.insert(Item {
          rule,
          state: dfas[rule].start(),
        });
      }
    }
  }
  items.into_iter().collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  New,
  Open,
  Done,
}

/// Looks for a cycle of gotos over nullable rules. Along such a cycle the
/// parser could push empty reductions forever, so the grammar has no bound on
/// the work done between two shifts. Returns the index of a rule on the cycle.
pub(super) fn nullable_cycle(
  states: &[State],
  nullable: &[bool],
) -> Option<usize> {
  let edges = states.iter()
    .map(|state| {
      state.transitions.iter()
        .flat_map(|&(range, target)| rule_span(range).map(move |rule| (rule, target as usize)))
        .filter(|&(rule, _)| nullable[rule])
        .collect::<Vec<_>>()
    })
    .collect::<Vec<_>>();

  let mut marks = vec![Mark::New; states.len()];
  for root in 0..states.len() {
    if marks[root] != Mark::New {
      continue;
    }
    marks[root] = Mark::Open;
    let mut stack = vec![(root, 0)];
    while let Some((state, next)) = stack.last_mut() {
      let state = *state;
      match edges[state].get(*next) {
        Some(&(rule, target)) => {
          *next += 1;
          match marks[target] {
            Mark::Open => return Some(rule),
            Mark::New => {
              marks[target] = Mark::Open;
              stack.push((target, 0));
            }
            Mark::Done => {}
          }
        }
        None => {
          marks[state] = Mark::Done;
          stack.pop();
        }
      }
    }
  }
  None
}
