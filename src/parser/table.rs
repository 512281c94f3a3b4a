//! LR parsing table over regular right parts.

use tracing::debug;
use crate::automata::{build_dfa, Dfa, Direction, Program};
use crate::error::{Result, SyntaxError};
use crate::rule::{RuleList, END_OF_INPUT, MIN_RULE_ID};
use super::sets::{char_span, gen_first, gen_follow, gen_nullable, rule_span};
use super::state::{gen_states, nullable_cycle};
use super::token_set::NUM_LOOKAHEADS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
  Error,
  Shift(u32),
  /// Reduces the rule with this identifier.
  Reduce(u32),
  Accept,
}

/// Two actions competing for one table entry, and the one that was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
  pub state: u32,
  pub lookahead: u32,
  pub kept: Action,
  pub dropped: Action,
}

#[derive(Debug, Clone)]
pub struct ParsingTable {
  /// state -> lookahead -> action
  actions: Vec<Box<[Action]>>,
  /// state -> sorted (rule id, target state)
  gotos: Vec<Vec<(u32, u32)>>,
  rule_names: Vec<String>,
  start: u32,
  conflicts: Vec<Conflict>,
}

impl ParsingTable {
  /// Builds the table with the first rule as the start rule.
  pub fn new(rules: &RuleList) -> Result<Self> {
    let start = rules.start()
      .ok_or_else(|| SyntaxError::new("grammar has no rules"))?;
    Self::build(rules, start.id())
  }

  pub fn with_start(rules: &RuleList, start: &str) -> Result<Self> {
    if rules.is_empty() {
      return Err(SyntaxError::new("grammar has no rules"));
    }
    let start = rules.get(start)?.id();
    Self::build(rules, start)
  }

  fn build(rules: &RuleList, start: u32) -> Result<Self> {
    let mut dfas = rules.iter()
      .map(|rule| build_dfa(rules, rule, Direction::Forward))
      .collect::<Result<Vec<_>>>()?;
    let augmented = dfas.len();
    dfas.push(Dfa::new(Program::new_char(start), rules.alphabet())?);

    let start_index = (start - MIN_RULE_ID) as usize;
    let nullable = gen_nullable(&dfas);
    let first = gen_first(&dfas, &nullable);
    let follow = gen_follow(&dfas, &nullable, &first, start_index);
    let states = gen_states(&dfas, augmented);
    if let Some(rule) = nullable_cycle(&states, &nullable) {
      return Err(SyntaxError::new(format!(
        "rule '{}' can repeat without consuming input, the grammar is cyclic",
        rules.iter().nth(rule).map_or("?", |rule| rule.name()))));
    }

    let mut table = ParsingTable {
      actions: Vec::with_capacity(states.len()),
      gotos: Vec::with_capacity(states.len()),
      rule_names: rules.iter().map(|rule| rule.name().to_owned()).collect(),
      start,
      conflicts: vec![],
    };

    for (ix, state) in states.iter().enumerate() {
      let ix = ix as u32;
      let mut row = vec![Action::Error; NUM_LOOKAHEADS].into_boxed_slice();
      let mut gotos = vec![];

      for &(range, target) in &state.transitions {
        if let Some((lo, hi)) = char_span(range) {
          for code in lo..=hi {
            table.set(&mut row, ix, code, Action::Shift(target));
          }
        }
        for rule in rule_span(range) {
          gotos.push((MIN_RULE_ID + rule as u32, target));
        }
      }

      for item in &state.items {
        if !dfas[item.rule].is_accepting(item.state) {
          continue;
        }
        if item.rule == augmented {
          table.set(&mut row, ix, END_OF_INPUT, Action::Accept);
        } else {
          let reduce = Action::Reduce(MIN_RULE_ID + item.rule as u32);
          for lookahead in follow[item.rule].iter() {
            table.set(&mut row, ix, lookahead, reduce);
          }
        }
      }

      table.actions.push(row);
      table.gotos.push(gotos);
    }

    debug!(
      states = table.actions.len(),
      conflicts = table.conflicts.len(),
      "parsing table built");
    Ok(table)
  }

  /// Stores `action`, resolving a clash with the current entry: accept wins,
  /// then shift, then the reduction of the rule declared first.
  fn set(
    &mut self,
    row: &mut [Action],
    state: u32,
    lookahead: u32,
    action: Action,
  ) {
    let old = row[lookahead as usize];
    let kept = match (old, action) {
      (Action::Error, _) => action,
      _ if old == action => return,
      (Action::Accept, _) | (_, Action::Accept) => Action::Accept,
      (Action::Shift(_), _) => old,
      (_, Action::Shift(_)) => action,
      (Action::Reduce(a), Action::Reduce(b)) => Action::Reduce(a.min(b)),
      (_, Action::Error) => old,
    };
    if old != Action::Error {
      let dropped = if kept == old { action } else { old };
      debug!(state, lookahead, ?kept, ?dropped, "conflict resolved");
      self.conflicts.push(Conflict {
        state,
        lookahead,
        kept,
        dropped,
      });
    }
    row[lookahead as usize] = kept;
  }

  pub fn state_count(&self) -> usize {
    self.actions.len()
  }

  pub fn action(&self, state: u32, lookahead: u32) -> Action {
    self.actions[state as usize][lookahead as usize]
  }

  pub fn goto(&self, state: u32, rule: u32) -> Option<u32> {
    let gotos = &self.gotos[state as usize];
    gotos.binary_search_by_key(&rule, |&(id, _)| id)
      .ok()
      .map(|i| gotos[i].1)
  }

  /// Non-error actions of `state` as `(lo, hi, action)` runs of lookaheads.
  pub fn actions(&self, state: u32) -> Vec<(u32, u32, Action)> {
    let mut runs: Vec<(u32, u32, Action)> = vec![];
    for (lookahead, &action) in self.actions[state as usize].iter().enumerate() {
      let lookahead = lookahead as u32;
      if action == Action::Error {
        continue;
      }
      match runs.last_mut() {
        Some((_, hi, last)) if *last == action && *hi + 1 == lookahead => *hi = lookahead,
        _ => runs.push((lookahead, lookahead, action)),
      }
    }
    runs
  }

  pub fn gotos(&self, state: u32) -> &[(u32, u32)] {
    &self.gotos[state as usize]
  }

  pub fn conflicts(&self) -> &[Conflict] {
    &self.conflicts
  }

  /// Rule names in declaration order, indexed by `id - MIN_RULE_ID`.
  pub fn rule_names(&self) -> &[String] {
    &self.rule_names
  }

  pub fn rule_name(&self, id: u32) -> Option<&str> {
    let index = id.checked_sub(MIN_RULE_ID)? as usize;
    self.rule_names.get(index).map(String::as_str)
  }

  /// Identifier of the start rule.
  pub fn start_rule(&self) -> u32 {
    self.start
  }

  /// One line per resolved conflict, with runs of lookaheads that were
  /// resolved the same way in the same state joined, e.g.
  /// `state 4 on "0"-"9": shift wins over reduce 'digits'`.
  pub fn describe_conflicts(&self) -> Vec<String> {
    let mut runs: Vec<(u32, u32, u32, String, String)> = vec![];
    for conflict in &self.conflicts {
      let kept = self.describe_action(conflict.kept);
      let dropped = self.describe_action(conflict.dropped);
      match runs.last_mut() {
        Some((state, _, hi, k, d))
          if *state == conflict.state && *hi + 1 == conflict.lookahead && *k == kept && *d == dropped => {
          *hi = conflict.lookahead;
        }
        _ => runs.push((conflict.state, conflict.lookahead, conflict.lookahead, kept, dropped)),
      }
    }

    runs.into_iter()
      .map(|(state, lo, hi, kept, dropped)| {
        let lookahead = if lo == hi {
          describe_lookahead(lo)
        } else {
          format!("{}-{}", describe_lookahead(lo), describe_lookahead(hi))
        };
        format!("state {} on {}: {} wins over {}", state, lookahead, kept, dropped)
      })
      .collect()
  }

  fn describe_action(&self, action: Action) -> String {
    match action {
      Action::Error => "error".to_owned(),
      Action::Shift(_) => "shift".to_owned(),
      Action::Reduce(rule) => format!("reduce '{}'", self.rule_name(rule).unwrap_or("?")),
      Action::Accept => "accept".to_owned(),
    }
  }
}

fn describe_lookahead(lookahead: u32) -> String {
  match u8::try_from(lookahead) {
    Ok(b) if b.is_ascii_graphic() || b == b' ' => format!("\"{}\"", b as char),
    Ok(b) => format!("0x{:02x}", b),
    Err(_) => "end of input".to_owned(),
  }
}
