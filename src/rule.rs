//! Rules, tokens and rule lists: the in-memory form of one grammar.

use indexmap::IndexMap;
use crate::automata::{Range, RangeSet};
use crate::error::{Result, SyntaxError};

/// Largest literal character code a grammar may mention.
pub const END_MARKER: u32 = 0xff;

/// Lookahead symbol seen once the input is exhausted. No automaton has an edge
/// on it, which keeps literal ranges and rule symbols from ever touching.
pub const END_OF_INPUT: u32 = END_MARKER + 1;

/// Identifier of the first rule of a list. Rule symbols share the automaton
/// alphabet with literal codes, so they must start above every literal.
pub const MIN_RULE_ID: u32 = END_OF_INPUT + 1;

/// One element of a rule body in Reverse Polish Notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
  Alternation,
  Concatenation,
  /// `max == None` means no upper bound.
  Repetition { min: u32, max: Option<u32> },
  Char(u32),
  Num(Range),
  RuleName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
  id: u32,
  name: String,
  tokens: Vec<Token>,
}

impl Rule {
  pub fn id(&self) -> u32 {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn tokens(&self) -> &[Token] {
    &self.tokens
  }
}

/// An ordered set of rules. The first rule is the start rule unless the
/// caller picks another one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleList {
  /// lowercased name -> rule
  rules: IndexMap<String, Rule>,
}

impl RuleList {
  /// Builds a rule list, numbering the rules in order from [`MIN_RULE_ID`].
  ///
  /// Fails if a name is defined twice or if a rule refers to a rule that is
  /// not part of the list.
  pub fn new<I, S>(definitions: I) -> Result<Self>
  where
    I: IntoIterator<Item = (S, Vec<Token>)>,
    S: Into<String>,
  {
    let mut rules = IndexMap::new();
    for (name, tokens) in definitions {
      let name = name.into();
      let key = name.to_ascii_lowercase();
      if rules.contains_key(&key) {
        return Err(SyntaxError::new(format!(
          "rule '{}' is defined more than once", name)));
      }
      let id = MIN_RULE_ID + rules.len() as u32;
      rules.insert(key, Rule { id, name, tokens });
    }

    let list = RuleList { rules };
    for rule in list.iter() {
      for token in rule.tokens() {
        if let Token::RuleName(name) = token {
          if !list.contains(name) {
            return Err(SyntaxError::new(format!(
              "rule '{}' referenced by '{}' is not defined", name, rule.name())));
          }
        }
      }
    }
    Ok(list)
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.rules.contains_key(&name.to_ascii_lowercase())
  }

  /// Looks a rule up by name, ignoring case as ABNF does.
  pub fn get(&self, name: &str) -> Result<&Rule> {
    self.rules.get(&name.to_ascii_lowercase())
      .ok_or_else(|| SyntaxError::new(format!("rule '{}' is not defined", name)))
  }

  pub fn by_id(&self, id: u32) -> Option<&Rule> {
    self.index_of(id).and_then(|i| self.rules.get_index(i)).map(|(_, rule)| rule)
  }

  /// Position of the rule with identifier `id`, if it belongs to this list.
  pub fn index_of(&self, id: u32) -> Option<usize> {
    let index = id.checked_sub(MIN_RULE_ID)? as usize;
    if index < self.rules.len() {
      Some(index)
    } else {
      None
    }
  }

  pub fn start(&self) -> Option<&Rule> {
    self.rules.get_index(0).map(|(_, rule)| rule)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
    self.rules.values()
  }

  /// Every symbol an automaton over this grammar can see: literal codes and
  /// one symbol per rule. `END_OF_INPUT` sits between the two and is never
  /// part of it.
  pub fn alphabet(&self) -> RangeSet {
    let literals = RangeSet::from(Range::spanning(0, END_MARKER));
    match self.rules.len() as u32 {
      0 => literals,
      len => literals.union(&RangeSet::from(Range::spanning(MIN_RULE_ID, MIN_RULE_ID + len - 1))),
    }
  }
}

impl<'a> IntoIterator for &'a RuleList {
  type Item = &'a Rule;
  type IntoIter = indexmap::map::Values<'a, String, Rule>;

  fn into_iter(self) -> Self::IntoIter {
    self.rules.values()
  }
}
