use indexmap::IndexMap;
use tracing::debug;
use crate::error::{Result, SyntaxError};
use crate::rule::{RuleList, Token};
use super::core_rules::core_rule;

/// Collects rule definitions in order and turns them into a [`RuleList`].
///
/// Core rules that are referenced but never defined are appended when the
/// list is built, in the order they are first referenced.
#[derive(Debug, Clone)]
pub struct RuleListBuilder {
  /// lowercased name -> (name as written, tokens)
  rules: IndexMap<String, (String, Vec<Token>)>,
  core_rules: bool,
}

impl Default for RuleListBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl RuleListBuilder {
  pub fn new() -> Self {
    RuleListBuilder {
      rules: IndexMap::new(),
      core_rules: true,
    }
  }

  pub fn core_rules(mut self, enabled: bool) -> Self {
    self.core_rules = enabled;
    self
  }

  /// `name = ...`
  pub fn define(&mut self, name: &str, tokens: Vec<Token>) -> Result<()> {
    let key = name.to_ascii_lowercase();
    if self.rules.contains_key(&key) {
      return Err(SyntaxError::new(format!(
        "rule '{}' is already defined, use '=/' to add alternatives", name)));
    }
    self.rules.insert(key, (name.to_owned(), tokens));
    Ok(())
  }

  /// `name =/ ...`: the new body becomes one more alternative of the rule.
  pub fn extend(&mut self, name: &str, mut tokens: Vec<Token>) -> Result<()> {
    let (_, body) = self.rules.get_mut(&name.to_ascii_lowercase())
      .ok_or_else(|| SyntaxError::new(format!(
        "rule '{}' must be defined with '=' before '=/' adds to it", name)))?;
    body.append(&mut tokens);
    body.push(Token::Alternation);
    Ok(())
  }

  pub fn build(mut self) -> Result<RuleList> {
    if self.core_rules {
      self.complete_core_rules();
    }
    RuleList::new(self.rules.into_values())
  }

  fn complete_core_rules(&mut self) {
    let mut i = 0;
    while i < self.rules.len() {
      let referenced = self.rules[i].1.iter()
        .filter_map(|token| match token {
          Token::RuleName(name) => Some(name.clone()),
          _ => None,
        })
        .collect::<Vec<_>>();
      i += 1;

      for name in referenced {
        if self.rules.contains_key(&name.to_ascii_lowercase()) {
          continue;
        }
        if let Some((canonical, expr)) = core_rule(&name) {
          // core rule bodies are fixed and always lower
          if let Ok(tokens) = expr.to_tokens() {
            debug!(rule = canonical, "core rule added");
            self.rules.insert(canonical.to_ascii_lowercase(), (canonical.to_owned(), tokens));
          }
        }
      }
    }
  }
}
