pub mod abnf;
pub mod automata;
mod bitset;
pub mod codegen;
pub mod config;
pub mod error;
pub mod grammar;
pub mod meta;
pub mod parser;
pub mod rule;
pub mod source;

use tracing::{info, warn};

pub use abnf::AbnfParser;
pub use automata::Dfa;
pub use codegen::{CodeGenerator, RustCodeGenerator};
pub use config::Config;
pub use error::{Position, Result, SyntaxError};
pub use parser::{Node, Parser, ParsingTable};
pub use rule::{Rule, RuleList, Token};

/// A grammar compiled for one start rule: everything a parser or a code
/// generator needs.
#[derive(Debug, Clone)]
pub struct Compiled {
  pub rules: RuleList,
  /// one per rule, in declaration order
  pub reverse_dfas: Vec<Dfa>,
  pub table: ParsingTable,
}

impl Compiled {
  /// Compiles `rules`, starting from `start` or from the first rule.
  pub fn new(rules: RuleList, start: Option<&str>) -> Result<Self> {
    let reverse_dfas = automata::reverse_dfas(&rules)?;
    let table = match start {
      Some(start) => ParsingTable::with_start(&rules, start)?,
      None => ParsingTable::new(&rules)?,
    };
    info!(
      rules = rules.len(),
      states = table.state_count(),
      conflicts = table.conflicts().len(),
      "grammar compiled");
    for conflict in table.describe_conflicts() {
      warn!("conflict in {}, input that needs the losing action is rejected", conflict);
    }
    Ok(Compiled {
      rules,
      reverse_dfas,
      table,
    })
  }

  pub fn generator(&self) -> RustCodeGenerator<'_> {
    RustCodeGenerator::new(&self.reverse_dfas, &self.table)
  }

  pub fn into_parser(self) -> Parser {
    Parser::new(self.rules, self.reverse_dfas, self.table)
  }
}

/// Reads ABNF text with the meta parser and compiles the grammar it
/// describes. Returns `None` when the text defines no rule at all.
pub fn build(config: &Config, input: &[u8]) -> Result<Option<Compiled>> {
  let abnf = AbnfParser::new()?.with_core_rules(config.core_rules);
  let rules = abnf.parse(input)?;
  if rules.is_empty() {
    return Ok(None);
  }
  Compiled::new(rules, config.start.as_deref()).map(Some)
}
