use std::path::PathBuf;

/// What one run of the generator does.
#[derive(Debug, Clone)]
pub struct Config {
  /// ABNF grammar to read, standard input when `None`
  pub input: Option<PathBuf>,
  /// where the generated parser goes, standard output when `None`
  pub output: Option<PathBuf>,
  /// rule the generated parser starts from, the first rule when `None`
  pub start: Option<String>,
  /// append the RFC 5234 core rules a grammar uses without defining
  pub core_rules: bool,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      input: None,
      output: None,
      start: None,
      core_rules: true,
    }
  }
}
