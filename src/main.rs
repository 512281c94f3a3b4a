use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use abnf_gen::{build, CodeGenerator, Config};

#[derive(Parser)]
#[command(name = "abnf-gen", version)]
#[command(about = "Generates a Rust parser from an ABNF grammar")]
struct Args {
  /// ABNF grammar to read; standard input when omitted
  input: Option<PathBuf>,
  /// File to write the generated parser to; standard output when omitted
  #[arg(short, long)]
  output: Option<PathBuf>,
  /// Rule the parser starts from; the first rule when omitted
  #[arg(long)]
  start: Option<String>,
  /// Do not append the RFC 5234 core rules
  #[arg(long)]
  no_core_rules: bool,
}

impl From<Args> for Config {
  fn from(args: Args) -> Self {
    Config {
      input: args.input,
      output: args.output,
      start: args.start,
      core_rules: !args.no_core_rules,
    }
  }
}

fn init_tracing() {
  let env_filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::WARN.into())
    .from_env_lossy();

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(io::stderr)
    .init();
}

fn main() -> ExitCode {
  init_tracing();
  let config = Config::from(Args::parse());

  match run(&config) {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => {
      eprintln!("The input ABNF file doesn't contain any rule, no parser is generated.");
      ExitCode::FAILURE
    }
    Err(e) => {
      eprintln!("{:#}", e);
      ExitCode::FAILURE
    }
  }
}

/// Returns whether a parser was generated.
fn run(config: &Config) -> anyhow::Result<bool> {
  let input = match &config.input {
    Some(path) => fs::read(path)
      .with_context(|| format!("cannot read {}", path.display()))?,
    None => {
      let mut buf = vec![];
      io::stdin().read_to_end(&mut buf).context("cannot read standard input")?;
      buf
    }
  };

  let compiled = match build(config, &input)? {
    Some(compiled) => compiled,
    None => return Ok(false),
  };

  // nothing is written unless generation succeeds
  let mut code = vec![];
  compiled.generator().generate(&mut code)?;
  match &config.output {
    Some(path) => fs::write(path, &code)
      .with_context(|| format!("cannot write {}", path.display()))?,
    None => io::stdout().write_all(&code)?,
  }
  Ok(true)
}
