//! Host-process glue: command-line arguments, reading the input file and
//! writing the generated assembly next to it.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use snafu::{ResultExt, ensure};
use tracing::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::error::{
  CompileResult, EvalSnafu, MissingInputSnafu, ReadInputSnafu, RejectedSnafu, WriteOutputSnafu,
};
use crate::{Options, eval, parser, tokenizer};

/// File name used for the assembly when `--output` is not given.
pub const DEFAULT_OUTPUT_NAME: &str = "out.s";

#[derive(Debug, Parser)]
#[command(name = "calcc", version, about = "Compile a calculator program to x86-64 assembly")]
pub struct Cli {
  /// Source file to compile.
  pub input: PathBuf,

  /// Where to write the assembly [default: out.s next to the input].
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// What to produce.
  #[arg(long, value_enum, default_value_t = Emit::Asm)]
  pub emit: Emit,

  /// Interpret the program and print its output instead of compiling it.
  #[arg(long, conflicts_with = "emit")]
  pub run: bool,

  /// Fail on any diagnostic and report unclosed parentheses.
  #[arg(long)]
  pub strict: bool,
}

impl Cli {
  pub fn options(&self) -> Options {
    Options {
      strict: self.strict,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
  /// Write an assembly file.
  Asm,
  /// Print the parsed program.
  Ast,
  /// Print one token per line.
  Tokens,
}

/// What a successful invocation produced.
#[derive(Debug)]
pub struct Outcome {
  pub diagnostics: Diagnostics,
  /// Text destined for standard output.
  pub stdout: String,
  /// The assembly file, when one was written.
  pub written: Option<PathBuf>,
}

/// Resolve `input` to an absolute path and read it.
pub fn read_source(input: &Path) -> CompileResult<(PathBuf, String)> {
  let path = std::path::absolute(input).context(ReadInputSnafu { path: input })?;
  ensure!(path.exists(), MissingInputSnafu { path: &path });
  let source = fs::read_to_string(&path).context(ReadInputSnafu { path: &path })?;
  debug!(path = %path.display(), bytes = source.len(), "read input file");
  Ok((path, source))
}

pub fn default_output_path(input: &Path) -> PathBuf {
  input
    .parent()
    .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_NAME), |dir| dir.join(DEFAULT_OUTPUT_NAME))
}

/// Carry out the requested action on an already loaded source file.
pub fn execute(cli: &Cli, input: &Path, source: &str) -> CompileResult<Outcome> {
  let options = cli.options();

  if cli.run {
    let parsed = parser::parse(source, &options);
    let diagnostics = reject_in_strict_mode(parsed.diagnostics, &options)?;
    let values = eval::run(&parsed.program).context(EvalSnafu)?;
    let mut stdout = String::new();
    for value in values {
      stdout.push_str(&format!("{value}\n"));
    }
    return Ok(Outcome {
      diagnostics,
      stdout,
      written: None,
    });
  }

  match cli.emit {
    Emit::Tokens => {
      let mut diagnostics = Diagnostics::new();
      let mut stdout = String::new();
      for token in tokenizer::tokenize(source, &mut diagnostics) {
        stdout.push_str(&format!("{:<8} {:?}\n", token.kind, token.text));
      }
      let diagnostics = reject_in_strict_mode(diagnostics, &options)?;
      Ok(Outcome {
        diagnostics,
        stdout,
        written: None,
      })
    }
    Emit::Ast => {
      let parsed = parser::parse(source, &options);
      let diagnostics = reject_in_strict_mode(parsed.diagnostics, &options)?;
      Ok(Outcome {
        diagnostics,
        stdout: parsed.program.to_string(),
        written: None,
      })
    }
    Emit::Asm => {
      let compilation = crate::compile(source, &options)?;
      let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));
      fs::write(&output, &compilation.assembly).context(WriteOutputSnafu { path: &output })?;
      info!(output = %output.display(), "wrote assembly");
      Ok(Outcome {
        diagnostics: compilation.diagnostics,
        stdout: format!("Wrote assembly to: {}\n", output.display()),
        written: Some(output),
      })
    }
  }
}

fn reject_in_strict_mode(diagnostics: Diagnostics, options: &Options) -> CompileResult<Diagnostics> {
  ensure!(
    !options.strict || diagnostics.is_empty(),
    RejectedSnafu { diagnostics }
  );
  Ok(diagnostics)
}
