//! Crate root: wires together the compilation pipeline.
//!
//! The stages are small and each consumes the previous one's output:
//! - `tokenizer` turns characters into tokens on demand.
//! - `parser` pulls tokens with one token of lookahead and builds the AST.
//! - `codegen` walks the AST and emits x86-64 AT&T assembly.
//! - `eval` runs the AST directly, mirroring the generated code.
//! - `diagnostics` collects recoverable problems; `error` covers hard failures.
//! - `cli` is the host-process glue around all of the above.

pub mod cli;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod parser;
pub mod tokenizer;

mod codegen;

use tracing::warn;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{CompileError, CompileResult};
pub use parser::{Parsed, Program};

/// Knobs shared by every stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
  /// Treat every diagnostic as fatal and report unclosed parentheses.
  pub strict: bool,
}

/// Everything a successful run of the pipeline produces.
#[derive(Debug)]
pub struct Compilation {
  pub program: Program,
  pub assembly: String,
  pub diagnostics: Diagnostics,
}

/// Parse `source` and generate assembly for it.
///
/// Outside strict mode this always succeeds: malformed statements are
/// reported in [`Compilation::diagnostics`] and the assembly covers whatever
/// could be parsed.
pub fn compile(source: &str, options: &Options) -> CompileResult<Compilation> {
  let Parsed {
    program,
    diagnostics,
  } = parser::parse(source, options);

  if options.strict && !diagnostics.is_empty() {
    return error::RejectedSnafu { diagnostics }.fail();
  }
  if program.contains_error() {
    warn!("program contains invalid expressions; they will evaluate to zero");
  }

  let assembly = codegen::generate(&program);
  Ok(Compilation {
    program,
    assembly,
    diagnostics,
  })
}

/// Compile a source string into AT&T assembly.
pub fn generate_assembly(source: &str, options: &Options) -> CompileResult<String> {
  compile(source, options).map(|compilation| compilation.assembly)
}
