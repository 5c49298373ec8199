//! Hard failures of the pipeline and its driver.
//!
//! Recoverable problems in the source program never end up here; they are
//! collected as [`Diagnostic`](crate::diagnostics::Diagnostic)s instead. This
//! type covers whatever stops the compiler outright.

use std::path::PathBuf;

use snafu::Snafu;

use crate::diagnostics::Diagnostics;
use crate::eval::EvalError;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("rejected: {} diagnostic(s) reported in strict mode", diagnostics.len()))]
  Rejected { diagnostics: Diagnostics },

  #[snafu(display("input file not found: {}", path.display()))]
  MissingInput { path: PathBuf },

  #[snafu(display("failed to read {}: {source}", path.display()))]
  ReadInput {
    path: PathBuf,
    source: std::io::Error,
  },

  #[snafu(display("failed to write {}: {source}", path.display()))]
  WriteOutput {
    path: PathBuf,
    source: std::io::Error,
  },

  #[snafu(display("runtime error: {source}"))]
  Eval { source: EvalError },
}
