use std::path::Path;
use std::process::ExitCode;

use calcc::cli::{self, Cli};
use calcc::{CompileError, Diagnostics};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

fn main() -> ExitCode {
  initialize_logging();

  let cli = Cli::parse();

  let (path, source) = match cli::read_source(&cli.input) {
    Ok(loaded) => loaded,
    Err(err) => {
      eprintln!("error: {err}");
      return ExitCode::FAILURE;
    }
  };

  match cli::execute(&cli, &path, &source) {
    Ok(outcome) => {
      print_diagnostics(&path, &source, &outcome.diagnostics);
      print!("{}", outcome.stdout);
      ExitCode::SUCCESS
    }
    Err(err) => {
      if let CompileError::Rejected { diagnostics } = &err {
        print_diagnostics(&path, &source, diagnostics);
      }
      eprintln!("error: {err}");
      ExitCode::FAILURE
    }
  }
}

fn print_diagnostics(path: &Path, source: &str, diagnostics: &Diagnostics) {
  for diagnostic in diagnostics {
    eprintln!("{}:{}", path.display(), diagnostic.render(source));
  }
}

fn initialize_logging() {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::registry()
    .with(
      fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter),
    )
    .init();
}
