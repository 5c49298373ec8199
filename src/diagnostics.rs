//! Recoverable problems found while lexing and parsing.
//!
//! Nothing in the front-end aborts on malformed input. Each stage records what
//! it found into a [`Diagnostics`] collector that is threaded through the
//! pipeline and handed back to the caller alongside the parsed program, which
//! decides whether the problems are fatal.

use std::fmt;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
  UnrecognizedCharacter,
  UnknownStatementStart,
  UnexpectedToken,
  IntegerOutOfRange,
  ReservedName,
  UnclosedParen,
}

impl DiagnosticKind {
  pub fn is_lexical(self) -> bool {
    matches!(self, Self::UnrecognizedCharacter)
  }
}

impl fmt::Display for DiagnosticKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::UnrecognizedCharacter => "unrecognized character",
      Self::UnknownStatementStart => "unknown statement start",
      Self::UnexpectedToken => "unexpected token",
      Self::IntegerOutOfRange => "integer out of range",
      Self::ReservedName => "reserved name",
      Self::UnclosedParen => "unclosed parenthesis",
    };
    f.write_str(name)
  }
}

/// A single problem, anchored at a byte offset in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub kind: DiagnosticKind,
  pub loc: usize,
  pub message: String,
}

impl Diagnostic {
  /// Format the diagnostic with its source line and a caret under the
  /// offending character.
  pub fn render(&self, source: &str) -> String {
    let loc = self.loc.min(source.len());
    let line_start = source[..loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[loc..].find('\n').map_or(source.len(), |i| loc + i);
    let line_no = source[..loc].matches('\n').count() + 1;
    let column = source[line_start..loc].chars().count() + 1;
    let line = source[line_start..line_end].trim_end_matches('\r');
    let marker = format!("{}^", " ".repeat(column - 1));
    format!(
      "{line_no}:{column}: {}: {}\n{line}\n{marker}",
      self.kind, self.message
    )
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} at byte {}: {}", self.kind, self.loc, self.message)
  }
}

/// Ordered collector shared by the lexer and the parser.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
  items: Vec<Diagnostic>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn report(&mut self, kind: DiagnosticKind, loc: usize, message: impl Into<String>) {
    let message = message.into();
    trace!(%kind, loc, %message, "diagnostic recorded");
    self.items.push(Diagnostic {
      kind,
      loc,
      message,
    });
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
    self.items.iter()
  }

  pub fn kinds(&self) -> Vec<DiagnosticKind> {
    self.items.iter().map(|d| d.kind).collect()
  }

  /// Render every diagnostic against `source`, one block per entry.
  pub fn render(&self, source: &str) -> String {
    self
      .items
      .iter()
      .map(|d| d.render(source))
      .collect::<Vec<_>>()
      .join("\n")
  }
}

impl<'a> IntoIterator for &'a Diagnostics {
  type Item = &'a Diagnostic;
  type IntoIter = std::slice::Iter<'a, Diagnostic>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}
