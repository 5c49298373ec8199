//! Recursive-descent parser producing a statement list and expression AST.
//!
//! Precedence lives in the shape of the grammar: `parse_expr` handles `+`/`-`,
//! `parse_term` handles `*`/`/` and `parse_factor` the atoms, each level
//! folding its operands to the left. The parser holds exactly one token of
//! lookahead and pulls the next one from the lexer as it consumes input.
//!
//! Parsing never fails. Problems are recorded as diagnostics and the parser
//! resynchronises at the next line, so callers always get a program back.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::Options;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::tokenizer::{Lexer, Token, TokenKind};

/// Names the generated assembly already defines or calls.
const RESERVED_NAMES: [&str; 2] = ["main", "printf"];

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl BinaryOp {
  fn additive(kind: TokenKind) -> Option<Self> {
    match kind {
      TokenKind::Plus => Some(Self::Add),
      TokenKind::Minus => Some(Self::Sub),
      _ => None,
    }
  }

  fn multiplicative(kind: TokenKind) -> Option<Self> {
    match kind {
      TokenKind::Star => Some(Self::Mul),
      TokenKind::Slash => Some(Self::Div),
      _ => None,
    }
  }

  pub fn symbol(self) -> char {
    match self {
      Self::Add => '+',
      Self::Sub => '-',
      Self::Mul => '*',
      Self::Div => '/',
    }
  }
}

impl fmt::Display for BinaryOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.symbol())
  }
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  Num {
    value: i64,
  },
  Var {
    name: String,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
  /// Stands in for an expression that could not be parsed.
  Error,
}

impl Expr {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn var(name: impl Into<String>) -> Self {
    Self::Var { name: name.into() }
  }

  pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn contains_error(&self) -> bool {
    match self {
      Self::Num { .. } | Self::Var { .. } => false,
      Self::Binary { lhs, rhs, .. } => lhs.contains_error() || rhs.contains_error(),
      Self::Error => true,
    }
  }
}

/// Binary operations print fully parenthesised so the output re-parses to
/// the same tree.
impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Num { value } => write!(f, "{value}"),
      Self::Var { name } => f.write_str(name),
      Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
      Self::Error => f.write_str("<error>"),
    }
  }
}

/// Prints an expression in statement position, where the outermost
/// parentheses are redundant.
struct Root<'a>(&'a Expr);

impl fmt::Display for Root<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Expr::Binary { op, lhs, rhs } => write!(f, "{lhs} {op} {rhs}"),
      expr => write!(f, "{expr}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
  Assign { name: String, expr: Expr },
  Print { expr: Expr },
}

impl Stmt {
  pub fn assign(name: impl Into<String>, expr: Expr) -> Self {
    Self::Assign {
      name: name.into(),
      expr,
    }
  }

  pub fn print(expr: Expr) -> Self {
    Self::Print { expr }
  }

  pub fn expr(&self) -> &Expr {
    match self {
      Self::Assign { expr, .. } | Self::Print { expr } => expr,
    }
  }
}

impl fmt::Display for Stmt {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Assign { name, expr } => write!(f, "{name} = {}", Root(expr)),
      Self::Print { expr } => write!(f, "print {}", Root(expr)),
    }
  }
}

/// Statements in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  pub stmts: Vec<Stmt>,
}

impl Program {
  /// Every assignment target, sorted and de-duplicated.
  pub fn variables(&self) -> BTreeSet<&str> {
    self
      .stmts
      .iter()
      .filter_map(|stmt| match stmt {
        Stmt::Assign { name, .. } => Some(name.as_str()),
        Stmt::Print { .. } => None,
      })
      .collect()
  }

  pub fn contains_error(&self) -> bool {
    self.stmts.iter().any(|stmt| stmt.expr().contains_error())
  }
}

impl fmt::Display for Program {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for stmt in &self.stmts {
      writeln!(f, "{stmt}")?;
    }
    Ok(())
  }
}

/// Result of parsing: the program plus everything reported along the way.
#[derive(Debug)]
pub struct Parsed {
  pub program: Program,
  pub diagnostics: Diagnostics,
}

/// Parse the whole source eagerly.
#[tracing::instrument(level = "trace", skip_all)]
pub fn parse(source: &str, options: &Options) -> Parsed {
  let mut parser = Parser::new(source, options.strict);
  let program = parser.parse_program();
  debug!(
    statements = program.stmts.len(),
    diagnostics = parser.diags.len(),
    "parsed program"
  );
  Parsed {
    program,
    diagnostics: parser.diags,
  }
}

struct Parser<'a> {
  lexer: Lexer<'a>,
  current: Token<'a>,
  diags: Diagnostics,
  strict: bool,
  /// Set once the statement being parsed has reported a syntax error; later
  /// errors on the same line are suppressed.
  line_failed: bool,
}

impl<'a> Parser<'a> {
  fn new(source: &'a str, strict: bool) -> Self {
    let mut diags = Diagnostics::new();
    let mut lexer = Lexer::new(source);
    let current = lexer.next_token(&mut diags);
    Self {
      lexer,
      current,
      diags,
      strict,
      line_failed: false,
    }
  }

  /// Consume the lookahead token and return it.
  fn advance(&mut self) -> Token<'a> {
    let token = self.current;
    self.current = self.lexer.next_token(&mut self.diags);
    token
  }

  fn report(&mut self, kind: DiagnosticKind, loc: usize, message: String) {
    if self.line_failed {
      return;
    }
    self.line_failed = true;
    self.diags.report(kind, loc, message);
  }

  fn parse_program(&mut self) -> Program {
    let mut stmts = Vec::new();
    loop {
      match self.current.kind {
        TokenKind::Eof => break,
        TokenKind::Newline => {
          self.advance();
          continue;
        }
        _ => {}
      }

      self.line_failed = false;
      if let Some(stmt) = self.parse_stmt() {
        stmts.push(stmt);
      }
      self.finish_line();
    }
    Program { stmts }
  }

  /// Anything left before the end of the line is junk: report it unless the
  /// statement already failed, then skip to the next line.
  fn finish_line(&mut self) {
    if self.current.kind.is_terminator() {
      return;
    }
    let found = self.current;
    self.report(
      DiagnosticKind::UnexpectedToken,
      found.loc,
      format!("unexpected {} after statement", found.describe()),
    );
    while !self.current.kind.is_terminator() {
      self.advance();
    }
  }

  fn parse_stmt(&mut self) -> Option<Stmt> {
    match self.current.kind {
      TokenKind::Ident => {
        let target = self.advance();
        if self.current.kind != TokenKind::Assign {
          let found = self.current;
          self.report(
            DiagnosticKind::UnknownStatementStart,
            found.loc,
            format!("expected `=` after `{}`, found {}", target.text, found.describe()),
          );
          return None;
        }
        self.advance();

        if RESERVED_NAMES.contains(&target.text) {
          self.report(
            DiagnosticKind::ReservedName,
            target.loc,
            format!("cannot assign to `{}`: the name is reserved", target.text),
          );
          return None;
        }

        let expr = self.parse_expr();
        Some(Stmt::assign(target.text, expr))
      }
      TokenKind::Print => {
        self.advance();
        let expr = self.parse_expr();
        Some(Stmt::print(expr))
      }
      _ => {
        let found = self.advance();
        self.report(
          DiagnosticKind::UnknownStatementStart,
          found.loc,
          format!("expected an assignment or `print`, found {}", found.describe()),
        );
        None
      }
    }
  }

  fn parse_expr(&mut self) -> Expr {
    let mut node = self.parse_term();

    while let Some(op) = BinaryOp::additive(self.current.kind) {
      self.advance();
      let rhs = self.parse_term();
      node = Expr::binary(op, node, rhs);
    }

    node
  }

  fn parse_term(&mut self) -> Expr {
    let mut node = self.parse_factor();

    while let Some(op) = BinaryOp::multiplicative(self.current.kind) {
      self.advance();
      let rhs = self.parse_factor();
      node = Expr::binary(op, node, rhs);
    }

    node
  }

  fn parse_factor(&mut self) -> Expr {
    match self.current.kind {
      TokenKind::Num => {
        let token = self.advance();
        match token.text.parse::<i64>() {
          Ok(value) => Expr::number(value),
          Err(_) => {
            self.report(
              DiagnosticKind::IntegerOutOfRange,
              token.loc,
              format!("integer literal {} does not fit in 64 bits", token.text),
            );
            Expr::Error
          }
        }
      }
      TokenKind::Ident => {
        let token = self.advance();
        if RESERVED_NAMES.contains(&token.text) {
          self.report(
            DiagnosticKind::ReservedName,
            token.loc,
            format!("cannot read `{}`: the name is reserved", token.text),
          );
          return Expr::Error;
        }
        Expr::var(token.text)
      }
      TokenKind::LParen => {
        let open = self.advance();
        let expr = self.parse_expr();
        if self.current.kind == TokenKind::RParen {
          self.advance();
        } else if self.strict {
          let found = self.current;
          self.report(
            DiagnosticKind::UnclosedParen,
            found.loc,
            format!(
              "expected `)` to close `(` at byte {}, found {}",
              open.loc,
              found.describe()
            ),
          );
        }
        expr
      }
      _ => {
        let found = self.current;
        self.report(
          DiagnosticKind::UnexpectedToken,
          found.loc,
          format!(
            "expected a number, variable or `(`, found {}",
            found.describe()
          ),
        );
        // Newlines and end of input belong to the statement loop.
        if !found.kind.is_terminator() {
          self.advance();
        }
        Expr::Error
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse_ok(source: &str) -> Program {
    let parsed = parse(source, &Options::default());
    assert!(
      parsed.diagnostics.is_empty(),
      "unexpected diagnostics: {}",
      parsed.diagnostics.render(source)
    );
    parsed.program
  }

  fn num(value: i64) -> Expr {
    Expr::number(value)
  }

  #[test]
  fn multiplication_binds_tighter_than_addition() {
    let program = parse_ok("a = 1 + 2 * 3");
    assert_eq!(
      program.stmts,
      vec![Stmt::assign(
        "a",
        Expr::binary(
          BinaryOp::Add,
          num(1),
          Expr::binary(BinaryOp::Mul, num(2), num(3))
        )
      )]
    );
  }

  #[test]
  fn operators_associate_to_the_left() {
    let program = parse_ok("a = 10 - 3 - 2\nb = 8 / 4 / 2");
    assert_eq!(
      program.stmts,
      vec![
        Stmt::assign(
          "a",
          Expr::binary(
            BinaryOp::Sub,
            Expr::binary(BinaryOp::Sub, num(10), num(3)),
            num(2)
          )
        ),
        Stmt::assign(
          "b",
          Expr::binary(
            BinaryOp::Div,
            Expr::binary(BinaryOp::Div, num(8), num(4)),
            num(2)
          )
        ),
      ]
    );
  }

  #[test]
  fn parentheses_override_precedence() {
    let program = parse_ok("print (1 + x) * 3");
    assert_eq!(
      program.stmts,
      vec![Stmt::print(Expr::binary(
        BinaryOp::Mul,
        Expr::binary(BinaryOp::Add, num(1), Expr::var("x")),
        num(3)
      ))]
    );
  }

  #[test]
  fn blank_lines_are_ignored() {
    let program = parse_ok("\n\nx = 1\n\n\nprint x\n\n");
    assert_eq!(
      program.stmts,
      vec![Stmt::assign("x", num(1)), Stmt::print(Expr::var("x"))]
    );
  }

  #[test]
  fn variables_are_sorted_assignment_targets() {
    let program = parse_ok("y = 2\nx = 1\nprint x\nx = y\nprint z");
    assert_eq!(program.variables().into_iter().collect::<Vec<_>>(), ["x", "y"]);
  }

  #[test]
  fn malformed_line_between_good_ones_reports_once() {
    let parsed = parse("x = 1\n+ 3 4\nprint x", &Options::default());
    assert_eq!(
      parsed.program.stmts,
      vec![Stmt::assign("x", num(1)), Stmt::print(Expr::var("x"))]
    );
    assert_eq!(
      parsed.diagnostics.kinds(),
      vec![DiagnosticKind::UnknownStatementStart]
    );
    assert_eq!(parsed.diagnostics.iter().next().map(|d| d.loc), Some(6));
  }

  #[test]
  fn identifier_without_assign_is_an_unknown_statement() {
    let parsed = parse("foo bar baz\nprint 1", &Options::default());
    assert_eq!(parsed.program.stmts, vec![Stmt::print(num(1))]);
    assert_eq!(parsed.diagnostics.len(), 1);
    let diag = parsed.diagnostics.iter().next().unwrap();
    assert_eq!(diag.kind, DiagnosticKind::UnknownStatementStart);
    assert_eq!(diag.message, "expected `=` after `foo`, found `bar`");
  }

  #[test]
  fn bad_factor_becomes_error_node() {
    let parsed = parse("print * *\nx = 2", &Options::default());
    assert_eq!(
      parsed.program.stmts,
      vec![
        Stmt::print(Expr::binary(BinaryOp::Mul, Expr::Error, Expr::Error)),
        Stmt::assign("x", num(2))
      ]
    );
    assert_eq!(parsed.diagnostics.kinds(), vec![DiagnosticKind::UnexpectedToken]);
    assert!(parsed.program.contains_error());
  }

  #[test]
  fn dangling_operator_does_not_swallow_next_line() {
    let parsed = parse("x = 1 +\nprint x", &Options::default());
    assert_eq!(
      parsed.program.stmts,
      vec![
        Stmt::assign("x", Expr::binary(BinaryOp::Add, num(1), Expr::Error)),
        Stmt::print(Expr::var("x")),
      ]
    );
    assert_eq!(parsed.diagnostics.len(), 1);
  }

  #[test]
  fn trailing_tokens_are_reported_and_statement_kept() {
    let parsed = parse("print 1 2 3\nprint 4", &Options::default());
    assert_eq!(
      parsed.program.stmts,
      vec![Stmt::print(num(1)), Stmt::print(num(4))]
    );
    assert_eq!(parsed.diagnostics.kinds(), vec![DiagnosticKind::UnexpectedToken]);
  }

  #[test]
  fn missing_close_paren_is_silent_by_default() {
    let parsed = parse("print (1 + 2", &Options::default());
    assert!(parsed.diagnostics.is_empty());
    assert_eq!(
      parsed.program.stmts,
      vec![Stmt::print(Expr::binary(BinaryOp::Add, num(1), num(2)))]
    );
  }

  #[test]
  fn missing_close_paren_is_reported_in_strict_mode() {
    let parsed = parse("print (1 + 2", &Options { strict: true });
    assert_eq!(parsed.diagnostics.kinds(), vec![DiagnosticKind::UnclosedParen]);
    assert_eq!(parsed.program.stmts.len(), 1);
  }

  #[test]
  fn oversized_literal_is_reported() {
    let parsed = parse("x = 99999999999999999999", &Options::default());
    assert_eq!(
      parsed.diagnostics.kinds(),
      vec![DiagnosticKind::IntegerOutOfRange]
    );
    assert_eq!(parsed.program.stmts, vec![Stmt::assign("x", Expr::Error)]);
  }

  #[test]
  fn reserved_names_cannot_be_assigned() {
    let parsed = parse("main = 1\nprintf = 2\nmainly = 3", &Options::default());
    assert_eq!(parsed.program.stmts, vec![Stmt::assign("mainly", num(3))]);
    assert_eq!(
      parsed.diagnostics.kinds(),
      vec![DiagnosticKind::ReservedName, DiagnosticKind::ReservedName]
    );
  }

  #[test]
  fn reserved_names_cannot_be_read() {
    let parsed = parse("print main\nx = printf + 1\nprint fmt", &Options::default());
    assert_eq!(
      parsed.program.stmts,
      vec![
        Stmt::print(Expr::Error),
        Stmt::assign("x", Expr::binary(BinaryOp::Add, Expr::Error, num(1))),
        Stmt::print(Expr::var("fmt")),
      ]
    );
    assert_eq!(
      parsed.diagnostics.kinds(),
      vec![DiagnosticKind::ReservedName, DiagnosticKind::ReservedName]
    );
    let locs: Vec<_> = parsed.diagnostics.iter().map(|d| d.loc).collect();
    assert_eq!(locs, vec![6, 15]);
  }

  #[test]
  fn lexical_errors_do_not_break_the_statement() {
    let parsed = parse("x = 4 # 2\nprint x", &Options::default());
    assert_eq!(
      parsed.diagnostics.kinds(),
      vec![
        DiagnosticKind::UnrecognizedCharacter,
        DiagnosticKind::UnexpectedToken
      ]
    );
    assert_eq!(parsed.program.stmts.len(), 2);
  }

  #[test]
  fn pretty_print_reparses_to_same_tree() {
    let source = "a = 1 + 2 * 3\nb = (a - 1) - (2 - 3)\nprint a / b * (4 + a)\nprint 7";
    let program = parse_ok(source);
    let printed = program.to_string();
    assert_eq!(
      printed,
      "a = 1 + (2 * 3)\nb = (a - 1) - (2 - 3)\nprint (a / b) * (4 + a)\nprint 7\n"
    );
    assert_eq!(parse_ok(&printed), program);
  }
}
