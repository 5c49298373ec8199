//! Lexical analysis: turns the raw input string into tokens, one at a time.
//!
//! The lexer is lazy. The parser pulls a token whenever it consumes its
//! lookahead, and the lexer itself never looks further than the character
//! under its cursor. Newlines are significant (they separate statements), so
//! they come back as tokens instead of being skipped with other whitespace.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Eof,
  Newline,
  Print,
  Ident,
  Num,
  Assign,
  Plus,
  Minus,
  Star,
  Slash,
  LParen,
  RParen,
}

impl TokenKind {
  fn punctuator(c: char) -> Option<Self> {
    let kind = match c {
      '=' => Self::Assign,
      '+' => Self::Plus,
      '-' => Self::Minus,
      '*' => Self::Star,
      '/' => Self::Slash,
      '(' => Self::LParen,
      ')' => Self::RParen,
      _ => return None,
    };
    Some(kind)
  }

  /// Whether this token ends a statement.
  pub fn is_terminator(self) -> bool {
    matches!(self, Self::Newline | Self::Eof)
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Eof => "eof",
      Self::Newline => "newline",
      Self::Print => "print",
      Self::Ident => "ident",
      Self::Num => "number",
      Self::Assign => "assign",
      Self::Plus => "plus",
      Self::Minus => "minus",
      Self::Star => "star",
      Self::Slash => "slash",
      Self::LParen => "lparen",
      Self::RParen => "rparen",
    };
    f.pad(name)
  }
}

/// A token together with the slice of source that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
  pub kind: TokenKind,
  pub text: &'a str,
  pub loc: usize,
}

impl<'a> Token<'a> {
  pub fn new(kind: TokenKind, text: &'a str, loc: usize) -> Self {
    Self { kind, text, loc }
  }

  /// Human-friendly description used in diagnostics.
  pub fn describe(&self) -> String {
    match self.kind {
      TokenKind::Eof => "end of input".to_string(),
      TokenKind::Newline => "newline".to_string(),
      _ => format!("`{}`", self.text),
    }
  }
}

pub struct Lexer<'a> {
  source: &'a str,
  chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
  pub fn new(source: &'a str) -> Self {
    Self {
      source,
      chars: source.char_indices().peekable(),
    }
  }

  /// Produce the next token. Once the input is exhausted every further call
  /// returns an `Eof` token.
  pub fn next_token(&mut self, diags: &mut Diagnostics) -> Token<'a> {
    loop {
      let Some(&(start, c)) = self.chars.peek() else {
        return Token::new(TokenKind::Eof, "", self.source.len());
      };

      match c {
        ' ' | '\t' | '\r' => {
          self.chars.next();
        }
        '\n' => {
          self.chars.next();
          return Token::new(TokenKind::Newline, &self.source[start..start + 1], start);
        }
        c if c.is_ascii_alphabetic() => {
          let text = self.take_while(start, |c| c.is_ascii_alphabetic());
          let kind = if text == "print" {
            TokenKind::Print
          } else {
            TokenKind::Ident
          };
          return Token::new(kind, text, start);
        }
        c if c.is_ascii_digit() => {
          let text = self.take_while(start, |c| c.is_ascii_digit());
          return Token::new(TokenKind::Num, text, start);
        }
        _ => {
          self.chars.next();
          if let Some(kind) = TokenKind::punctuator(c) {
            return Token::new(kind, &self.source[start..start + 1], start);
          }
          diags.report(
            DiagnosticKind::UnrecognizedCharacter,
            start,
            format!("unknown character {c:?}"),
          );
        }
      }
    }
  }

  /// Consume the maximal run of characters matching `pred`, starting at the
  /// character under the cursor.
  fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> &'a str {
    let mut end = start;
    while let Some(&(i, c)) = self.chars.peek()
      && pred(c)
    {
      end = i + c.len_utf8();
      self.chars.next();
    }
    &self.source[start..end]
  }
}

/// Lex the whole input into a vector terminated by an `Eof` token.
///
/// The compiler pipeline never calls this; it exists for `--emit tokens` and
/// for tests.
pub fn tokenize<'a>(source: &'a str, diags: &mut Diagnostics) -> Vec<Token<'a>> {
  let mut lexer = Lexer::new(source);
  let mut tokens = Vec::new();
  loop {
    let token = lexer.next_token(diags);
    tokens.push(token);
    if token.kind == TokenKind::Eof {
      return tokens;
    }
  }
}
