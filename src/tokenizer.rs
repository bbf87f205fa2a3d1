/*!
  Splits a whole input buffer into lexemes by scanning repeatedly, each scan starting where the
  previous token ended.
*/

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

use crate::automaton::{Automaton, MatchResult, Matcher};
use crate::error::MatchError;
use crate::grammar::SymbolId;
use crate::options::Options;

/// One token: which lexeme matched and where.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lexeme {
  pub symbol : SymbolId,
  pub span   : Range<usize>, //< Byte range in the scanned input
}

impl Lexeme {
  pub fn text<'i>(&self, input: &'i [u8]) -> &'i [u8] {
    &input[self.span.clone()]
  }
}


#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TokenError {
  /// No lexeme matches at `offset`.
  Unrecognized { offset: usize },
  /// The input ends inside what could still become a lexeme.
  Truncated { offset: usize },
  Matcher(MatchError),
}

impl Display for TokenError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      TokenError::Unrecognized { offset } => write!(f, "unrecognized input at offset {}", offset),
      TokenError::Truncated { offset }    => write!(f, "input ends inside a token starting at offset {}", offset),
      TokenError::Matcher(error)          => write!(f, "{}", error),
    }
  }
}

impl Error for TokenError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      TokenError::Matcher(error) => Some(error),
      _                          => None,
    }
  }
}

impl From<MatchError> for TokenError {
  fn from(error: MatchError) -> Self {
    TokenError::Matcher(error)
  }
}


/// Iterator over the lexemes of `input`. Stops at the end of the input or after the first error.
pub struct Tokens<'a> {
  automaton : &'a Automaton,
  input     : &'a [u8],
  offset    : usize,
  matcher   : Matcher,
  finished  : bool,
}

impl<'a> Tokens<'a> {

  pub fn new(automaton: &'a Automaton, input: &'a [u8], options: &Options) -> Self {
    Tokens {
      automaton,
      input,
      offset: 0,
      matcher: Matcher::new(options),
      finished: false
    }
  }

  /// Where the next token starts.
  pub fn offset(&self) -> usize {
    self.offset
  }

  fn next_lexeme(&mut self) -> Result<Lexeme, TokenError> {
    let start = self.offset;
    match self.matcher.scan(self.automaton, &self.input[start..])? {
      MatchResult::Accept { symbol, length } => {
        self.offset += length;
        Ok(Lexeme { symbol, span: start..self.offset })
      }
      MatchResult::NoMatch       => Err(TokenError::Unrecognized { offset: start }),
      MatchResult::Incomplete(_) => Err(TokenError::Truncated { offset: start }),
    }
  }

}

impl<'a> Iterator for Tokens<'a> {
  type Item = Result<Lexeme, TokenError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished || self.offset >= self.input.len() {
      return None;
    }
    let result = self.next_lexeme();
    if result.is_err() {
      self.finished = true;
    }
    Some(result)
  }
}

impl<'a> std::iter::FusedIterator for Tokens<'a> {}
