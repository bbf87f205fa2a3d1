/*!
  Errors produced while building an automaton from a grammar and while matching with one.

  Building can fail in three ways: the grammar source is malformed (`ParseError`), the symbols it
  defines are inconsistent (`DuplicateSymbol`, `UndefinedSymbol`), or the automaton cannot be
  allocated. All of these are fatal for the grammar and are collected in `CompileError`. Matching
  failures are local to one scan and are reported as `MatchError`.
*/

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::automaton::StateId;
use crate::grammar::Location;


/// Conversion into a renderable `codespan_reporting` diagnostic for the grammar file `file`.
pub trait ToDiagnostic {
  fn to_diagnostic<FileId: Copy>(&self, file: FileId) -> Diagnostic<FileId>;
}

/// The one-byte range at `location`, which is what every label points at.
fn label_range(location: &Location) -> Range<usize> {
  location.offset..location.offset + 1
}


/// A syntax violation in the grammar source. Parsing stops at the first one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
  pub message  : &'static str, //< what was expected
  pub found    : Option<u8>,   //< the offending byte, `None` at end of file
  pub location : Location,     //< where the scan stopped
}

impl ParseError {
  pub fn new(message: &'static str, found: Option<u8>, location: Location) -> Self {
    ParseError {
      message,
      found,
      location
    }
  }
}

impl Display for ParseError {
  fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
    match self.found {
      Some(byte) => {
        write!(fmt, "{} at {}, found {:?}", self.message, self.location, char::from(byte))
      }
      None => {
        write!(fmt, "{} at {}", self.message, self.location)
      }
    }
  }
}

impl Error for ParseError {}

impl ToDiagnostic for ParseError {
  fn to_diagnostic<FileId: Copy>(&self, file: FileId) -> Diagnostic<FileId> {
    let label = Label::primary(file, label_range(&self.location)).with_message(self.message);
    Diagnostic::error().with_message(self.to_string()).with_labels(vec![label])
  }
}


#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CompileError {
  Parse(ParseError),
  /// A second definition for a symbol that already has an expression.
  DuplicateSymbol  { name: String, location: Location },
  /// A symbol that was referenced but never defined. `location` is its first reference.
  UndefinedSymbol  { name: String, location: Location },
  /// The automaton could not grow beyond `states` states.
  AllocationFailure { states: usize },
}

impl Display for CompileError {
  fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
    match self {
      CompileError::Parse(error) => {
        write!(fmt, "{}", error)
      }
      CompileError::DuplicateSymbol { name, location } => {
        write!(fmt, "multiple definitions for symbol '{}' at {}", name, location)
      }
      CompileError::UndefinedSymbol { name, location } => {
        write!(fmt, "undefined symbol '{}' referenced at {}", name, location)
      }
      CompileError::AllocationFailure { states } => {
        write!(fmt, "could not allocate automaton state {}", states)
      }
    }
  }
}

impl Error for CompileError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      CompileError::Parse(error) => Some(error),
      _                          => None,
    }
  }
}

impl From<ParseError> for CompileError {
  fn from(error: ParseError) -> Self {
    CompileError::Parse(error)
  }
}

impl ToDiagnostic for CompileError {
  fn to_diagnostic<FileId: Copy>(&self, file: FileId) -> Diagnostic<FileId> {
    match self {
      CompileError::Parse(error) => error.to_diagnostic(file),
      CompileError::DuplicateSymbol { location, .. } => {
        let label = Label::primary(file, label_range(location)).with_message("defined again here");
        Diagnostic::error().with_message(self.to_string()).with_labels(vec![label])
      }
      CompileError::UndefinedSymbol { location, .. } => {
        let label = Label::primary(file, label_range(location)).with_message("first referenced here");
        Diagnostic::error()
          .with_message(self.to_string())
          .with_labels(vec![label])
          .with_notes(vec!["every referenced symbol needs a definition ending in ';'".to_string()])
      }
      CompileError::AllocationFailure { .. } => {
        Diagnostic::error().with_message(self.to_string())
      }
    }
  }
}


/// A failure of a single scan. The automaton and other matchers are unaffected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MatchError {
  /// A `Call` would nest deeper than the configured maximum.
  CallStackOverflow  { depth: usize, offset: usize },
  /// A fragment exit was reached with nothing to return to.
  CallStackUnderflow { state: StateId },
}

impl Display for MatchError {
  fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
    match self {
      MatchError::CallStackOverflow { depth, offset } => {
        write!(fmt, "call stack overflow: depth {} exceeded at input offset {}", depth, offset)
      }
      MatchError::CallStackUnderflow { state } => {
        write!(fmt, "call stack underflow at {}", state)
      }
    }
  }
}

impl Error for MatchError {}
