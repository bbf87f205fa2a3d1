/*!
  `lexsym` compiles a grammar of named lexical symbols into one shared automaton and uses it to
  tokenize input.

  ```text
  # A lexeme is marked with '@'; other symbols are fragments, usable only through '$' references.
  digit  [0-9];
  @num   $digit $digit*;
  @ws    " " " "*;
  @paren "(" ($paren | $num)* ")";
  ```

  Grammars are parsed into a `SymbolTable` of expression trees, which the `Compiler` turns into an
  `Automaton`. References compile to calls into the referenced symbol's fragment, so symbols may be
  recursive. A `Matcher` finds the longest lexeme at the start of an input; `Tokens` does that
  repeatedly over a whole buffer.
*/

pub mod debug;
pub mod limits;
pub mod options;
pub mod error;
pub mod grammar;
pub mod automaton;
pub mod tokenizer;

pub use automaton::{Automaton, MatchResult, Matcher};
pub use debug::{LogLevel, LogSink, NullSink, StderrSink};
pub use error::{CompileError, MatchError, ParseError, ToDiagnostic};
pub use grammar::SymbolId;
pub use options::{Options, OptionsError};
pub use tokenizer::{Lexeme, TokenError, Tokens};

use automaton::Compiler;
use grammar::Parser;


/// Compiles `source` with default options, discarding diagnostic messages.
pub fn compile(source: &[u8]) -> Result<Automaton, CompileError> {
  compile_with(source, &Options::default(), &NullSink)
}

pub fn compile_with(source: &[u8], options: &Options, sink: &dyn LogSink) -> Result<Automaton, CompileError> {
  let symbols = Parser::new(source, options, sink).parse()?;
  Compiler::new(&symbols, options, sink).compile()
}

/// The best token at the start of `input`. Use a `Matcher` directly to reuse its memory.
pub fn scan(automaton: &Automaton, input: &[u8], options: &Options) -> Result<MatchResult, MatchError> {
  Matcher::new(options).scan(automaton, input)
}
