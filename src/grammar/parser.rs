/*!
  Recursive descent parser for symbol grammars.

  ```text
  file       := { WS | COMMENT | symbolDef }
  symbolDef  := ['@'] IDENT { WS | COMMENT } statement
  statement  := branch WS* ';'
  branch     := sequence { '|' sequence }
  sequence   := WS* loopExpr { WS* loopExpr } WS*
  loopExpr   := atom WS* [ '*' ]
  atom       := literal | reference | group | range
  literal    := '"' { CHAR | '\' CHAR } '"'
  reference  := '$' IDENT
  group      := '(' branch ')'
  range      := '[' WS* bound WS* '-' WS* bound WS* ']'
  ```

  Sequences and branches are collected on an operand stack and folded into right-nested trees once
  all of their operands are known. The parser stops at the first error.
*/

use quanta::Clock;
use smallvec::SmallVec;

use crate::debug::LogSink;
use crate::error::{CompileError, ParseError};
use crate::options::Options;
use crate::{log_debug, log_info};
use super::expression::{ByteRange, Expression};
use super::location::Location;
use super::symbol::SymbolTable;

type Operands = SmallVec<[Expression; 8]>;

pub struct Parser<'a> {
  source   : &'a [u8],          //< Grammar source
  location : Location,          //< Cursor into `self.source`
  options  : &'a Options,
  sink     : &'a dyn LogSink,
  symbols  : SymbolTable,       //< Accumulates every symbol mentioned so far
}

impl<'a> Parser<'a> {

  pub fn new(source: &'a [u8], options: &'a Options, sink: &'a dyn LogSink) -> Parser<'a> {
    Parser {
      source,
      location: Location::default(),
      options,
      sink,
      symbols: SymbolTable::new()
    }
  }

  /// Parses the whole source. The returned table is complete: every symbol in it has an expression.
  pub fn parse(mut self) -> Result<SymbolTable, CompileError> {
    let clock = Clock::new();
    let start = clock.now();

    loop {
      self.skip_blank();
      match self.c() {
        None    => break,
        Some(_) => self.parse_symbol_definition()?,
      }
    }
    self.symbols.check_complete()?;

    let parse_time = clock.now().duration_since(start);
    log_info!(
      self.sink,
      None,
      "parsed {} symbols in {:?}",
      self.symbols.len(),
      parse_time
    );

    Ok(self.symbols)
  }


  // region Cursor

  fn at(&self, idx: usize) -> Option<u8> {
    self.source.get(idx).copied()
  }

  /// Same as `at()` but assumes `idx=self.location.offset`.
  fn c(&self) -> Option<u8> {
    self.at(self.location.offset)
  }

  fn advance(&mut self) {
    if let Some(byte) = self.c() {
      self.location = self.location.advance(byte);
    }
  }

  fn skip_whitespace(&mut self) {
    while let Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') = self.c() {
      self.advance();
    }
  }

  /// Skips a `#` comment up to, not including, the end of the line.
  fn skip_comment(&mut self) {
    if self.c() != Some(b'#') {
      return;
    }
    while let Some(byte) = self.c() {
      if byte == b'\n' {
        break;
      }
      self.advance();
    }
  }

  /// Skips any mix of whitespace and comments.
  fn skip_blank(&mut self) {
    loop {
      let before = self.location.offset;
      self.skip_whitespace();
      self.skip_comment();
      if self.location.offset == before {
        break;
      }
    }
  }

  /// An error at the cursor. `eof_message` is used instead of `message` when the source has ended.
  fn error(&self, message: &'static str, eof_message: &'static str) -> CompileError {
    let found = self.c();
    let message = match found {
      Some(_) => message,
      None    => eof_message,
    };
    ParseError::new(message, found, self.location).into()
  }

  /// Consumes `expected` or fails.
  fn expect(&mut self, expected: u8, message: &'static str, eof_message: &'static str)
    -> Result<(), CompileError>
  {
    match self.c() {
      Some(byte) if byte == expected => {
        self.advance();
        Ok(())
      }
      _ => Err(self.error(message, eof_message))
    }
  }

  // endregion


  fn parse_symbol_definition(&mut self) -> Result<(), CompileError> {
    let start = self.location;
    let is_lexeme = self.c() == Some(b'@');
    if is_lexeme {
      self.advance();
    }

    let name = self.parse_identifier("symbol name too long")?;
    let id   = self.symbols.get_or_create(name, start);
    self.symbols.check_undefined(id, start)?;

    self.skip_blank();
    let expression = self.parse_statement()?;

    #[cfg(feature = "DEBUG")]
    log_debug!(
      self.sink,
      Some(start),
      "{}{} {};",
      if is_lexeme { "@" } else { "" },
      String::from_utf8_lossy(name),
      expression.display(&self.symbols)
    );

    self.symbols.define(id, expression, is_lexeme, start)
  }

  /// Reads `[A-Za-z0-9_]+`.
  fn parse_identifier(&mut self, too_long_message: &'static str) -> Result<&'a [u8], CompileError> {
    let source = self.source;
    let start  = self.location;
    while let Some(byte) = self.c() {
      if !(byte.is_ascii_alphanumeric() || byte == b'_') {
        break;
      }
      self.advance();
    }

    let name = &source[start.offset..self.location.offset];
    if name.is_empty() {
      return Err(self.error("expected symbol name", "unexpected end of file, expected symbol name"));
    }
    if name.len() > self.options.max_symbol_name_length {
      return Err(ParseError::new(too_long_message, None, start).into());
    }
    Ok(name)
  }

  fn parse_statement(&mut self) -> Result<Expression, CompileError> {
    let expression = self.parse_branch()?;
    self.skip_whitespace();
    self.expect(b';', "expected statement end", "unexpected end of file, expected statement end")?;
    Ok(expression)
  }

  fn parse_branch(&mut self) -> Result<Expression, CompileError> {
    let mut alternatives = Operands::new();
    alternatives.push(self.parse_sequence()?);
    while self.c() == Some(b'|') {
      self.advance();
      alternatives.push(self.parse_sequence()?);
    }
    fold_right(alternatives, Expression::branch)
      .ok_or_else(|| self.error("empty expression", "unexpected end of file, expected expression"))
  }

  fn parse_sequence(&mut self) -> Result<Expression, CompileError> {
    let mut items = Operands::new();
    loop {
      self.skip_whitespace();
      match self.c() {

        Some(b'"') | Some(b'$') | Some(b'(') | Some(b'[') => {
          items.push(self.parse_loop()?);
        }

        Some(b'|') | Some(b')') | Some(b';') | None => {
          break;
        }

        Some(_) => {
          return Err(self.error("unexpected character", ""));
        }

      }
    }

    fold_right(items, Expression::sequence)
      .ok_or_else(|| self.error("empty expression", "unexpected end of file, expected expression"))
  }

  fn parse_loop(&mut self) -> Result<Expression, CompileError> {
    let atom = self.parse_atom()?;
    self.skip_whitespace();
    if self.c() == Some(b'*') {
      self.advance();
      return Ok(Expression::Loop(Box::new(atom)));
    }
    Ok(atom)
  }

  fn parse_atom(&mut self) -> Result<Expression, CompileError> {
    match self.c() {
      Some(b'"') => self.parse_literal(),
      Some(b'$') => self.parse_reference(),
      Some(b'(') => self.parse_group(),
      Some(b'[') => self.parse_range(),
      _          => Err(self.error("unexpected character", "unexpected end of file, expected expression")),
    }
  }

  fn parse_literal(&mut self) -> Result<Expression, CompileError> {
    let start = self.location;
    self.advance(); // '"'

    let mut bytes: Vec<u8> = Vec::new();
    loop {
      match self.c() {
        None => {
          return Err(self.error("", "unexpected end of file, expected literal delimiter"));
        }
        Some(b'"') => {
          self.advance();
          break;
        }
        Some(b'\\') => {
          self.advance();
          match self.c() {
            Some(byte) => bytes.push(byte),
            None       => {
              return Err(self.error("", "unexpected end of file, expected escaped character"));
            }
          }
          self.advance();
        }
        Some(byte) => {
          bytes.push(byte);
          self.advance();
        }
      }
    }

    Expression::literal(&bytes).ok_or_else(|| ParseError::new("empty literal", None, start).into())
  }

  fn parse_reference(&mut self) -> Result<Expression, CompileError> {
    let start = self.location;
    self.advance(); // '$'
    let name = self.parse_identifier("reference name too long")?;
    Ok(Expression::Reference(self.symbols.get_or_create(name, start)))
  }

  fn parse_group(&mut self) -> Result<Expression, CompileError> {
    self.advance(); // '('
    let expression = self.parse_branch()?;
    self.expect(b')', "expected group end", "unexpected end of file, expected group end")?;
    Ok(expression)
  }

  fn parse_range(&mut self) -> Result<Expression, CompileError> {
    let start = self.location;
    self.advance(); // '['

    self.skip_whitespace();
    let first = self.parse_bound()?;
    self.skip_whitespace();
    self.expect(b'-', "expected range separator", "unexpected end of file, expected range separator")?;
    self.skip_whitespace();
    let last = self.parse_bound()?;
    self.skip_whitespace();
    self.expect(b']', "expected range end", "unexpected end of file, expected range end")?;

    if last < first {
      return Err(ParseError::new("reversed range", None, start).into());
    }
    Ok(Expression::Range(ByteRange::inclusive(first, last)))
  }

  fn parse_bound(&mut self) -> Result<u8, CompileError> {
    match self.c() {
      Some(b']') | None => {
        Err(self.error("expected range bound", "unexpected end of file, expected range bound"))
      }
      Some(b'\\') => {
        self.advance();
        match self.c() {
          Some(byte) => {
            self.advance();
            Ok(byte)
          }
          None => Err(self.error("", "unexpected end of file, expected escaped character"))
        }
      }
      Some(byte) => {
        self.advance();
        Ok(byte)
      }
    }
  }

}

/// Folds `a b c` into `combine(a, combine(b, c))`. `None` if there are no operands.
fn fold_right(operands: Operands, combine: fn(Expression, Expression) -> Expression) -> Option<Expression> {
  operands
    .into_iter()
    .rev()
    .reduce(|folded, left| combine(left, folded))
}


#[cfg(test)]
mod test {
  use super::*;
  use crate::debug::NullSink;
  use crate::debug::test::RecordingSink;
  use crate::debug::LogLevel;
  use crate::grammar::SymbolId;

  fn parse(source: &str) -> Result<SymbolTable, CompileError> {
    Parser::new(source.as_bytes(), &Options::default(), &NullSink).parse()
  }

  fn expression_of<'t>(table: &'t SymbolTable, name: &str) -> &'t Expression {
    let id = table.find(name).unwrap();
    table.get(id).unwrap().expression.as_ref().unwrap()
  }

  fn parse_error(source: &str) -> ParseError {
    match parse(source) {
      Err(CompileError::Parse(error)) => error,
      other => panic!("expected a parse error for {:?}, got {:?}", source, other.map(|t| t.len())),
    }
  }

  fn single(byte: u8) -> Expression {
    Expression::Range(ByteRange::single(byte))
  }

  #[test]
  fn sequence_and_branch_nest_right(){
    let table = parse(r#"@s "x" "y" "z"; @b "x" | "y" | "z";"#).unwrap();
    assert_eq!(
      expression_of(&table, "s"),
      &Expression::sequence(single(b'x'), Expression::sequence(single(b'y'), single(b'z')))
    );
    assert_eq!(
      expression_of(&table, "b"),
      &Expression::branch(single(b'x'), Expression::branch(single(b'y'), single(b'z')))
    );
  }

  #[test]
  fn loops_groups_and_ranges(){
    let table = parse("@a ( [a - z] | \"_\" ) * [ 0-9 ] ;").unwrap();
    let expected = Expression::sequence(
      Expression::Loop(Box::new(Expression::branch(
        Expression::Range(ByteRange::inclusive(b'a', b'z')),
        single(b'_')
      ))),
      Expression::Range(ByteRange::inclusive(b'0', b'9'))
    );
    assert_eq!(expression_of(&table, "a"), &expected);
  }

  #[test]
  fn escapes_are_verbatim(){
    let table = parse(r#"@q "\"\n"; @r [\]-\~];"#).unwrap();
    assert_eq!(expression_of(&table, "q"), &Expression::literal(b"\"n").unwrap());
    assert_eq!(
      expression_of(&table, "r"),
      &Expression::Range(ByteRange::inclusive(b']', b'~'))
    );
  }

  #[test]
  fn forward_references_and_comments(){
    let source = "# numbers\n\
                  @number $digit $digit* ; # trailing\n\
                  digit # a fragment\n  [0-9];\n";
    let table = parse(source).unwrap();
    let number = table.find("number").unwrap();
    let digit  = table.find("digit").unwrap();
    assert_eq!(number, SymbolId(0));
    assert_eq!(digit, SymbolId(1));
    assert!(table.get(number).unwrap().is_lexeme);
    assert!(!table.get(digit).unwrap().is_lexeme);
    assert_eq!(table.get(digit).unwrap().location.line, 3);
    assert_eq!(table.lexemes().collect::<Vec<_>>(), vec![number]);
  }

  #[test]
  fn symbol_errors(){
    assert!(matches!(
      parse("@a $b;"),
      Err(CompileError::UndefinedSymbol { ref name, .. }) if name == "b"
    ));
    assert!(matches!(
      parse("@a \"x\";\n@a \"y\";"),
      Err(CompileError::DuplicateSymbol { ref name, location }) if name == "a" && location.line == 2
    ));
  }

  #[test]
  fn redefinition_fails_before_its_body_is_read(){
    // The second body is unterminated; the duplicate name is still what gets reported.
    match parse("@a \"x\";\n@a \"y") {
      Err(CompileError::DuplicateSymbol { name, location }) => {
        assert_eq!(name, "a");
        assert_eq!(location, Location { offset: 8, line: 2, column: 1 });
      }
      other => panic!("expected a duplicate symbol, got {:?}", other),
    }
  }

  #[test]
  fn syntax_errors(){
    assert_eq!(parse_error("@a \"abc").message, "unexpected end of file, expected literal delimiter");
    assert_eq!(parse_error("@a \"x\"").message, "unexpected end of file, expected statement end");
    assert_eq!(parse_error("@a \"x\" | ;").message, "empty expression");
    assert_eq!(parse_error("@a ;").message, "empty expression");
    assert_eq!(parse_error("@a \"\";").message, "empty literal");
    assert_eq!(parse_error("@a [z-a];").message, "reversed range");
    assert_eq!(parse_error("@a [a z];").message, "expected range separator");
    assert_eq!(parse_error("@a (\"x\";").message, "expected group end");
    assert_eq!(parse_error("@ \"x\";").message, "expected symbol name");
    assert_eq!(parse_error("@a $;").message, "expected symbol name");

    let error = parse_error("@a \"x\" % ;");
    assert_eq!(error.message, "unexpected character");
    assert_eq!(error.found, Some(b'%'));
    assert_eq!(error.location.column, 8);
  }

  #[test]
  fn name_length_is_configurable(){
    let options = Options::new("n=3").unwrap();
    let result = Parser::new(b"@abc \"x\"; @abcd \"y\";", &options, &NullSink).parse();
    match result {
      Err(CompileError::Parse(error)) => {
        assert_eq!(error.message, "symbol name too long");
        assert_eq!(error.location.offset, 11);
      }
      other => panic!("expected a parse error, got {:?}", other.map(|t| t.len())),
    }

    let result = Parser::new(b"@a $abcd;", &options, &NullSink).parse();
    assert!(matches!(result, Err(CompileError::Parse(ParseError { message: "reference name too long", .. }))));
  }

  #[test]
  fn logs_definitions(){
    let sink = RecordingSink::default();
    let options = Options::default();
    Parser::new(b"@a \"xy\" $b*; b [0-9];", &options, &sink).parse().unwrap();
    assert!(sink.contains(LogLevel::Info, "parsed 2 symbols"));
    #[cfg(feature = "DEBUG")]
    assert!(sink.contains(LogLevel::Debug, "@a \"xy\" $b*;"));
  }

}
