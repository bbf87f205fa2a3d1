/*!
  Expression trees: the parsed form of one symbol's definition.

  Every node except `Reference` exclusively owns its children, so the owning edges always form a
  tree. A `Reference` names another symbol by `SymbolId` and owns nothing, which is what lets
  symbols refer to each other, and to themselves, without cycles in ownership.
*/

use std::fmt::{Display, Formatter, Result as FmtResult};

use super::symbol::{SymbolId, SymbolTable};

/// A class of single bytes, `lower <= byte < upper`. `upper` may be 256.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ByteRange {
  pub lower: u16,
  pub upper: u16,
}

impl ByteRange {

  pub fn single(byte: u8) -> ByteRange {
    ByteRange {
      lower: byte as u16,
      upper: byte as u16 + 1
    }
  }

  /// The range `[first, last]` as written in the grammar.
  pub fn inclusive(first: u8, last: u8) -> ByteRange {
    ByteRange {
      lower: first as u16,
      upper: last as u16 + 1
    }
  }

  #[inline(always)]
  pub fn contains(&self, byte: u8) -> bool {
    let byte = byte as u16;
    self.lower <= byte && byte < self.upper
  }

  /// The byte matched, if the range matches exactly one.
  pub fn as_single(&self) -> Option<u8> {
    match self.upper == self.lower + 1 {
      true  => Some(self.lower as u8),
      false => None
    }
  }

  /// Inclusive last byte. Ranges are never empty, so this is always `upper - 1`.
  pub fn last(&self) -> u8 {
    (self.upper - 1) as u8
  }

}

impl Display for ByteRange {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self.as_single() {
      Some(byte) => {
        write!(f, "\"")?;
        write_escaped(f, byte, b"\"\\")?;
        write!(f, "\"")
      }
      None => {
        write!(f, "[")?;
        write_escaped(f, self.lower as u8, b"]\\- \t\r\n")?;
        write!(f, "-")?;
        write_escaped(f, self.last(), b"]\\- \t\r\n")?;
        write!(f, "]")
      }
    }
  }
}

/// Writes `byte` as grammar source, escaping the bytes in `special`. Bytes that are not printable
/// ASCII have no source form and are shown as `\xNN`.
fn write_escaped(f: &mut Formatter<'_>, byte: u8, special: &[u8]) -> FmtResult {
  if special.contains(&byte) {
    write!(f, "\\{}", byte as char)
  } else if byte.is_ascii_graphic() || byte == b' ' {
    write!(f, "{}", byte as char)
  } else {
    write!(f, "\\x{:02x}", byte)
  }
}


#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Expression {
  Sequence(Box<Expression>, Box<Expression>),
  Branch(Box<Expression>, Box<Expression>),
  Range(ByteRange),
  /// Zero or more repetitions of the body, greedy.
  Loop(Box<Expression>),
  Reference(SymbolId),
}

impl Expression {

  pub fn sequence(left: Expression, right: Expression) -> Expression {
    Expression::Sequence(Box::new(left), Box::new(right))
  }

  pub fn branch(left: Expression, right: Expression) -> Expression {
    Expression::Branch(Box::new(left), Box::new(right))
  }

  /// A literal string as a right-nested sequence of single byte ranges. `None` for the empty string.
  pub fn literal(bytes: &[u8]) -> Option<Expression> {
    let (&last, rest) = bytes.split_last()?;
    let mut expression = Expression::Range(ByteRange::single(last));
    for &byte in rest.iter().rev() {
      expression = Expression::sequence(Expression::Range(ByteRange::single(byte)), expression);
    }
    Some(expression)
  }

  /// Calls `visit` for every symbol this tree references directly, in source order.
  pub fn for_each_reference<F: FnMut(SymbolId)>(&self, visit: &mut F) {
    match self {
      Expression::Sequence(left, right)
      | Expression::Branch(left, right) => {
        left.for_each_reference(visit);
        right.for_each_reference(visit);
      }
      Expression::Loop(body)      => body.for_each_reference(visit),
      Expression::Reference(id)   => visit(*id),
      Expression::Range(_)        => {}
    }
  }

  /// Renders the tree in grammar syntax. References need the symbol table for their names.
  pub fn display<'a>(&'a self, symbols: &'a SymbolTable) -> ExpressionDisplay<'a> {
    ExpressionDisplay {
      expression: self,
      symbols
    }
  }

}


pub struct ExpressionDisplay<'a> {
  expression : &'a Expression,
  symbols    : &'a SymbolTable,
}

// Binding strength, loosest first.
const BRANCH_PRECEDENCE   : u8 = 0;
const SEQUENCE_PRECEDENCE : u8 = 1;
const LOOP_PRECEDENCE     : u8 = 2;
const ATOM_PRECEDENCE     : u8 = 3;

impl<'a> ExpressionDisplay<'a> {

  fn write(&self, f: &mut Formatter<'_>, expression: &Expression, context: u8) -> FmtResult {
    let precedence = match expression {
      Expression::Branch(..)   => BRANCH_PRECEDENCE,
      Expression::Sequence(..) => SEQUENCE_PRECEDENCE,
      Expression::Loop(..)     => LOOP_PRECEDENCE,
      _                        => ATOM_PRECEDENCE,
    };
    if precedence < context {
      write!(f, "(")?;
    }

    match expression {

      Expression::Branch(left, right) => {
        self.write(f, left, SEQUENCE_PRECEDENCE)?;
        write!(f, " | ")?;
        self.write(f, right, BRANCH_PRECEDENCE)?;
      }

      Expression::Sequence(..) => {
        self.write_sequence(f, expression)?;
      }

      Expression::Loop(body) => {
        self.write(f, body, ATOM_PRECEDENCE)?;
        write!(f, "*")?;
      }

      Expression::Range(range) => {
        write!(f, "{}", range)?;
      }

      Expression::Reference(id) => {
        match self.symbols.get(*id) {
          Some(symbol) => write!(f, "${}", symbol.name)?,
          None         => write!(f, "${}", id)?,
        }
      }

    }

    if precedence < context {
      write!(f, ")")?;
    }
    Ok(())
  }

  /// Flattens nested sequences and merges runs of single bytes back into one literal.
  fn write_sequence(&self, f: &mut Formatter<'_>, expression: &Expression) -> FmtResult {
    let mut items: Vec<&Expression> = Vec::new();
    flatten_sequence(expression, &mut items);

    let mut in_literal = false;
    for (index, item) in items.iter().enumerate() {
      let single = match item {
        Expression::Range(range) => range.as_single(),
        _                        => None,
      };
      match single {
        Some(byte) => {
          if !in_literal {
            if index > 0 {
              write!(f, " ")?;
            }
            write!(f, "\"")?;
            in_literal = true;
          }
          write_escaped(f, byte, b"\"\\")?;
        }
        None => {
          if in_literal {
            write!(f, "\"")?;
            in_literal = false;
          }
          if index > 0 {
            write!(f, " ")?;
          }
          self.write(f, item, LOOP_PRECEDENCE)?;
        }
      }
    }
    if in_literal {
      write!(f, "\"")?;
    }
    Ok(())
  }

}

/// The items of a sequence in order, whichever way its `Sequence` nodes nest.
fn flatten_sequence<'e>(expression: &'e Expression, items: &mut Vec<&'e Expression>) {
  match expression {
    Expression::Sequence(left, right) => {
      flatten_sequence(left, items);
      flatten_sequence(right, items);
    }
    _ => items.push(expression),
  }
}

impl<'a> Display for ExpressionDisplay<'a> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    self.write(f, self.expression, BRANCH_PRECEDENCE)
  }
}
