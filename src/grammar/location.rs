/*!
  A `Location` is a point in the grammar source: a byte offset plus the human readable line and
  column that correspond to it. Lines and columns are 1-based, offsets are 0-based.
*/

use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Location {
  pub offset : usize, //< byte offset into the source
  pub line   : u32,   //< 1-based line number
  pub column : u32,   //< 1-based column, counted in bytes
}

impl Default for Location {
  fn default() -> Self {
    Location {
      offset: 0,
      line: 1,
      column: 1
    }
  }
}

impl Location {

  /// The location immediately after `byte`, which was read at `self`.
  #[must_use]
  pub fn advance(self, byte: u8) -> Location {
    if byte == b'\n' {
      Location {
        offset: self.offset + 1,
        line: self.line + 1,
        column: 1
      }
    } else {
      Location {
        offset: self.offset + 1,
        column: self.column + 1,
        ..self
      }
    }
  }

}

impl Display for Location {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}
