/*!
  The front end: grammar source text in, a frozen `SymbolTable` of expression trees out.
*/

pub mod location;
pub mod symbol;
pub mod expression;
pub mod parser;

pub use location::Location;
pub use symbol::{Symbol, SymbolId, SymbolTable};
pub use expression::{ByteRange, Expression};
pub use parser::Parser;
