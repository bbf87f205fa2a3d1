/*!
  The symbol table.

  Symbols are created by their definition or, earlier, by the first reference to them. Their order
  of creation is their order in the table, and for lexemes that order is the match priority. Names
  are indexed in a `PatriciaMap` keyed by the name bytes.
*/

use std::fmt::{Display, Formatter};
use std::ops::Index;

use patricia_tree::PatriciaMap;

use crate::error::CompileError;
use super::expression::Expression;
use super::location::Location;

/// Index of a symbol in its `SymbolTable`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct SymbolId(pub u32);

impl SymbolId {
  #[inline(always)]
  pub fn index(&self) -> usize {
    self.0 as usize
  }
}

impl Display for SymbolId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}


#[derive(Clone, Debug)]
pub struct Symbol {
  pub name       : String,
  pub is_lexeme  : bool,               //< Dispatched as a token type, as opposed to a fragment
  pub expression : Option<Expression>, //< `None` until the definition has been parsed
  pub location   : Location,           //< The definition, or the first reference until defined
}

impl Symbol {
  pub fn is_defined(&self) -> bool {
    self.expression.is_some()
  }

  /// The error for this symbol having no definition.
  pub fn undefined(&self) -> CompileError {
    CompileError::UndefinedSymbol {
      name: self.name.clone(),
      location: self.location
    }
  }

  fn duplicate(&self, location: Location) -> CompileError {
    CompileError::DuplicateSymbol {
      name: self.name.clone(),
      location
    }
  }
}


#[derive(Default, Debug)]
pub struct SymbolTable {
  symbols : Vec<Symbol>,
  index   : PatriciaMap<SymbolId>,
}

impl SymbolTable {

  pub fn new() -> Self {
    Self::default()
  }

  /// The symbol named `name`, appending an undefined fragment symbol first if there is none.
  pub fn get_or_create(&mut self, name: &[u8], location: Location) -> SymbolId {
    if let Some(id) = self.index.get(name) {
      return *id;
    }
    let id = SymbolId(self.symbols.len() as u32);
    self.symbols.push(
      Symbol {
        name: String::from_utf8_lossy(name).into_owned(),
        is_lexeme: false,
        expression: None,
        location
      }
    );
    self.index.insert(name, id);
    id
  }

  /// Attaches the expression to `id`. A symbol can be defined only once.
  pub fn define(&mut self, id: SymbolId, expression: Expression, is_lexeme: bool, location: Location)
    -> Result<(), CompileError>
  {
    let symbol = &mut self.symbols[id.index()];
    if symbol.is_defined() {
      return Err(symbol.duplicate(location));
    }
    symbol.expression = Some(expression);
    symbol.is_lexeme  = is_lexeme;
    symbol.location   = location;
    Ok(())
  }

  /// Fails with the first symbol, in table order, that was referenced but never defined.
  pub fn check_complete(&self) -> Result<(), CompileError> {
    match self.symbols.iter().find(|symbol| !symbol.is_defined()) {
      Some(symbol) => Err(symbol.undefined()),
      None         => Ok(())
    }
  }

  /// Fails with `DuplicateSymbol` at `location` if `id` already has a definition.
  pub fn check_undefined(&self, id: SymbolId, location: Location) -> Result<(), CompileError> {
    let symbol = &self[id];
    match symbol.is_defined() {
      true  => Err(symbol.duplicate(location)),
      false => Ok(())
    }
  }

  pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
    self.symbols.get(id.index())
  }

  pub fn find(&self, name: &str) -> Option<SymbolId> {
    self.index.get(name.as_bytes()).copied()
  }

  pub fn len(&self) -> usize {
    self.symbols.len()
  }

  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }

  /// Every symbol with its id, in table order.
  pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
    self.symbols
        .iter()
        .enumerate()
        .map(|(index, symbol)| (SymbolId(index as u32), symbol))
  }

  /// Ids of the lexeme symbols in priority order.
  pub fn lexemes(&self) -> impl Iterator<Item = SymbolId> + '_ {
    self.iter()
        .filter(|(_, symbol)| symbol.is_lexeme)
        .map(|(id, _)| id)
  }

}

/// Ids handed out by a table are always valid for it.
impl Index<SymbolId> for SymbolTable {
  type Output = Symbol;

  fn index(&self, id: SymbolId) -> &Symbol {
    &self.symbols[id.index()]
  }
}
