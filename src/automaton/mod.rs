/*!
  The compiled form of a grammar: one shared state graph for all symbols, plus the dispatch chain
  that says which lexeme symbols are tried, and in what order.

  An `Automaton` is never modified after `Compiler::compile` returns it, so it can be shared between
  threads freely. All per-scan state lives in a `Matcher`.
*/

pub mod state;
pub mod compiler;
pub mod matcher;

use std::fmt::{Display, Formatter};

use crate::grammar::SymbolId;

pub use state::{State, StateId};
pub use compiler::{Compiler, Fragment};
pub use matcher::{MatchResult, Matcher};


/// What the compiler recorded for one symbol.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SymbolInfo {
  pub name      : String,
  pub is_lexeme : bool,
  pub entry     : StateId, //< Where matching the symbol starts
  pub exit      : StateId, //< Its `Exit` state
}

/// A lexeme the matcher tries, in priority order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DispatchEntry {
  pub symbol : SymbolId,
  pub entry  : StateId,
}


#[derive(Clone, Debug)]
pub struct Automaton {
  states   : Vec<State>,
  symbols  : Vec<SymbolInfo>,     //< Indexed by `SymbolId`
  dispatch : Vec<DispatchEntry>,
}

impl Automaton {

  pub(crate) fn new(states: Vec<State>, symbols: Vec<SymbolInfo>, dispatch: Vec<DispatchEntry>) -> Self {
    Automaton {
      states,
      symbols,
      dispatch
    }
  }

  /// Ids handed out by this automaton are always valid for it.
  #[inline(always)]
  pub fn state(&self, id: StateId) -> &State {
    &self.states[id.index()]
  }

  pub fn states(&self) -> &[State] {
    &self.states
  }

  pub fn state_count(&self) -> usize {
    self.states.len()
  }

  pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
    &self.symbols[id.index()]
  }

  pub fn symbol_name(&self, id: SymbolId) -> &str {
    &self.symbol(id).name
  }

  pub fn find_symbol(&self, name: &str) -> Option<SymbolId> {
    self.symbols
        .iter()
        .position(|symbol| symbol.name == name)
        .map(|index| SymbolId(index as u32))
  }

  pub fn dispatch(&self) -> &[DispatchEntry] {
    &self.dispatch
  }

}

/// A listing of every symbol's fragment followed by the state table.
impl Display for Automaton {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for symbol in self.symbols.iter() {
      writeln!(
        f,
        "{}{:<12} entry {:<6} exit {}",
        if symbol.is_lexeme { "@" } else { " " },
        symbol.name,
        symbol.entry.to_string(),
        symbol.exit
      )?;
    }
    for (index, state) in self.states.iter().enumerate() {
      writeln!(f, "{:>6}: {}", StateId(index as u32).to_string(), state)?;
    }
    Ok(())
  }
}
