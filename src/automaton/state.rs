/*!
  The states of the shared automaton.

  States live in one append-only `Vec` and refer to each other by `StateId`, so cycles (loops,
  recursive symbols) are just indices. A `failure` continuation is explored at the offset where the
  state is entered, without consuming input.
*/

use std::fmt::{Display, Formatter};

use crate::grammar::{ByteRange, SymbolId};

/// Index of a state in its `Automaton`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct StateId(pub u32);

impl StateId {
  #[inline(always)]
  pub fn index(&self) -> usize {
    self.0 as usize
  }
}

impl Display for StateId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "s{}", self.0)
  }
}


#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum State {
  /// Consumes one byte in `range`.
  Test {
    range   : ByteRange,
    success : StateId,
    failure : Option<StateId>,
  },
  /// Moves on without consuming input.
  Control {
    success : StateId,
    failure : Option<StateId>,
  },
  /// Enters another symbol's fragment, resuming at `ret` when it exits.
  Call {
    callee : StateId,
    ret    : StateId,
  },
  /// End of a symbol's fragment. Returns to the caller, or to `accept` when entered from dispatch.
  Exit {
    symbol : SymbolId,
    accept : Option<StateId>,
  },
  Accept {
    symbol : SymbolId,
  },
}

impl Display for State {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      State::Test { range, success, failure } => {
        write!(f, "test    {:<8} -> {}", range.to_string(), success)?;
        if let Some(failure) = failure {
          write!(f, " else {}", failure)?;
        }
        Ok(())
      }

      State::Control { success, failure } => {
        write!(f, "control          -> {}", success)?;
        if let Some(failure) = failure {
          write!(f, " else {}", failure)?;
        }
        Ok(())
      }

      State::Call { callee, ret } => {
        write!(f, "call    {:<8} -> {}", callee.to_string(), ret)
      }

      State::Exit { symbol, accept: Some(accept) } => {
        write!(f, "exit    {:<8} -> {}", symbol.to_string(), accept)
      }

      State::Exit { symbol, accept: None } => {
        write!(f, "exit    {}", symbol)
      }

      State::Accept { symbol } => {
        write!(f, "accept  {}", symbol)
      }

    }
  }
}


#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn display_states(){
    let test = State::Test {
      range: ByteRange::inclusive(b'0', b'9'),
      success: StateId(3),
      failure: Some(StateId(7))
    };
    assert_eq!(test.to_string(), "test    [0-9]    -> s3 else s7");

    let call = State::Call { callee: StateId(1), ret: StateId(2) };
    assert_eq!(call.to_string(), "call    s1       -> s2");

    let exit = State::Exit { symbol: SymbolId(0), accept: None };
    assert_eq!(exit.to_string(), "exit    #0");
  }

}
