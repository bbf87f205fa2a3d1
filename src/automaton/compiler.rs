/*!
  Builds the shared automaton from a complete `SymbolTable`.

  Every symbol is compiled exactly once into a fragment with a single entry and a single `Exit`.
  References become `Call` states into the referenced fragment instead of copies of it. The entry
  and exit of a fragment are recorded before its body is compiled, so a symbol that refers to
  itself, directly or through others, finds its own fragment already in the memo table and the
  compiler does not recurse forever.

  `compile_node` builds states back to front: every node is compiled with the state to continue at
  on success already known, and returns its own entry. An optional failure continuation is attached
  to the entry of the node and is explored at the offset where the node starts.
*/

use quanta::Clock;

use crate::debug::LogSink;
use crate::error::CompileError;
use crate::grammar::{Expression, SymbolId, SymbolTable};
use crate::options::Options;
use crate::{log_debug, log_info, log_warning};
use super::{Automaton, DispatchEntry, State, StateId, SymbolInfo};

/// The entry and exit states of one compiled symbol.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Fragment {
  pub entry : StateId,
  pub exit  : StateId,
}

pub struct Compiler<'a> {
  symbols   : &'a SymbolTable,
  options   : &'a Options,
  sink      : &'a dyn LogSink,
  states    : Vec<State>,
  fragments : Vec<Option<Fragment>>, //< Memo table, indexed by `SymbolId`
}

impl<'a> Compiler<'a> {

  pub fn new(symbols: &'a SymbolTable, options: &'a Options, sink: &'a dyn LogSink) -> Compiler<'a> {
    Compiler {
      symbols,
      options,
      sink,
      states: Vec::new(),
      fragments: vec![None; symbols.len()]
    }
  }

  /// Fails with `UndefinedSymbol` if the table was not completed by the parser.
  pub fn compile(mut self) -> Result<Automaton, CompileError> {
    let clock = Clock::new();
    let start = clock.now();

    let symbols = self.symbols;
    symbols.check_complete()?;
    let fragments = symbols
      .iter()
      .map(|(id, _)| self.compile_symbol(id))
      .collect::<Result<Vec<Fragment>, CompileError>>()?;
    self.warn_unreferenced();

    // Dispatch in table order, which is declaration order.
    let mut dispatch = Vec::new();
    for id in symbols.lexemes() {
      let fragment = fragments[id.index()];
      let accept   = self.push(State::Accept { symbol: id })?;
      self.patch(fragment.exit, State::Exit { symbol: id, accept: Some(accept) });
      dispatch.push(DispatchEntry { symbol: id, entry: fragment.entry });
    }

    let mut infos = Vec::with_capacity(symbols.len());
    for (id, symbol) in symbols.iter() {
      let fragment = fragments[id.index()];
      infos.push(
        SymbolInfo {
          name: symbol.name.clone(),
          is_lexeme: symbol.is_lexeme,
          entry: fragment.entry,
          exit: fragment.exit
        }
      );
    }

    let automaton = Automaton::new(self.states, infos, dispatch);

    let compile_time = clock.now().duration_since(start);
    log_info!(
      self.sink,
      None,
      "compiled {} symbols into {} states in {:?}",
      symbols.len(),
      automaton.state_count(),
      compile_time
    );
    #[cfg(feature = "DEBUG")]
    log_debug!(self.sink, None, "automaton:\n{}", automaton);

    Ok(automaton)
  }

  /// The fragment of `id`, compiling it on first use.
  pub fn compile_symbol(&mut self, id: SymbolId) -> Result<Fragment, CompileError> {
    if let Some(fragment) = self.fragments[id.index()] {
      return Ok(fragment);
    }

    let entry    = self.push_placeholder()?;
    let exit     = self.push(State::Exit { symbol: id, accept: None })?;
    let fragment = Fragment { entry, exit };
    self.fragments[id.index()] = Some(fragment);

    let symbol = &self.symbols[id];
    let expression = symbol.expression.as_ref().ok_or_else(|| symbol.undefined())?;

    let body = self.compile_node(expression, exit, None)?;
    self.patch(entry, State::Control { success: body, failure: None });
    Ok(fragment)
  }

  /// Compiles `expression` to continue at `success`, returning its entry state.
  fn compile_node(&mut self, expression: &'a Expression, success: StateId, on_failure: Option<StateId>)
    -> Result<StateId, CompileError>
  {
    match expression {

      Expression::Range(range) => {
        self.push(State::Test { range: *range, success, failure: on_failure })
      }

      Expression::Sequence(left, right) => {
        let right_entry = self.compile_node(right, success, None)?;
        self.compile_node(left, right_entry, on_failure)
      }

      Expression::Branch(left, right) => {
        let join        = self.push(State::Control { success, failure: None })?;
        let right_entry = self.compile_node(right, join, on_failure)?;
        self.compile_node(left, join, Some(right_entry))
      }

      Expression::Loop(body) => {
        let exit       = self.push(State::Control { success, failure: None })?;
        let head       = self.push_placeholder()?;
        let body_entry = self.compile_node(body, head, None)?;
        self.patch(head, State::Control { success: body_entry, failure: Some(exit) });
        self.guard(head, on_failure)
      }

      Expression::Reference(target) => {
        let callee = self.compile_symbol(*target)?.entry;
        let call   = self.push(State::Call { callee, ret: success })?;
        self.guard(call, on_failure)
      }

    }
  }

  /// Puts a `Control` carrying `on_failure` in front of `entry`, if there is a failure continuation.
  fn guard(&mut self, entry: StateId, on_failure: Option<StateId>) -> Result<StateId, CompileError> {
    match on_failure {
      Some(_) => self.push(State::Control { success: entry, failure: on_failure }),
      None    => Ok(entry),
    }
  }

  // region State allocation

  fn push(&mut self, state: State) -> Result<StateId, CompileError> {
    let index = self.states.len();
    if index >= self.options.max_states || index >= u32::MAX as usize {
      return Err(CompileError::AllocationFailure { states: index });
    }
    self.states
        .try_reserve(1)
        .map_err(|_| CompileError::AllocationFailure { states: index })?;
    self.states.push(state);
    Ok(StateId(index as u32))
  }

  /// A `Control` that loops to itself until it is patched.
  fn push_placeholder(&mut self) -> Result<StateId, CompileError> {
    let id = StateId(self.states.len() as u32);
    self.push(State::Control { success: id, failure: None })
  }

  fn patch(&mut self, id: StateId, state: State) {
    self.states[id.index()] = state;
  }

  // endregion


  /// Fragments nothing refers to can never be matched.
  fn warn_unreferenced(&self) {
    let mut referenced = vec![false; self.symbols.len()];
    for (id, symbol) in self.symbols.iter() {
      if let Some(expression) = &symbol.expression {
        expression.for_each_reference(&mut |target| {
          if target != id {
            referenced[target.index()] = true;
          }
        });
      }
    }

    for (id, symbol) in self.symbols.iter() {
      if !symbol.is_lexeme && !referenced[id.index()] {
        log_warning!(
          self.sink,
          Some(symbol.location),
          "fragment symbol '{}' is never referenced",
          symbol.name
        );
      }
    }
  }

}


#[cfg(test)]
mod test {
  use super::*;
  use crate::debug::{LogLevel, NullSink};
  use crate::debug::test::RecordingSink;
  use crate::grammar::{Location, Parser};

  fn compile(source: &str, options: &Options) -> Result<Automaton, CompileError> {
    let symbols = Parser::new(source.as_bytes(), options, &NullSink).parse()?;
    Compiler::new(&symbols, options, &NullSink).compile()
  }

  #[test]
  fn literal_is_a_chain_of_tests(){
    let automaton = compile("@a \"xy\";", &Options::default()).unwrap();
    let info = automaton.symbol(SymbolId(0));

    // entry, exit, test x, test y, accept
    assert_eq!(automaton.state_count(), 5);
    let first = match automaton.state(info.entry) {
      State::Control { success, failure: None } => *success,
      other => panic!("unexpected entry {:?}", other),
    };
    let second = match automaton.state(first) {
      State::Test { range, success, failure: None } if range.contains(b'x') => *success,
      other => panic!("unexpected state {:?}", other),
    };
    match automaton.state(second) {
      State::Test { range, success, .. } if range.contains(b'y') => assert_eq!(*success, info.exit),
      other => panic!("unexpected state {:?}", other),
    }
    assert!(matches!(automaton.state(info.exit), State::Exit { accept: Some(_), .. }));
  }

  #[test]
  fn references_share_one_fragment(){
    let automaton = compile("d [0-9]; @a $d $d $d; @b $d;", &Options::default()).unwrap();
    let digit = automaton.find_symbol("d").unwrap();
    let entry = automaton.symbol(digit).entry;

    let calls: Vec<&State> = automaton
      .states()
      .iter()
      .filter(|state| matches!(state, State::Call { callee, .. } if *callee == entry))
      .collect();
    assert_eq!(calls.len(), 4);

    let tests = automaton.states().iter().filter(|state| matches!(state, State::Test { .. })).count();
    assert_eq!(tests, 1);
  }

  #[test]
  fn recursion_terminates_with_linear_size(){
    let automaton = compile("@p \"(\" $p \")\" | \"x\";", &Options::default()).unwrap();
    assert!(automaton.state_count() < 16);

    // Mutual recursion through a fragment.
    let automaton = compile("@a \"a\" $b | \"\\.\"; b \"b\" $a;", &Options::default()).unwrap();
    assert_eq!(automaton.dispatch().len(), 1);
  }

  #[test]
  fn dispatch_follows_declaration_order(){
    let automaton = compile("@kw \"if\"; frag \"_\"; @id [a-z] $id | [a-z] $frag;", &Options::default()).unwrap();
    let order: Vec<&str> = automaton
      .dispatch()
      .iter()
      .map(|entry| automaton.symbol_name(entry.symbol))
      .collect();
    assert_eq!(order, vec!["kw", "id"]);

    let frag = automaton.symbol(automaton.find_symbol("frag").unwrap());
    assert!(matches!(automaton.state(frag.exit), State::Exit { accept: None, .. }));
  }

  #[test]
  fn state_limit_is_enforced(){
    let options = Options::new("s=4").unwrap();
    assert!(matches!(
      compile("@a \"xyz\";", &options),
      Err(CompileError::AllocationFailure { states: 4 })
    ));
  }

  #[test]
  fn warns_about_unreferenced_fragments(){
    let options = Options::default();
    let symbols = Parser::new(b"@a \"x\" $used; used \"u\"; unused \"n\" $unused;", &options, &NullSink)
      .parse()
      .unwrap();
    let sink = RecordingSink::default();
    Compiler::new(&symbols, &options, &sink).compile().unwrap();

    assert!(sink.contains(LogLevel::Warning, "'unused'"));
    assert!(!sink.contains(LogLevel::Warning, "'used'"));
    assert!(sink.contains(LogLevel::Info, "compiled 3 symbols"));
  }

  #[test]
  fn incomplete_table_names_the_missing_symbol(){
    let mut symbols = SymbolTable::new();
    let at = Location { offset: 6, line: 1, column: 7 };
    let a  = symbols.get_or_create(b"a", Location::default());
    let b  = symbols.get_or_create(b"b", at);
    symbols.define(a, Expression::Reference(b), true, Location::default()).unwrap();

    match Compiler::new(&symbols, &Options::default(), &NullSink).compile() {
      Err(CompileError::UndefinedSymbol { name, location }) => {
        assert_eq!(name, "b");
        assert_eq!(location, at);
      }
      other => panic!("expected an undefined symbol, got {:?}", other),
    }
  }

}
