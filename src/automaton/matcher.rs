/*!
  Runs an `Automaton` against an input buffer and reports the longest token at its start.

  Each dispatch entry is simulated as a set of threads advanced over the input in lock step, one
  byte at a time. A thread is a state plus a call stack. Call stacks are interned as frames keyed
  by `(return state, parent frame)`, so two threads with equal stacks carry the same `FrameId` and
  the per-step de-duplication on `(state, frame)` is exact. There is no backtracking: the work per
  input byte is bounded by the number of distinct threads.

  Between entries the longest accepted prefix wins, and on equal lengths the earlier entry, which is
  the earlier declared lexeme.
*/

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

use crate::error::MatchError;
use crate::grammar::SymbolId;
use crate::options::Options;
use super::{Automaton, State, StateId};


#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MatchResult {
  /// `length` bytes at the start of the input form a `symbol` token.
  Accept { symbol: SymbolId, length: usize },
  NoMatch,
  /// Nothing matched yet, but some lexeme could still match with more input than the given length.
  Incomplete(usize),
}

impl Display for MatchResult {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      MatchResult::Accept { symbol, length } => write!(f, "accept {} length {}", symbol, length),
      MatchResult::NoMatch                   => write!(f, "no match"),
      MatchResult::Incomplete(length)        => write!(f, "incomplete after {} bytes", length),
    }
  }
}


#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
struct FrameId(u32);

#[derive(Copy, Clone, Debug)]
struct Frame {
  ret    : StateId,         //< Where the caller resumes
  parent : Option<FrameId>, //< The caller's own frame
  depth  : usize,           //< Number of frames on the stack, this one included
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
struct Thread {
  state : StateId,
  frame : Option<FrameId>,
}

/// What one dispatch entry produced.
struct EntryOutcome {
  accepted : Option<(SymbolId, usize)>,
  pending  : bool, //< Threads were still waiting for input when it ran out
}


/// Scratch memory for scanning. Keep one per thread and reuse it between scans.
pub struct Matcher {
  max_call_depth : usize,
  frames         : Vec<Frame>,
  frame_index    : HashMap<(StateId, Option<FrameId>), FrameId>,
  current        : Vec<Thread>, //< Threads waiting on a `Test` at the current offset
  next           : Vec<Thread>, //< Threads waiting on a `Test` at the next offset
  visited        : HashSet<Thread>,
  work           : Vec<Thread>, //< Pending epsilon moves
}

impl Matcher {

  pub fn new(options: &Options) -> Self {
    Matcher {
      max_call_depth: options.max_call_depth,
      frames: Vec::new(),
      frame_index: HashMap::new(),
      current: Vec::new(),
      next: Vec::new(),
      visited: HashSet::new(),
      work: Vec::new()
    }
  }

  /// Clears all per-scan state, keeping allocations.
  pub fn reset(&mut self) {
    self.frames.clear();
    self.frame_index.clear();
    self.current.clear();
    self.next.clear();
    self.visited.clear();
    self.work.clear();
  }

  /// The best token at the start of `input`.
  pub fn scan(&mut self, automaton: &Automaton, input: &[u8]) -> Result<MatchResult, MatchError> {
    self.reset();

    let mut best: Option<(SymbolId, usize)> = None;
    let mut pending = false;
    for entry in automaton.dispatch() {
      let outcome = self.run_entry(automaton, entry.entry, input)?;
      if let Some((symbol, length)) = outcome.accepted {
        if best.map_or(true, |(_, best_length)| length > best_length) {
          best = Some((symbol, length));
        }
      }
      pending |= outcome.pending;
    }

    Ok(
      match best {
        Some((symbol, length)) => MatchResult::Accept { symbol, length },
        None if pending        => MatchResult::Incomplete(input.len()),
        None                   => MatchResult::NoMatch,
      }
    )
  }

  fn run_entry(&mut self, automaton: &Automaton, entry: StateId, input: &[u8])
    -> Result<EntryOutcome, MatchError>
  {
    let mut accepted = None;
    self.current.clear();
    self.next.clear();
    self.visited.clear();

    self.add_thread(automaton, Thread { state: entry, frame: None }, 0, &mut accepted)?;
    std::mem::swap(&mut self.current, &mut self.next);

    let mut offset = 0;
    loop {
      if self.current.is_empty() {
        return Ok(EntryOutcome { accepted, pending: false });
      }
      if offset == input.len() {
        return Ok(EntryOutcome { accepted, pending: true });
      }

      let byte = input[offset];
      self.visited.clear();
      let mut current = std::mem::take(&mut self.current);
      for thread in current.drain(..) {
        if let State::Test { range, success, .. } = automaton.state(thread.state) {
          if range.contains(byte) {
            let moved = Thread { state: *success, frame: thread.frame };
            self.add_thread(automaton, moved, offset + 1, &mut accepted)?;
          }
        }
      }
      self.current = current;
      std::mem::swap(&mut self.current, &mut self.next);
      offset += 1;
    }
  }

  /// Follows every move from `start` that consumes no input. Threads that end on a `Test` are
  /// queued in `self.next`.
  fn add_thread(
    &mut self,
    automaton : &Automaton,
    start     : Thread,
    offset    : usize,
    accepted  : &mut Option<(SymbolId, usize)>
  ) -> Result<(), MatchError>
  {
    self.work.push(start);
    while let Some(thread) = self.work.pop() {
      if !self.visited.insert(thread) {
        continue;
      }

      match *automaton.state(thread.state) {

        State::Test { failure, .. } => {
          self.next.push(thread);
          if let Some(failure) = failure {
            self.work.push(Thread { state: failure, ..thread });
          }
        }

        State::Control { success, failure } => {
          if let Some(failure) = failure {
            self.work.push(Thread { state: failure, ..thread });
          }
          self.work.push(Thread { state: success, ..thread });
        }

        State::Call { callee, ret } => {
          let frame = self.push_frame(ret, thread.frame, offset)?;
          self.work.push(Thread { state: callee, frame: Some(frame) });
        }

        State::Exit { accept, .. } => {
          match (thread.frame, accept) {
            (Some(frame), _) => {
              let Frame { ret, parent, .. } = self.frames[frame.0 as usize];
              self.work.push(Thread { state: ret, frame: parent });
            }
            (None, Some(accept)) => {
              self.work.push(Thread { state: accept, frame: None });
            }
            (None, None) => {
              self.work.clear();
              return Err(MatchError::CallStackUnderflow { state: thread.state });
            }
          }
        }

        State::Accept { symbol } => {
          if offset > accepted.map_or(0, |(_, length)| length) {
            *accepted = Some((symbol, offset));
          }
        }

      }
    }
    Ok(())
  }

  /// The frame for returning to `ret` with `parent` beneath it.
  fn push_frame(&mut self, ret: StateId, parent: Option<FrameId>, offset: usize)
    -> Result<FrameId, MatchError>
  {
    if let Some(frame) = self.frame_index.get(&(ret, parent)) {
      return Ok(*frame);
    }

    let depth = parent.map_or(0, |parent| self.frames[parent.0 as usize].depth) + 1;
    if depth > self.max_call_depth {
      self.work.clear();
      return Err(MatchError::CallStackOverflow { depth: self.max_call_depth, offset });
    }

    let frame = FrameId(self.frames.len() as u32);
    self.frames.push(Frame { ret, parent, depth });
    self.frame_index.insert((ret, parent), frame);
    Ok(frame)
  }

}


#[cfg(test)]
mod test {
  use super::*;
  use crate::debug::NullSink;
  use crate::error::CompileError;
  use crate::grammar::Parser;
  use crate::automaton::Compiler;

  fn compile(source: &str) -> Automaton {
    build(source, &Options::default()).unwrap()
  }

  fn build(source: &str, options: &Options) -> Result<Automaton, CompileError> {
    let symbols = Parser::new(source.as_bytes(), options, &NullSink).parse()?;
    Compiler::new(&symbols, options, &NullSink).compile()
  }

  fn scan(automaton: &Automaton, input: &str) -> Result<MatchResult, MatchError> {
    Matcher::new(&Options::default()).scan(automaton, input.as_bytes())
  }

  fn accept(automaton: &Automaton, name: &str, length: usize) -> MatchResult {
    MatchResult::Accept { symbol: automaton.find_symbol(name).unwrap(), length }
  }

  #[test]
  fn loop_gives_back_for_suffix(){
    let automaton = compile("@num [0-9]*\"0\"; @ws \" \"*;");
    assert_eq!(scan(&automaton, "1230 "), Ok(accept(&automaton, "num", 4)));
    assert_eq!(scan(&automaton, " "), Ok(accept(&automaton, "ws", 1)));
    assert_eq!(scan(&automaton, "x"), Ok(MatchResult::NoMatch));
  }

  #[test]
  fn longest_match_wins(){
    let automaton = compile("@short \"ab\"; @long \"abc\";");
    assert_eq!(scan(&automaton, "abcd"), Ok(accept(&automaton, "long", 3)));

    let automaton = compile("@long \"abc\"; @short \"ab\";");
    assert_eq!(scan(&automaton, "abd"), Ok(accept(&automaton, "short", 2)));
  }

  #[test]
  fn ties_go_to_earlier_lexeme(){
    let automaton = compile("@kw \"if\"; @id [a-z] [a-z]*;");
    assert_eq!(scan(&automaton, "if "), Ok(accept(&automaton, "kw", 2)));
    assert_eq!(scan(&automaton, "iff"), Ok(accept(&automaton, "id", 3)));
  }

  #[test]
  fn branches_start_at_the_same_offset(){
    let automaton = compile("@a \"ab\" | \"cd\";");
    assert_eq!(scan(&automaton, "acd"), Ok(MatchResult::NoMatch));
    assert_eq!(scan(&automaton, "cd"), Ok(accept(&automaton, "a", 2)));
  }

  #[test]
  fn fragments_are_not_dispatched(){
    let automaton = compile("digit [0-9]; @num $digit $digit*;");
    assert_eq!(scan(&automaton, "42x"), Ok(accept(&automaton, "num", 2)));
    assert_eq!(automaton.dispatch().len(), 1);
  }

  #[test]
  fn lexemes_can_be_referenced(){
    let automaton = compile("@digit [0-9]; @pair $digit \",\" $digit;");
    assert_eq!(scan(&automaton, "1,2"), Ok(accept(&automaton, "pair", 3)));
    assert_eq!(scan(&automaton, "1;2"), Ok(accept(&automaton, "digit", 1)));
  }

  #[test]
  fn empty_matches_are_not_tokens(){
    let automaton = compile("@ws \" \"*;");
    assert_eq!(scan(&automaton, "x"), Ok(MatchResult::NoMatch));
    assert_eq!(scan(&automaton, ""), Ok(MatchResult::Incomplete(0)));
  }

  #[test]
  fn truncated_input_is_incomplete(){
    let automaton = compile("@kw \"abc\";");
    assert_eq!(scan(&automaton, "ab"), Ok(MatchResult::Incomplete(2)));
    assert_eq!(scan(&automaton, "abx"), Ok(MatchResult::NoMatch));
  }

  #[test]
  fn recursion_within_depth(){
    let automaton = compile("@p \"(\" $p \")\" | \"x\";");
    assert_eq!(scan(&automaton, "((x))!"), Ok(accept(&automaton, "p", 5)));
    assert_eq!(scan(&automaton, "((x)!"), Ok(MatchResult::NoMatch));
  }

  #[test]
  fn recursion_beyond_depth_overflows(){
    let options   = Options::new("d=3").unwrap();
    let automaton = build("@p \"(\" $p \")\" | \"x\";", &options).unwrap();
    let mut matcher = Matcher::new(&options);

    assert_eq!(
      matcher.scan(&automaton, b"(((x)))"),
      Ok(MatchResult::Accept { symbol: SymbolId(0), length: 7 })
    );
    assert!(matches!(
      matcher.scan(&automaton, b"((((x))))"),
      Err(MatchError::CallStackOverflow { depth: 3, offset: 4 })
    ));
  }

  #[test]
  fn mutual_recursion_counts_every_call(){
    let options   = Options::new("d=4").unwrap();
    let automaton = build("@a \"a\" $b | \".\"; b \"b\" $a;", &options).unwrap();
    let mut matcher = Matcher::new(&options);

    assert_eq!(matcher.scan(&automaton, b"."), Ok(accept(&automaton, "a", 1)));
    assert_eq!(matcher.scan(&automaton, b"abab."), Ok(accept(&automaton, "a", 5)));
    assert_eq!(matcher.scan(&automaton, b"abab"), Ok(MatchResult::Incomplete(4)));
    assert!(matches!(
      matcher.scan(&automaton, b"ababab."),
      Err(MatchError::CallStackOverflow { depth: 4, offset: 5 })
    ));
  }

  #[test]
  fn left_recursion_overflows(){
    let automaton = compile("@l $l \"x\" | \"y\";");
    assert!(matches!(scan(&automaton, "yx"), Err(MatchError::CallStackOverflow { offset: 0, .. })));
  }

  #[test]
  fn matcher_is_reusable(){
    let automaton = compile("@a \"a\"*; @b \"b\";");
    let mut matcher = Matcher::new(&Options::default());
    assert_eq!(matcher.scan(&automaton, b"aab"), Ok(accept(&automaton, "a", 2)));
    assert_eq!(matcher.scan(&automaton, b"b"), Ok(accept(&automaton, "b", 1)));
    assert_eq!(matcher.scan(&automaton, b"aaaa"), Ok(accept(&automaton, "a", 4)));
  }

}
