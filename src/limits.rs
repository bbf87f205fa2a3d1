/**
  Constants specifying limits.

  These are the defaults used by `Options`. Each of them can be overridden in the option string.
*/

/// Max length in bytes of a symbol name, e.g. the `digit` in `$digit`.
pub const MAX_SYMBOL_NAME_LENGTH: usize = 127;

/// Max nesting of `Call` states a single `Matcher` thread may have pending.
pub const MAX_CALL_DEPTH: usize = 256;

/// Max number of states in one automaton. `StateId` is a `u32`, so this is also a hard ceiling.
pub const MAX_STATES: usize = u32::MAX as usize;
