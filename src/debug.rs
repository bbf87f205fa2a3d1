/*!
  Leveled diagnostic output.

  The core never owns a logger. Everything that wants to report progress takes a `&dyn LogSink`
  and emits through the `log_*!` macros below, which skip formatting entirely when the sink is not
  interested in the level. `NullSink` discards everything; `StderrSink` is what the command line
  driver uses.
*/

use std::fmt::{Display, Formatter};
use std::io::Write;

use crate::grammar::Location;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum LogLevel {
  Debug,
  Info,
  Warning,
  Error,
}

impl LogLevel {

  pub fn from_name(name: &str) -> Option<LogLevel> {
    match name {
      "debug"   => Some(LogLevel::Debug),
      "info"    => Some(LogLevel::Info),
      "warning" => Some(LogLevel::Warning),
      "error"   => Some(LogLevel::Error),
      _         => None,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      LogLevel::Debug   => "debug",
      LogLevel::Info    => "info",
      LogLevel::Warning => "warning",
      LogLevel::Error   => "error",
    }
  }

}

impl Display for LogLevel {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.pad(self.name())
  }
}


/// Receives diagnostic messages. Implementations must not fail; whatever they do with a message is
/// invisible to the caller.
pub trait LogSink {
  fn emit(&self, level: LogLevel, message: &str, location: Option<Location>);

  /// Whether a message at `level` would be used at all. Callers use this to avoid building
  /// messages nobody reads.
  fn enabled(&self, _level: LogLevel) -> bool {
    true
  }
}

/// Discards every message.
#[derive(Copy, Clone, Default, Debug)]
pub struct NullSink;

impl LogSink for NullSink {
  fn emit(&self, _level: LogLevel, _message: &str, _location: Option<Location>) {}

  fn enabled(&self, _level: LogLevel) -> bool {
    false
  }
}

/// Writes messages at or above `min_level` to standard error, one per line.
#[derive(Copy, Clone, Debug)]
pub struct StderrSink {
  pub min_level: LogLevel,
}

impl StderrSink {
  pub fn new(min_level: LogLevel) -> Self {
    StderrSink { min_level }
  }
}

impl LogSink for StderrSink {
  fn emit(&self, level: LogLevel, message: &str, location: Option<Location>) {
    if !self.enabled(level) {
      return;
    }
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    // A failed write to stderr has nowhere to be reported.
    let _ = match location {
      Some(location) => writeln!(handle, "[{:>7}] {}: {}", level, location, message),
      None           => writeln!(handle, "[{:>7}] {}", level, message),
    };
  }

  fn enabled(&self, level: LogLevel) -> bool {
    level >= self.min_level
  }
}


#[macro_export]
macro_rules! log_message {
  ($sink:expr, $level:expr, $location:expr, $($args:tt)*) => {{
    let sink: &dyn $crate::debug::LogSink = $sink;
    if sink.enabled($level) {
      sink.emit($level, &format!($($args)*), $location);
    }
  }}
}

#[macro_export]
macro_rules! log_debug {
  ($sink:expr, $location:expr, $($args:tt)*) => {
    $crate::log_message!($sink, $crate::debug::LogLevel::Debug, $location, $($args)*)
  }
}

#[macro_export]
macro_rules! log_info {
  ($sink:expr, $location:expr, $($args:tt)*) => {
    $crate::log_message!($sink, $crate::debug::LogLevel::Info, $location, $($args)*)
  }
}

#[macro_export]
macro_rules! log_warning {
  ($sink:expr, $location:expr, $($args:tt)*) => {
    $crate::log_message!($sink, $crate::debug::LogLevel::Warning, $location, $($args)*)
  }
}

#[macro_export]
macro_rules! log_error {
  ($sink:expr, $location:expr, $($args:tt)*) => {
    $crate::log_message!($sink, $crate::debug::LogLevel::Error, $location, $($args)*)
  }
}


#[cfg(test)]
pub(crate) mod test {
  use super::*;
  use std::cell::RefCell;

  /// Remembers everything it is given. Shared by the tests of other modules.
  #[derive(Default)]
  pub(crate) struct RecordingSink {
    pub messages: RefCell<Vec<(LogLevel, String)>>,
  }

  impl RecordingSink {
    pub fn contains(&self, level: LogLevel, fragment: &str) -> bool {
      self.messages
          .borrow()
          .iter()
          .any(|(l, message)| *l == level && message.contains(fragment))
    }
  }

  impl LogSink for RecordingSink {
    fn emit(&self, level: LogLevel, message: &str, _location: Option<Location>) {
      self.messages.borrow_mut().push((level, message.to_string()));
    }
  }

  #[test]
  fn level_order(){
    assert!(LogLevel::Debug < LogLevel::Info);
    assert!(LogLevel::Warning < LogLevel::Error);
    assert_eq!(LogLevel::from_name("warning"), Some(LogLevel::Warning));
    assert_eq!(LogLevel::from_name("loud"), None);
  }

  #[test]
  fn stderr_sink_filters(){
    let sink = StderrSink::new(LogLevel::Warning);
    assert!(!sink.enabled(LogLevel::Info));
    assert!(sink.enabled(LogLevel::Error));
  }

  #[test]
  fn macros_skip_disabled_sinks(){
    let sink = RecordingSink::default();
    log_info!(&sink, None, "{} symbols", 3);
    log_debug!(&NullSink, None, "never {}", "formatted");
    assert!(sink.contains(LogLevel::Info, "3 symbols"));
  }

  #[test]
  fn errors_reach_the_strictest_sink(){
    let sink = RecordingSink::default();
    log_error!(&sink, None, "could not read {}", "g.sym");
    assert!(sink.contains(LogLevel::Error, "could not read g.sym"));
    assert!(StderrSink::new(LogLevel::Error).enabled(LogLevel::Error));
  }

}
