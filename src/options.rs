/*!
  A data structure that holds the compiler and matcher options. Parsing of the option string is
  also done here.

  An option string is a `;`-separated list of `key=value` pairs, each key a single letter:

  | key | value                                 | default                   |
  |-----|---------------------------------------|---------------------------|
  | `d` | max call depth of the matcher         | `MAX_CALL_DEPTH`          |
  | `n` | max symbol name length                | `MAX_SYMBOL_NAME_LENGTH`  |
  | `s` | max number of automaton states        | `MAX_STATES`              |
  | `l` | `debug`, `info`, `warning` or `error` | `warning`                 |

  Whitespace around pairs is ignored, as is an empty string.
*/

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::debug::LogLevel;
use crate::limits::{MAX_CALL_DEPTH, MAX_STATES, MAX_SYMBOL_NAME_LENGTH};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Options {
  pub max_call_depth         : usize,    //< Deepest nesting of `Call`s a match may reach
  pub max_symbol_name_length : usize,    //< Longest name accepted after `@` or `$`
  pub max_states             : usize,    //< Largest automaton the compiler will build
  pub log_level              : LogLevel, //< Least severe level the command line driver prints
}

impl Default for Options {
  fn default() -> Self {
    Self {
      max_call_depth: MAX_CALL_DEPTH,
      max_symbol_name_length: MAX_SYMBOL_NAME_LENGTH,
      max_states: MAX_STATES,
      log_level: LogLevel::Warning
    }
  }
}

impl Display for Options{
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f,
      "d={};n={};s={};l={}",
      self.max_call_depth,
      self.max_symbol_name_length,
      self.max_states,
      self.log_level,
    )
  }
}


/// The byte index in the option string at which the problem starts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OptionsError {
  UnknownOption(usize),
  InvalidValue(usize),
}

impl Display for OptionsError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      OptionsError::UnknownOption(index) => write!(f, "unknown option at index {}", index),
      OptionsError::InvalidValue(index)  => write!(f, "invalid option value at index {}", index),
    }
  }
}

impl Error for OptionsError {}


impl Options {

  pub fn new(options_string: &str) -> Result<Self, OptionsError> {
    let mut options: Self = Self::default();

    options.parse_options(options_string)?;

    Ok(options)
  }

  /// Applies the pairs in `option_string` on top of the current values.
  pub fn parse_options(&mut self, option_string: &str) -> Result<(), OptionsError> {
    let option_bytes = option_string.as_bytes();

    let mut option_index = 0;
    while option_index < option_bytes.len() {
      let c = option_bytes[option_index];
      match c {

        b' ' | b'\t' | b';' => {
          option_index += 1;
        }

        b'd' => {
          self.max_call_depth = parse_number(option_bytes, &mut option_index)?;
        }

        b'n' => {
          self.max_symbol_name_length = parse_number(option_bytes, &mut option_index)?;
        }

        b's' => {
          self.max_states = parse_number(option_bytes, &mut option_index)?;
        }

        b'l' => {
          let start = option_index;
          let value = parse_value(option_bytes, &mut option_index)?;
          self.log_level = LogLevel::from_name(value).ok_or(OptionsError::InvalidValue(start))?;
        }

        _ => {
          return Err(OptionsError::UnknownOption(option_index));
        }

      } // end match on option character
    }

    Ok(())
  }

}

/// Reads the `=value` part following the key at `*option_index`, leaving the index after the value.
fn parse_value<'a>(option_bytes: &'a [u8], option_index: &mut usize) -> Result<&'a str, OptionsError> {
  let key_index = *option_index;
  if option_bytes.get(key_index + 1) != Some(&b'=') {
    return Err(OptionsError::InvalidValue(key_index));
  }

  let start = key_index + 2;
  let end   = option_bytes[start..]
                .iter()
                .position(|&b| b == b';')
                .map_or(option_bytes.len(), |length| start + length);
  *option_index = end;

  // The option string came from a `&str` and `;` is ASCII, so the slice is valid UTF-8.
  std::str::from_utf8(&option_bytes[start..end])
    .map(str::trim)
    .map_err(|_| OptionsError::InvalidValue(key_index))
}

fn parse_number(option_bytes: &[u8], option_index: &mut usize) -> Result<usize, OptionsError> {
  let key_index = *option_index;
  let value     = parse_value(option_bytes, option_index)?;
  match value.parse::<usize>() {
    Ok(number) if number > 0 => Ok(number),
    _                        => Err(OptionsError::InvalidValue(key_index)),
  }
}
