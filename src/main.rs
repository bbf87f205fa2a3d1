/*!
  Command line driver: compiles a grammar file and prints the tokens of an input file.

  ```text
  lexsym [-v...] [-o OPTIONS] GRAMMAR [INPUT]
  ```

  Each token is printed on its own line as `offset length symbol "text"`.
*/

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use structopt::StructOpt;

use lexsym::{compile_with, log_error, LogLevel, Options, StderrSink, ToDiagnostic, Tokens};

#[derive(Debug, StructOpt)]
#[structopt(name = "lexsym", about = "Tokenizes input with a regex symbol grammar.")]
struct Arguments {
  #[structopt(name = "GRAMMAR", parse(from_os_str))]
  /// The symbol grammar file
  grammar: PathBuf,

  #[structopt(name = "INPUT", parse(from_os_str))]
  /// The file to tokenize; standard input if absent
  input: Option<PathBuf>,

  #[structopt(short, long, default_value = "")]
  /// Option string, e.g. "d=64;n=32;l=info"
  options: String,

  #[structopt(short, long, parse(from_occurrences))]
  /// Log more; repeat for more detail
  verbose: u8,
}

fn main() {
  let arguments = Arguments::from_args();
  if let Err(message) = run(&arguments) {
    // Errors are the highest level, so no option string can silence them.
    log_error!(&StderrSink::new(LogLevel::Error), None, "{}", message);
    process::exit(1);
  }
}

fn run(arguments: &Arguments) -> Result<(), String> {
  let mut options = Options::new(&arguments.options).map_err(|error| error.to_string())?;
  options.log_level = match arguments.verbose {
    0 => options.log_level,
    1 => LogLevel::Info,
    _ => LogLevel::Debug,
  };
  let sink = StderrSink::new(options.log_level);

  let grammar_name = arguments.grammar.display().to_string();
  let source = fs::read(&arguments.grammar)
    .map_err(|error| format!("could not read {}: {}", grammar_name, error))?;

  let automaton = match compile_with(&source, &options, &sink) {
    Ok(automaton) => automaton,
    Err(error) => {
      let file   = SimpleFile::new(grammar_name.as_str(), String::from_utf8_lossy(&source));
      let writer = StandardStream::stderr(ColorChoice::Auto);
      let config = term::Config::default();
      term::emit(&mut writer.lock(), &config, &file, &error.to_diagnostic(()))
        .map_err(|emit_error| format!("{} ({})", error, emit_error))?;
      return Err(format!("could not compile {}", grammar_name));
    }
  };

  let input = match &arguments.input {
    Some(path) => {
      fs::read(path).map_err(|error| format!("could not read {}: {}", path.display(), error))?
    }
    None => {
      let mut buffer = Vec::new();
      io::stdin()
        .read_to_end(&mut buffer)
        .map_err(|error| format!("could not read standard input: {}", error))?;
      buffer
    }
  };

  let stdout = io::stdout();
  let mut out = stdout.lock();
  for lexeme in Tokens::new(&automaton, &input, &options) {
    let lexeme = lexeme.map_err(|error| error.to_string())?;
    writeln!(
      out,
      "{} {} {} {:?}",
      lexeme.span.start,
      lexeme.span.len(),
      automaton.symbol_name(lexeme.symbol),
      String::from_utf8_lossy(lexeme.text(&input))
    ).map_err(|error| error.to_string())?;
  }

  Ok(())
}
