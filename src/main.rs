//! The Oxente language driver.
//!
//! This is the command-line entry point: it dispatches between REPL and
//! file modes and maps the interpreter's error latches onto exit codes.
//!
//! # Usage
//!
//! ```text
//! oxente            # REPL
//! oxente script.ox   # run a file
//! ```
//!
//! # Architecture
//!
//! 1. **Lexing** ([`oxente::lexer`]) — source text to tokens.
//! 2. **Parsing** ([`oxente::parser`]) — tokens to statements, with
//!    panic-mode recovery.
//! 3. **Evaluation** ([`oxente::interpreter`]) — tree-walking execution
//!    against lexically-scoped environments.
//!
//! # Error reporting
//!
//! Diagnostics go to standard error through [`oxente::error::ErrorReporter`]
//! in the exact one-line shapes documented there; this binary only reads
//! the reporter's latches back to choose an exit code.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use oxente::error::ErrorReporter;
use oxente::interpreter::Interpreter;
use oxente::lexer::Scanner;
use oxente::parser::Parser;

const EXIT_USAGE: u8 = 64;
const EXIT_DATA_ERROR: u8 = 65;
const EXIT_SOFTWARE: u8 = 70;
const EXIT_NO_INPUT: u8 = 74;

/// Command-line interface for the Oxente interpreter.
#[derive(ClapParser)]
#[command(name = "oxente")]
#[command(about = "The Oxente programming language", long_about = None)]
struct Cli {
    /// The script to run. Omit for a REPL; more than one is a usage error.
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let code = match cli.args.as_slice() {
        [] => run_repl(),
        [script] => run_file(script),
        _ => {
            eprintln!("Usage: oxente [script]");
            EXIT_USAGE
        }
    };
    ExitCode::from(code)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

/// Reads the file at `path` as UTF-8 and runs it end-to-end, returning the
/// exit code `spec.md` §6 assigns: 74 on read failure, 65 on a scan/parse
/// error, 70 on a runtime error, 0 otherwise.
fn run_file(path: &str) -> u8 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error reading '{path}': {err}");
            return EXIT_NO_INPUT;
        }
    };

    let mut reporter = ErrorReporter::new();
    let mut interpreter = Interpreter::new();
    run(&source, &mut interpreter, &mut reporter);

    if reporter.had_error() {
        EXIT_DATA_ERROR
    } else if reporter.had_runtime_error() {
        EXIT_SOFTWARE
    } else {
        0
    }
}

/// Reads and evaluates one line at a time until EOF. Each line's errors are
/// latched but never end the session; the latches are cleared before the
/// next prompt.
fn run_repl() -> u8 {
    let mut interpreter = Interpreter::new();
    let mut reporter = ErrorReporter::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return 0;
        }

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line).unwrap_or(0);
        if bytes_read == 0 {
            println!("\nExiting.");
            return 0;
        }

        run(&line, &mut interpreter, &mut reporter);
        reporter.reset();
    }
}

/// Scans, parses, and — only if neither phase reported an error —
/// interprets `source` against `interpreter`.
fn run(source: &str, interpreter: &mut Interpreter, reporter: &mut ErrorReporter) {
    let tokens = Scanner::new(source).scan_tokens(reporter);
    let stmts = Parser::new(tokens).parse(reporter);

    if reporter.had_error() {
        return;
    }
    interpreter.interpret(&stmts, reporter);
}
