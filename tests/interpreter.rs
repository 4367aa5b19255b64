//! Library-level integration tests: full source strings through the
//! lex → parse → interpret pipeline, checked against the error reporter's
//! latches. Scenarios that depend on what actually reaches stdout (§8's
//! end-to-end examples) are covered at the process boundary in
//! `tests/cli.rs`, where capturing output doesn't require reaching into
//! the interpreter's internals.

use oxente::error::ErrorReporter;
use oxente::interpreter::Interpreter;
use oxente::lexer::Scanner;
use oxente::parser::Parser;

fn run(source: &str) -> ErrorReporter {
    let mut reporter = ErrorReporter::new();
    let tokens = Scanner::new(source).scan_tokens(&mut reporter);
    let stmts = Parser::new(tokens).parse(&mut reporter);
    if !reporter.had_error() {
        Interpreter::new().interpret(&stmts, &mut reporter);
    }
    reporter
}

#[test]
fn empty_program_has_no_errors() {
    let reporter = run("");
    assert!(!reporter.had_error());
    assert!(!reporter.had_runtime_error());
}

#[test]
fn well_formed_program_runs_without_errors() {
    let reporter = run("fun f(n){ if (n<=1) return 1; return n*f(n-1); } print f(5);");
    assert!(!reporter.had_error());
    assert!(!reporter.had_runtime_error());
}

#[test]
fn missing_left_hand_operand_is_a_parse_error_and_recovers() {
    let reporter = run("== 1; print \"after\";");
    assert!(reporter.had_error());
    assert!(!reporter.had_runtime_error(), "a known parse error must suppress execution entirely");
}

#[test]
fn undefined_variable_reference_is_a_runtime_error() {
    let reporter = run("print undefined_name;");
    assert!(!reporter.had_error());
    assert!(reporter.had_runtime_error());
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let reporter = run("print 1 / 0;");
    assert!(reporter.had_runtime_error());
}

#[test]
fn a_program_fed_as_one_chunk_or_many_declarations_errors_identically() {
    let whole = run("var a = 1; var b = 2; print a + b;");
    let piecewise = run("var a = 1;\nvar b = 2;\nprint a + b;");
    assert_eq!(whole.had_error(), piecewise.had_error());
    assert_eq!(whole.had_runtime_error(), piecewise.had_runtime_error());
}

#[test]
fn break_outside_any_loop_is_reported_but_does_not_abort_the_program() {
    let reporter = run("break; print \"still runs\";");
    assert!(reporter.had_error());
}

#[test]
fn too_many_call_arguments_is_reported_but_parsing_continues() {
    let args = (0..260).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
    let source = format!("fun f() {{}} f({args});");
    let reporter = run(&source);
    assert!(reporter.had_error());
}
