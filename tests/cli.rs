//! Process-level tests: drive the built `oxente` binary directly and check
//! its exit code and captured stdout/stderr, which is the only place the
//! REPL's prompt, EOF handling, and `spec.md` §6's exit-code table can be
//! observed end-to-end.

use assert_cmd::Command;
use predicates::str::contains;
use std::io::Write;

fn oxente() -> Command {
    Command::cargo_bin("oxente").expect("binary should build")
}

fn script(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp script");
    file.write_all(source.as_bytes()).expect("write script");
    file
}

#[test]
fn prints_arithmetic_result_and_exits_zero() {
    let file = script("print 1 + 2;");
    oxente().arg(file.path()).assert().success().stdout("3\n");
}

#[test]
fn block_shadowing_leaves_outer_binding_intact() {
    let file = script("var a = \"hi\"; { var a = \"bye\"; print a; } print a;");
    oxente().arg(file.path()).assert().success().stdout("bye\nhi\n");
}

#[test]
fn recursive_function_computes_factorial() {
    let file = script("fun f(n){ if (n<=1) return 1; return n*f(n-1); } print f(5);");
    oxente().arg(file.path()).assert().success().stdout("120\n");
}

#[test]
fn closure_keeps_its_own_counter_across_calls() {
    let file = script(
        "fun make(){ var i=0; fun inc(){ i = i + 1; return i;} return inc;} \
         var c=make(); print c(); print c(); print c();",
    );
    oxente().arg(file.path()).assert().success().stdout("1\n2\n3\n");
}

#[test]
fn break_stops_only_the_innermost_loop() {
    let file = script("for (var i=0; i<3; i=i+1) { if (i==2) break; print i; }");
    oxente().arg(file.path()).assert().success().stdout("0\n1\n");
}

#[test]
fn undefined_variable_exits_with_runtime_error_code() {
    let file = script("print undefined_name;");
    oxente()
        .arg(file.path())
        .assert()
        .code(70)
        .stderr(contains("Runtime Error: Undefined variable 'undefined_name'."));
}

#[test]
fn parse_error_exits_with_data_error_code() {
    let file = script("== 1;");
    oxente().arg(file.path()).assert().code(65);
}

#[test]
fn two_or_more_arguments_is_a_usage_error() {
    oxente().args(["one.ox", "two.ox"]).assert().code(64).stderr(contains("Usage:"));
}

#[test]
fn unreadable_file_exits_with_no_input_code() {
    oxente().arg("/nonexistent/path/to/script.ox").assert().code(74);
}

#[test]
fn empty_program_prints_nothing_and_exits_zero() {
    let file = script("");
    oxente().arg(file.path()).assert().success().stdout("");
}

#[test]
fn repl_prints_prompt_and_exits_cleanly_on_eof() {
    oxente()
        .write_stdin("")
        .assert()
        .success()
        .stdout(contains("> "))
        .stdout(contains("\nExiting."));
}

#[test]
fn repl_latches_an_error_but_keeps_accepting_input() {
    oxente()
        .write_stdin("print undefined_name;\nprint 1 + 1;\n")
        .assert()
        .success()
        .stdout(contains("2"))
        .stderr(contains("Runtime Error"));
}
