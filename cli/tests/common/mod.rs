//! Helpers shared by the `pebble` binary tests.

#![allow(dead_code)]

use std::io::Write;
use std::process::Output;

use assert_cmd::Command;
use expect_test::Expect;

/// The `pebble` binary under test.
pub fn pebble() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pebble"))
}

/// A `.pb` source file that lives until the handle is dropped.
pub fn temp_file(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".pb").tempfile().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

/// Run `pebble` with `args`, optionally feeding `stdin`, and capture everything.
pub fn run_pebble(args: &[&str], stdin: Option<&str>) -> Output {
    let mut cmd = pebble();
    cmd.args(args);
    if let Some(input) = stdin {
        cmd.write_stdin(input);
    }
    cmd.output().unwrap()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

pub fn check_stdout(args: &[&str], stdin: Option<&str>, expected: Expect) {
    expected.assert_eq(&text(&run_pebble(args, stdin).stdout));
}

pub fn check_stderr(args: &[&str], stdin: Option<&str>, expected: Expect) {
    expected.assert_eq(&text(&run_pebble(args, stdin).stderr));
}

pub fn check_output(args: &[&str], stdin: Option<&str>, stdout: Expect, stderr: Expect) {
    let output = run_pebble(args, stdin);
    stdout.assert_eq(&text(&output.stdout));
    stderr.assert_eq(&text(&output.stderr));
}
