//! Integration tests for the `dump` command.

mod common;

use common::{check_output, check_stdout};
use expect_test::expect;

#[test]
fn dump_prints_listing() {
    check_stdout(
        &["dump", "-"],
        Some(r#"int main() { print_string("hi"); return 0; }"#),
        expect![[r#"
               0: CallBegin
               1: Call 5 0
               4: Exit
               5: Push 0
               7: PrintString
               8: Push 0
              10: RetV
              11: Ret
            strings:
               0: "hi"
        "#]],
    );
}

#[test]
fn dump_reports_compile_errors() {
    check_output(
        &["dump", "-"],
        Some("int f() { return 0; }"),
        expect![""],
        expect![[r#"
            <stdin>:1: error: no `main` function found
        "#]],
    );
}
