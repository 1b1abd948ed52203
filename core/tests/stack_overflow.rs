//! Deep nesting and unbounded recursion fail cleanly.

use bumpalo::Bump;
use pebble_core::api::{CompileOptions, Error, compile};
use pebble_core::parser::{self, ParseErrorKind};

fn nested_parens(levels: usize) -> String {
    let mut input = String::from("int main() { return ");
    for _ in 0..levels {
        input.push('(');
    }
    input.push('1');
    for _ in 0..levels {
        input.push(')');
    }
    input.push_str("; }");
    input
}

/// Debug builds use large stack frames; give the parser the headroom a
/// release build would have at the default limit.
fn with_large_stack(test: impl FnOnce() + Send + 'static) {
    std::thread::Builder::new()
        .stack_size(16 * 1024 * 1024)
        .spawn(test)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn test_depth_protection_prevents_stack_overflow() {
    with_large_stack(|| {
        let arena = Bump::new();
        let input = nested_parens(100_000);

        let err = parser::parse(&arena, &input).unwrap_err();
        assert!(
            matches!(err.kind, ParseErrorKind::TooDeep { max } if max == parser::DEFAULT_MAX_DEPTH),
            "expected TooDeep, got {err:?}"
        );
    });
}

#[test]
fn test_nesting_below_limit_compiles() {
    let input = nested_parens(100);
    assert!(compile(&input, &CompileOptions::default()).is_ok());
}

#[test]
fn test_deeply_nested_blocks() {
    with_large_stack(|| {
        let mut input = String::from("int main() ");
        for _ in 0..10_000 {
            input.push('{');
        }
        for _ in 0..10_000 {
            input.push('}');
        }
        let err = compile(&input, &CompileOptions::default()).unwrap_err();
        assert!(err.diagnostics()[0].message.starts_with("nesting depth exceeds"));
    });
}

#[test]
fn test_unbounded_recursion_overflows_vm_stack() {
    let source = "int down(int n) { return down(n + 1); } int main() { return down(0); }";
    let program = compile(source, &CompileOptions::default()).unwrap();
    let err = program.run(&b""[..], Vec::new()).unwrap_err();
    let Error::Runtime { diagnostic, .. } = &err else {
        panic!("expected runtime error, got {err:?}");
    };
    assert_eq!(diagnostic.message, "stack overflow");
    assert_eq!(diagnostic.code.as_deref(), Some("R002"));
}
