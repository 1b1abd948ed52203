//! The compile-and-run driver.

use std::io::{self, BufRead, Write};

use bumpalo::Bump;

use super::{CompileOptions, Diagnostic, Error};
use crate::syntax::Ast;
use crate::vm::{Code, VM};
use crate::{analyzer, compiler, parser};

/// A program that passed every compile-time check, ready to execute.
///
/// # Example
///
/// ```
/// use pebble_core::api::{CompileOptions, compile};
///
/// let program = compile("int main() { print(6 * 7); return 0; }", &CompileOptions::default())
///     .unwrap();
/// let mut output = Vec::new();
/// let result = program.run(&b""[..], &mut output).unwrap();
/// assert_eq!(result, 0);
/// assert_eq!(output, b"42\n");
/// ```
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    code: Code,
    source: String,
}

impl CompiledProgram {
    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Execute the program, reading `read()` input from `input` and writing
    /// everything it prints to `output`. Returns the value of `main`.
    pub fn run(&self, input: impl BufRead, output: impl Write) -> Result<i32, Error> {
        VM::execute(&self.code, input, output)
            .map_err(|err| Error::runtime(Diagnostic::from(&err), &self.source))
    }

    /// Execute the program against the process's stdin and stdout.
    pub fn run_stdio(&self) -> Result<i32, Error> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }
}

/// Parse and analyze `source`, stopping before code generation.
pub fn check(source: &str, options: &CompileOptions) -> Result<(), Error> {
    let arena = Bump::new();
    let ast = parse(&arena, source, options)?;
    analyze(&ast, source)?;
    Ok(())
}

/// Compile `source` into an executable program.
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompiledProgram, Error> {
    let arena = Bump::new();
    let ast = parse(&arena, source, options)?;
    let analysis = analyze(&ast, source)?;
    let code = compiler::generate(&ast, &analysis)?;
    Ok(CompiledProgram {
        code,
        source: source.to_string(),
    })
}

fn parse<'a>(arena: &'a Bump, source: &str, options: &CompileOptions) -> Result<Ast<'a>, Error> {
    parser::parse_with_max_depth(arena, source, options.max_depth)
        .map_err(|err| Error::compilation(vec![Diagnostic::from(&err)], source))
}

fn analyze(ast: &Ast<'_>, source: &str) -> Result<analyzer::Analysis, Error> {
    analyzer::analyze(ast).map_err(|errors| {
        let diagnostics = errors.iter().map(Diagnostic::from).collect();
        Error::compilation(diagnostics, source)
    })
}
