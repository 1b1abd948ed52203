//! Error rendering for terminals.
//!
//! Two styles are supported: plain one-line diagnostics in the classic
//! `<file>:<line>: error: <message>` form, and fancy reports with source
//! snippets rendered by ariadne.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;
use std::ops::Range;

/// How diagnostics are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// One line per diagnostic.
    #[default]
    Plain,
    /// Source snippets with labels and help notes.
    Fancy,
}

/// Character set for fancy rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    #[default]
    Unicode,
    Ascii,
}

/// Configuration for error rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig<'a> {
    /// Whether to use ANSI color codes in fancy output.
    pub color: bool,
    /// The filename to display. Falls back to the error's own filename,
    /// then to `<input>`.
    pub filename: Option<&'a str>,
    pub style: Style,
    pub charset: CharSet,
}

impl Default for RenderConfig<'_> {
    fn default() -> Self {
        RenderConfig::default()
    }
}

impl RenderConfig<'_> {
    const fn default() -> Self {
        Self {
            color: true,
            filename: None,
            style: Style::Plain,
            charset: CharSet::Unicode,
        }
    }
}

/// Render an error to stderr using the default configuration.
pub fn render_error(error: &Error) {
    render_error_to(error, &mut std::io::stderr(), &RenderConfig::default()).ok();
}

/// Render an error to a writer with the given configuration.
///
/// # Example
/// ```
/// use pebble::{CompileOptions, RenderConfig, compile, render_error_to};
///
/// let err = compile("int main() { return x; }", &CompileOptions::default()).unwrap_err();
/// let mut buf = Vec::new();
/// let config = RenderConfig { filename: Some("demo.pb"), ..Default::default() };
/// render_error_to(&err, &mut buf, &config).unwrap();
/// assert_eq!(
///     String::from_utf8(buf).unwrap(),
///     "demo.pb:1: error: undeclared identifier `x`\n"
/// );
/// ```
pub fn render_error_to(
    error: &Error,
    writer: &mut dyn Write,
    config: &RenderConfig,
) -> std::io::Result<()> {
    let filename = config
        .filename
        .or_else(|| error.filename())
        .unwrap_or("<input>");

    match error {
        Error::Compilation {
            diagnostics,
            source,
            ..
        } => render_diagnostics(source, diagnostics, writer, config, filename),
        Error::Runtime {
            diagnostic, source, ..
        } => render_diagnostics(
            source,
            core::slice::from_ref(diagnostic),
            writer,
            config,
            filename,
        ),
        Error::Internal(msg) => writeln!(writer, "{filename}: internal error: {msg}"),
    }
}

fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    config: &RenderConfig,
    filename: &str,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let span = diag
            .span
            .as_ref()
            .map(|span| span.0.clone())
            .or_else(|| diag.line.and_then(|line| line_span(source, line)));
        match (config.style, span) {
            (Style::Fancy, Some(span)) => {
                render_fancy(source, diag, span, writer, config, filename)?
            }
            _ => render_plain(diag, writer, filename)?,
        }
    }
    Ok(())
}

fn render_plain(diag: &Diagnostic, writer: &mut dyn Write, filename: &str) -> std::io::Result<()> {
    match diag.line {
        Some(line) => writeln!(writer, "{filename}:{line}: {}: {}", diag.severity, diag.message),
        None => writeln!(writer, "{filename}: {}: {}", diag.severity, diag.message),
    }
}

fn render_fancy(
    source: &str,
    diag: &Diagnostic,
    span: Range<usize>,
    writer: &mut dyn Write,
    config: &RenderConfig,
    filename: &str,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
    };
    let charset = match config.charset {
        CharSet::Unicode => ariadne::CharSet::Unicode,
        CharSet::Ascii => ariadne::CharSet::Ascii,
    };
    let ariadne_config = ariadne::Config::default()
        .with_color(config.color)
        .with_char_set(charset);

    let mut report = Report::build(kind, (filename, span.clone()))
        .with_message(&diag.message)
        .with_config(ariadne_config);
    if let Some(code) = &diag.code {
        report = report.with_code(code);
    }
    report = report.with_label(
        Label::new((filename, span))
            .with_message(&diag.message)
            .with_color(colors.next()),
    );
    for help_msg in &diag.help {
        report = report.with_help(help_msg);
    }

    report
        .finish()
        .write((filename, Source::from(source)), &mut *writer)
}

/// Byte range of 1-based `line` without its newline.
fn line_span(source: &str, line: u32) -> Option<Range<usize>> {
    let index = (line as usize).checked_sub(1)?;
    let mut start = 0;
    for (i, text) in source.split('\n').enumerate() {
        if i == index {
            return Some(start..start + text.trim_end_matches('\r').len());
        }
        start += text.len() + 1;
    }
    None
}
