//! The Quill playground language.
//!
//! A Quill unit imports reference libraries and declares types:
//!
//! ```text
//! import Twilio;
//!
//! pub type Program {
//!     new() { self.greeting = "hello from " + Twilio.Name; }
//!     fn GetString() { return self.greeting; }
//! }
//! ```
//!
//! Parsing is purely syntactic. Name resolution against the reference
//! catalog happens in emit, which lowers the tree to a `QMOD` image with
//! library constants inlined.

pub mod ast;
mod emit;
mod error_code;
mod lexer;
mod parser;

use quill_diagnostic::Diagnostic;
use quill_ir::{SourceUnit, Span};
use quill_refs::ReferenceCatalog;

use crate::{CompilerBackend, EmitFailure, EmitOptions, Emitted, ParseOptions, Parsed};

use ast::CompilationUnit;
pub use error_code::ErrorCode;

/// Parsed Quill source, ready for emit.
///
/// Keeps the source so emit diagnostics can report line and column.
#[derive(Clone, Debug)]
pub struct SyntaxTree {
    pub source: SourceUnit,
    pub unit: CompilationUnit,
}

/// The bundled Quill compiler.
#[derive(Copy, Clone, Debug, Default)]
pub struct QuillBackend;

impl QuillBackend {
    pub fn new() -> Self {
        QuillBackend
    }
}

impl CompilerBackend for QuillBackend {
    type Syntax = SyntaxTree;

    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    fn parse(&self, source: &SourceUnit, options: &ParseOptions) -> Parsed<SyntaxTree> {
        let (unit, problems) = parser::parse(source.text(), options.language_version);
        let diagnostics = problems
            .into_iter()
            .map(|p| render(source, p.span, p.code, &p.message))
            .collect();
        Parsed {
            syntax: SyntaxTree {
                source: source.clone(),
                unit,
            },
            diagnostics,
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(references = references.len()))]
    fn emit(
        &self,
        syntax: &SyntaxTree,
        references: &ReferenceCatalog,
        options: &EmitOptions,
    ) -> Result<Emitted, EmitFailure> {
        emit::emit(syntax, references, options)
    }
}

/// A problem found by the lexer, parser or emitter, before rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Problem {
    code: ErrorCode,
    span: Span,
    message: String,
}

impl Problem {
    fn new(code: ErrorCode, span: Span, message: impl Into<String>) -> Self {
        Problem {
            code,
            span,
            message: message.into(),
        }
    }
}

/// Render a problem as `(<line>,<col>): <severity> <code>: <message>`.
fn render(source: &SourceUnit, span: Span, code: ErrorCode, message: &str) -> Diagnostic {
    let (line, col) = source.line_col(span.start);
    let severity = code.severity();
    let text = format!("({line},{col}): {severity} {code}: {message}");
    Diagnostic::new(severity, text)
}

#[cfg(test)]
mod tests {
    use quill_diagnostic::Severity;

    use super::*;
    use crate::LanguageVersion;

    #[test]
    fn test_render_format() {
        let source = SourceUnit::from("import X\n");
        let diag = render(
            &source,
            Span::point(9),
            ErrorCode::Q1003,
            "expected `;`, found end of input",
        );
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(
            diag.text,
            "(2,1): error Q1003: expected `;`, found end of input"
        );
    }

    #[test]
    fn test_parse_keeps_source_for_emit() {
        let source = SourceUnit::from("pub type Program {}");
        let parsed = QuillBackend.parse(
            &source,
            &ParseOptions {
                language_version: LanguageVersion::Stable,
            },
        );
        assert!(!parsed.has_errors());
        assert_eq!(parsed.syntax.source, source);
        assert_eq!(parsed.syntax.unit.types.len(), 1);
    }
}
