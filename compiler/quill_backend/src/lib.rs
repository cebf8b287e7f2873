//! Compiler backend seam for the playground pipeline.
//!
//! The orchestrator drives any [`CompilerBackend`] through two stages:
//!
//! ```text
//! SourceUnit ──parse──► Parsed { syntax, diagnostics }
//!                          │  (only if no error diagnostics)
//!                          ▼
//!            syntax + ReferenceCatalog ──emit──► Emitted { module, diagnostics }
//!                                              │ EmitFailure { diagnostics }
//! ```
//!
//! Diagnostic text is backend-defined and passed through verbatim.
//!
//! [`QuillBackend`] is the bundled implementation: a compiler for Quill, a
//! small playground language that emits `QMOD` module images.

mod quill;

use quill_diagnostic::Diagnostic;
use quill_ir::{BinaryModule, SourceUnit};
use quill_refs::ReferenceCatalog;

pub use quill::{ast, ErrorCode, QuillBackend, SyntaxTree};

/// Language version flag handed to the parser.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum LanguageVersion {
    Stable,
    /// Stable plus features still under evaluation.
    #[default]
    Preview,
}

impl LanguageVersion {
    pub fn is_preview(self) -> bool {
        matches!(self, LanguageVersion::Preview)
    }
}

impl std::str::FromStr for LanguageVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Ok(LanguageVersion::Stable),
            "preview" => Ok(LanguageVersion::Preview),
            other => Err(format!("unknown language version `{other}`")),
        }
    }
}

/// Options for the parse stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub language_version: LanguageVersion,
}

/// Options for the emit stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    /// Name recorded in the emitted module.
    pub module_name: String,
}

/// Default name of emitted modules.
pub const DEFAULT_MODULE_NAME: &str = "Playground";

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            module_name: DEFAULT_MODULE_NAME.to_string(),
        }
    }
}

/// Output of the parse stage.
#[derive(Clone, Debug)]
pub struct Parsed<S> {
    pub syntax: S,
    pub diagnostics: Vec<Diagnostic>,
}

impl<S> Parsed<S> {
    pub fn has_errors(&self) -> bool {
        quill_diagnostic::has_errors(&self.diagnostics)
    }
}

/// Successful emit: the module plus any non-fatal diagnostics.
#[derive(Clone, Debug)]
pub struct Emitted {
    pub module: BinaryModule,
    pub diagnostics: Vec<Diagnostic>,
}

/// Failed emit: every diagnostic produced, at least one of them an error.
#[derive(Clone, Debug)]
pub struct EmitFailure {
    pub diagnostics: Vec<Diagnostic>,
}

/// An external compiler: parse, diagnose, emit.
///
/// Implementations must be pure with respect to their inputs; the service
/// may call them from a blocking worker thread.
pub trait CompilerBackend: Send + Sync + 'static {
    /// Backend-specific syntax representation handed from parse to emit.
    type Syntax: Send + 'static;

    fn parse(&self, source: &SourceUnit, options: &ParseOptions) -> Parsed<Self::Syntax>;

    fn emit(
        &self,
        syntax: &Self::Syntax,
        references: &ReferenceCatalog,
        options: &EmitOptions,
    ) -> Result<Emitted, EmitFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_version_from_str() {
        assert_eq!("Preview".parse(), Ok(LanguageVersion::Preview));
        assert_eq!("stable".parse(), Ok(LanguageVersion::Stable));
        assert!("latest".parse::<LanguageVersion>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert!(ParseOptions::default().language_version.is_preview());
        assert_eq!(EmitOptions::default().module_name, "Playground");
    }
}
