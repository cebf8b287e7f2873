//! Diagnostics for the compile-and-run pipeline.
//!
//! A [`Diagnostic`] is a severity-tagged line of text produced by the
//! compiler backend. Its text is backend-defined and passed through
//! verbatim; this crate never reformats it.
//!
//! A [`DiagnosticLog`] is the transcript of exactly one compile attempt:
//! parse diagnostics, a parse [`StageMarker`], emit diagnostics (if emit was
//! reached) and an emit marker. Logs are values, created empty per attempt
//! and handed back to the caller; there is no shared buffer to clear.

mod diagnostic;
mod log;

pub use diagnostic::{has_errors, Diagnostic, Severity};
pub use log::{DiagnosticLog, LogEntry, Stage, StageMarker};
