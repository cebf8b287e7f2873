//! The per-attempt diagnostic transcript.

use std::fmt;

use serde::Serialize;

use crate::{Diagnostic, Severity};

/// Pipeline stage a marker or diagnostic belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Emit,
}

/// Outcome marker closing a stage in the transcript.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMarker {
    ParseSucceeded,
    ParseFailed,
    EmitSucceeded,
    EmitFailed,
}

impl StageMarker {
    pub fn stage(self) -> Stage {
        match self {
            StageMarker::ParseSucceeded | StageMarker::ParseFailed => Stage::Parse,
            StageMarker::EmitSucceeded | StageMarker::EmitFailed => Stage::Emit,
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, StageMarker::ParseFailed | StageMarker::EmitFailed)
    }
}

impl fmt::Display for StageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StageMarker::ParseSucceeded => "Parse SyntaxTree Success",
            StageMarker::ParseFailed => "Parse SyntaxTree Error!",
            StageMarker::EmitSucceeded => "Compilation success!",
            StageMarker::EmitFailed => "Compilation error",
        };
        f.write_str(text)
    }
}

/// One line of the transcript.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogEntry {
    Diagnostic(Diagnostic),
    Marker { marker: StageMarker },
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Diagnostic(diag) => fmt::Display::fmt(diag, f),
            LogEntry::Marker { marker } => fmt::Display::fmt(marker, f),
        }
    }
}

/// Ordered, append-only transcript of one compile attempt.
///
/// There is deliberately no way to remove or clear entries: a fresh log is
/// created for every attempt and returned to the caller by value.
#[derive(Clone, Default, Eq, PartialEq, Debug, Serialize)]
#[serde(transparent)]
pub struct DiagnosticLog {
    entries: Vec<LogEntry>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        DiagnosticLog::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(LogEntry::Diagnostic(diagnostic));
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.entries
            .extend(diagnostics.into_iter().map(LogEntry::Diagnostic));
    }

    pub fn mark(&mut self, marker: StageMarker) {
        self.entries.push(LogEntry::Marker { marker });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Diagnostic(diag) => Some(diag),
            LogEntry::Marker { .. } => None,
        })
    }

    pub fn markers(&self) -> impl Iterator<Item = StageMarker> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Marker { marker } => Some(*marker),
            LogEntry::Diagnostic(_) => None,
        })
    }

    pub fn last_marker(&self) -> Option<StageMarker> {
        self.markers().last()
    }

    /// Diagnostics that belong to one stage.
    ///
    /// Everything before the parse marker is parse output; everything after
    /// it is emit output.
    pub fn stage_diagnostics(&self, stage: Stage) -> Vec<&Diagnostic> {
        let mut current = Stage::Parse;
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                LogEntry::Diagnostic(diag) if current == stage => out.push(diag),
                LogEntry::Diagnostic(_) => {}
                LogEntry::Marker { marker } if marker.stage() == Stage::Parse => {
                    current = Stage::Emit;
                }
                LogEntry::Marker { .. } => {}
            }
        }
        out
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics()
            .filter(|diag| diag.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(Diagnostic::is_error)
    }

    /// Render the transcript, one entry per line.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
