//! What `compile` and `compile_and_run` hand back.

use quill_diagnostic::{DiagnosticLog, Severity};
use quill_ir::AttemptId;
use quill_loader::{InvokeError, LoadError, LoadedHandle};
use serde::Serialize;

use crate::AttemptState;

/// Result of the compile half of the pipeline.
#[derive(Debug)]
pub enum CompileOutcome {
    /// Parse or emit failed; the log says why.
    NotProduced,
    Loaded(LoadedHandle),
    LoadFailed(LoadError),
}

#[derive(Debug)]
pub struct CompileReport {
    pub attempt: AttemptId,
    /// The complete transcript of this attempt and no other.
    pub log: DiagnosticLog,
    pub state: AttemptState,
    pub outcome: CompileOutcome,
}

impl CompileReport {
    /// The loaded module, if the attempt got that far.
    pub fn module(&self) -> Option<&LoadedHandle> {
        match &self.outcome {
            CompileOutcome::Loaded(handle) => Some(handle),
            CompileOutcome::NotProduced | CompileOutcome::LoadFailed(_) => None,
        }
    }
}

/// Result of the whole pipeline.
///
/// "No module was produced" and "the module ran and failed" are different
/// variants, never folded into one another.
#[derive(Debug)]
pub enum RunOutcome {
    NotCompiled,
    LoadFailed(LoadError),
    InvokeFailed(InvokeError),
    /// `None` when `GetString` returned `none`.
    Succeeded(Option<String>),
}

#[derive(Debug)]
pub struct RunReport {
    pub attempt: AttemptId,
    pub log: DiagnosticLog,
    pub state: AttemptState,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Succeeded(_))
    }

    pub fn output(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Succeeded(text) => text.as_deref(),
            _ => None,
        }
    }

    pub fn summary(&self) -> RunSummary {
        let (error, error_type) = match &self.outcome {
            RunOutcome::Succeeded(_) => (None, None),
            RunOutcome::NotCompiled => {
                let first_error = self
                    .log
                    .diagnostics()
                    .find(|d| d.severity == Severity::Error)
                    .map_or_else(|| "compilation failed".to_string(), |d| d.text.clone());
                (Some(first_error), Some(ErrorType::Compile))
            }
            RunOutcome::LoadFailed(err) => (Some(err.to_string()), Some(ErrorType::Load)),
            RunOutcome::InvokeFailed(err) => (Some(err.to_string()), Some(ErrorType::Runtime)),
        };
        RunSummary {
            success: self.is_success(),
            output: self.output().map(str::to_string),
            log: self.log.render(),
            error,
            error_type,
        }
    }
}

/// Which stage a failed run stopped in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Compile,
    Load,
    Runtime,
}

/// Flat, serializable view of a [`RunReport`] for hosts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub success: bool,
    pub output: Option<String>,
    pub log: String,
    pub error: Option<String>,
    pub error_type: Option<ErrorType>,
}
