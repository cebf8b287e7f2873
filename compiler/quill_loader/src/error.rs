use std::time::Duration;

use quill_ir::ImageError;

/// Failure to bring an emitted module into the process.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed module: {0}")]
    Malformed(#[from] ImageError),

    #[error("loading timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },

    /// The loader refused the module or died while loading it.
    #[error("module rejected: {0}")]
    Rejected(String),
}

/// Failure to run the `Program.GetString` entry point.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    #[error("expected exactly one exported type `Program`, found {found}")]
    AmbiguousOrMissingEntryType { found: usize },

    #[error("constructing `Program` failed: {0}")]
    ConstructionFailed(String),

    #[error("type `{type_name}` has no zero-argument method `{method}`")]
    MissingMethod { type_name: String, method: String },

    #[error("user code failed: {0}")]
    UserCodeFailed(String),

    #[error("invocation timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },
}

/// A failure raised while user code runs inside a loader.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UserFault {
    /// `fail <expr>` with the text of the expression.
    #[error("{0}")]
    Raised(String),

    #[error("execution was cancelled")]
    Interrupted,

    #[error("step budget of {budget} exhausted")]
    BudgetExhausted { budget: u64 },

    #[error("field `{0}` read before assignment")]
    UnassignedField(String),

    #[error("integer overflow in `{lhs} + {rhs}`")]
    Overflow { lhs: i64, rhs: i64 },

    /// The module asks for something its own metadata does not provide.
    #[error("invalid program: {0}")]
    InvalidProgram(String),
}
