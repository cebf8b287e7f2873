//! Diagnostic codes for the Quill compiler.

use std::fmt;

use quill_diagnostic::Severity;

/// Error codes for Quill diagnostics.
///
/// Format: Q#### where the first digit indicates the stage:
/// - Q1xxx: lexer and parser (parse stage)
/// - Q2xxx: name resolution and lowering (emit stage)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Character that starts no token
    Q1001,
    /// String literal missing its closing quote
    Q1002,
    /// Expected a specific token
    Q1003,
    /// Expected `import` or a type declaration
    Q1004,
    /// Expected `new` or `fn` inside a type
    Q1005,
    /// Expected an expression
    Q1006,
    /// Integer literal out of range
    Q1007,
    /// Feature gated behind the preview language version
    Q1008,
    /// Expressions or blocks nested past the parser's depth limit
    Q1009,

    /// Imported library is not in the reference catalog
    Q2001,
    /// Library has no constant with that name
    Q2002,
    /// Library used without being imported
    Q2003,
    /// Name is not a parameter in scope
    Q2004,
    /// Type declared twice
    Q2005,
    /// Member declared twice with the same arity
    Q2006,
    /// Import never used (warning)
    Q2007,
    /// Statement can never run (warning)
    Q2008,
    /// Reference image could not be decoded
    Q2009,
    /// Constructor returns a value
    Q2010,
    /// More than 255 parameters
    Q2011,
    /// Emitted image could not be encoded
    Q2099,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Q1001 => "Q1001",
            ErrorCode::Q1002 => "Q1002",
            ErrorCode::Q1003 => "Q1003",
            ErrorCode::Q1004 => "Q1004",
            ErrorCode::Q1005 => "Q1005",
            ErrorCode::Q1006 => "Q1006",
            ErrorCode::Q1007 => "Q1007",
            ErrorCode::Q1008 => "Q1008",
            ErrorCode::Q1009 => "Q1009",
            ErrorCode::Q2001 => "Q2001",
            ErrorCode::Q2002 => "Q2002",
            ErrorCode::Q2003 => "Q2003",
            ErrorCode::Q2004 => "Q2004",
            ErrorCode::Q2005 => "Q2005",
            ErrorCode::Q2006 => "Q2006",
            ErrorCode::Q2007 => "Q2007",
            ErrorCode::Q2008 => "Q2008",
            ErrorCode::Q2009 => "Q2009",
            ErrorCode::Q2010 => "Q2010",
            ErrorCode::Q2011 => "Q2011",
            ErrorCode::Q2099 => "Q2099",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::Q2007 | ErrorCode::Q2008 => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
