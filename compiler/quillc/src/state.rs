use std::fmt;

use serde::Serialize;

/// Where a compile attempt is, or where it ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Start,
    Parsing,
    ParseFailed,
    Emitting,
    EmitFailed,
    Loaded,
    LoadFailed,
    Invoking,
    InvokeFailed,
    Succeeded,
}

impl AttemptState {
    /// `compile` ends in one of these.
    pub fn is_compile_terminal(self) -> bool {
        matches!(
            self,
            AttemptState::ParseFailed
                | AttemptState::EmitFailed
                | AttemptState::Loaded
                | AttemptState::LoadFailed
        )
    }

    /// `compile_and_run` ends in one of these.
    pub fn is_run_terminal(self) -> bool {
        matches!(
            self,
            AttemptState::ParseFailed
                | AttemptState::EmitFailed
                | AttemptState::LoadFailed
                | AttemptState::InvokeFailed
                | AttemptState::Succeeded
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttemptState::Start => "start",
            AttemptState::Parsing => "parsing",
            AttemptState::ParseFailed => "parse_failed",
            AttemptState::Emitting => "emitting",
            AttemptState::EmitFailed => "emit_failed",
            AttemptState::Loaded => "loaded",
            AttemptState::LoadFailed => "load_failed",
            AttemptState::Invoking => "invoking",
            AttemptState::InvokeFailed => "invoke_failed",
            AttemptState::Succeeded => "succeeded",
        }
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
