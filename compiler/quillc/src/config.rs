//! Service configuration.

use std::time::Duration;

use quill_backend::{EmitOptions, LanguageVersion, ParseOptions, DEFAULT_MODULE_NAME};
use quill_refs::{ReferenceName, DEFAULT_FETCH_TIMEOUT};

/// Configuration for a [`CompileService`](crate::CompileService).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Libraries the backend may link against, resolved once per process.
    pub references: Vec<ReferenceName>,
    pub language_version: LanguageVersion,
    /// Name recorded in emitted modules.
    pub module_name: String,
    pub fetch_timeout: Duration,
    /// Bound on parse and emit together.
    pub compile_timeout: Duration,
    pub load_timeout: Duration,
    pub invoke_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            references: Vec::new(),
            language_version: LanguageVersion::Preview,
            module_name: DEFAULT_MODULE_NAME.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            compile_timeout: Duration::from_secs(10),
            load_timeout: Duration::from_secs(5),
            invoke_timeout: Duration::from_secs(5),
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn with_reference(mut self, name: ReferenceName) -> Self {
        if !self.references.contains(&name) {
            self.references.push(name);
        }
        self
    }

    /// Add a reference by raw name.
    pub fn try_with_reference(self, raw: &str) -> Result<Self, ConfigError> {
        let name =
            ReferenceName::new(raw).ok_or_else(|| ConfigError::InvalidReference(raw.to_string()))?;
        Ok(self.with_reference(name))
    }

    #[must_use]
    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = version;
        self
    }

    #[must_use]
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_compile_timeout(mut self, timeout: Duration) -> Self {
        self.compile_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = timeout;
        self
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            language_version: self.language_version,
        }
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            module_name: self.module_name.clone(),
        }
    }
}

/// A bad command-line flag or configuration value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing source file")]
    MissingFile,

    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),

    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("invalid reference name `{0}`")]
    InvalidReference(String),

    #[error("invalid timeout `{value}`: expected a positive number of milliseconds")]
    InvalidTimeout { value: String },
}
