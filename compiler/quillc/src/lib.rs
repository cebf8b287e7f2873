//! Compile-and-run service for the Quill playground.
//!
//! [`CompileService`] turns submitted source text into a diagnostic
//! transcript, a loaded module, and finally the text returned by the
//! module's `Program.GetString()`:
//!
//! ```text
//! Start → Parsing → ParseFailed
//!                 → Emitting → EmitFailed
//!                            → Loaded → Invoking → InvokeFailed
//!                            → LoadFailed         → Succeeded(text)
//! ```
//!
//! The service is generic over the compiler backend and module loader; the
//! `quill` binary wires it to [`QuillBackend`](quill_backend::QuillBackend)
//! and [`ImageLoader`](quill_loader::ImageLoader).

pub mod commands;
mod config;
mod report;
mod service;
mod state;

use std::sync::Once;

pub use config::{ConfigError, ServiceConfig};
pub use report::{CompileOutcome, CompileReport, ErrorType, RunOutcome, RunReport, RunSummary};
pub use service::CompileService;
pub use state::AttemptState;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=quillc=debug` or `RUST_LOG=quill_refs=debug,quillc=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
