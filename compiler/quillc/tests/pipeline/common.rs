//! Shared fixtures for pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quill_backend::{
    CompilerBackend, EmitFailure, EmitOptions, Emitted, ParseOptions, Parsed, QuillBackend,
    SyntaxTree,
};
use quill_diagnostic::{Stage, StageMarker};
use quill_ir::{ModuleImage, SourceUnit, Value};
use quill_loader::ImageLoader;
use quill_refs::{MemoryFetcher, ReferenceCatalog, ReferenceName};
use quillc::{CompileService, ServiceConfig};

pub const HELLO: &str = r#"
pub type Program {
    fn GetString() { return "hello"; }
}
"#;

/// Counts how often each stage of the wrapped Quill backend runs.
#[derive(Clone, Default)]
pub struct StageCounts {
    parses: Arc<AtomicUsize>,
    emits: Arc<AtomicUsize>,
}

impl StageCounts {
    pub fn parses(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }

    pub fn emits(&self) -> usize {
        self.emits.load(Ordering::SeqCst)
    }
}

/// [`QuillBackend`] with stage counters and optional per-stage delays.
pub struct RecordingBackend {
    inner: QuillBackend,
    counts: StageCounts,
    parse_delay: Option<Duration>,
    emit_delay: Option<Duration>,
}

impl RecordingBackend {
    pub fn new(counts: StageCounts) -> Self {
        RecordingBackend {
            inner: QuillBackend::new(),
            counts,
            parse_delay: None,
            emit_delay: None,
        }
    }

    #[must_use]
    pub fn with_parse_delay(mut self, delay: Duration) -> Self {
        self.parse_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_emit_delay(mut self, delay: Duration) -> Self {
        self.emit_delay = Some(delay);
        self
    }
}

impl CompilerBackend for RecordingBackend {
    type Syntax = SyntaxTree;

    fn parse(&self, source: &SourceUnit, options: &ParseOptions) -> Parsed<SyntaxTree> {
        self.counts.parses.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.parse_delay {
            std::thread::sleep(delay);
        }
        self.inner.parse(source, options)
    }

    fn emit(
        &self,
        syntax: &SyntaxTree,
        references: &ReferenceCatalog,
        options: &EmitOptions,
    ) -> Result<Emitted, EmitFailure> {
        self.counts.emits.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.emit_delay {
            std::thread::sleep(delay);
        }
        self.inner.emit(syntax, references, options)
    }
}

pub type TestService = CompileService<RecordingBackend, ImageLoader>;

pub fn name(raw: &str) -> ReferenceName {
    ReferenceName::new(raw).unwrap()
}

/// The `Twilio` reference library: `Name` and `Version` constants.
pub fn twilio_image() -> Vec<u8> {
    ModuleImage::new("Twilio")
        .with_constant("Name", Value::string("Twilio"))
        .with_constant("Version", Value::Int(7))
        .encode()
        .unwrap()
        .as_bytes()
        .to_vec()
}

pub fn fetcher() -> Arc<MemoryFetcher> {
    Arc::new(MemoryFetcher::new().with_image(name("Twilio"), twilio_image()))
}

pub fn config() -> ServiceConfig {
    ServiceConfig::default().with_reference(name("Twilio"))
}

/// A service plus handles on its fetcher and backend counters.
pub struct Harness {
    pub service: TestService,
    pub fetcher: Arc<MemoryFetcher>,
    pub counts: StageCounts,
}

pub fn harness_with(config: ServiceConfig, loader: ImageLoader) -> Harness {
    let fetcher = fetcher();
    let counts = StageCounts::default();
    let service = CompileService::new(
        RecordingBackend::new(counts.clone()),
        loader,
        fetcher.clone(),
        config,
    );
    Harness {
        service,
        fetcher,
        counts,
    }
}

pub fn harness() -> Harness {
    harness_with(config(), ImageLoader::new())
}

pub fn markers(log: &quill_diagnostic::DiagnosticLog) -> Vec<StageMarker> {
    log.markers().collect()
}

pub fn emit_diagnostic_count(log: &quill_diagnostic::DiagnosticLog) -> usize {
    log.stage_diagnostics(Stage::Emit).len()
}
