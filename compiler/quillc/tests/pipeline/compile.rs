//! The compile half: parse, emit, load.

use std::time::Duration;

use pretty_assertions::assert_eq;
use quill_diagnostic::{Severity, StageMarker};
use quill_ir::AttemptId;
use quill_loader::{ImageLoader, LoadError};
use quillc::{AttemptState, CompileOutcome, CompileService};

use crate::common::{self, harness, harness_with, markers, RecordingBackend, StageCounts, HELLO};

#[tokio::test]
async fn syntax_error_stops_before_emit() {
    let h = harness();
    h.service.warm_up().await;
    let fetched = h.fetcher.total_fetches();

    let report = h
        .service
        .compile("pub type Program { fn GetString() { return \"x\" } }")
        .await;

    assert!(report.module().is_none());
    assert!(matches!(report.outcome, CompileOutcome::NotProduced));
    assert_eq!(report.state, AttemptState::ParseFailed);
    assert_eq!(report.log.last_marker(), Some(StageMarker::ParseFailed));
    assert_eq!(markers(&report.log), vec![StageMarker::ParseFailed]);
    assert_eq!(common::emit_diagnostic_count(&report.log), 0);
    assert_eq!(h.counts.parses(), 1);
    assert_eq!(h.counts.emits(), 0);
    assert_eq!(h.fetcher.total_fetches(), fetched);
}

#[tokio::test]
async fn emit_failure_keeps_all_diagnostics() {
    let h = harness();
    let report = h
        .service
        .compile("pub type Program { fn GetString() { return missing; } }")
        .await;

    assert!(report.module().is_none());
    assert_eq!(report.state, AttemptState::EmitFailed);
    assert_eq!(
        markers(&report.log),
        vec![StageMarker::ParseSucceeded, StageMarker::EmitFailed]
    );
    assert!(common::emit_diagnostic_count(&report.log) > 0);
    let text = report.log.render();
    assert!(text.contains("error Q2004: cannot find `missing` in this scope"), "{text}");
    assert_eq!(h.counts.emits(), 1);
}

#[tokio::test]
async fn successful_compile_loads_module() {
    let h = harness();
    let report = h.service.compile(HELLO).await;

    assert_eq!(report.state, AttemptState::Loaded);
    let module = report.module().expect("module loaded");
    assert_eq!(module.name(), "Playground");
    assert_eq!(module.attempt(), report.attempt);
    assert_eq!(
        report.log.render(),
        "Parse SyntaxTree Success\nCompilation success!\n"
    );
    assert_eq!(h.service.arena().len(), 1);
}

#[tokio::test]
async fn warnings_do_not_block_loading() {
    let h = harness();
    let report = h
        .service
        .compile("import Twilio;\npub type Program { fn GetString() { return none; } }")
        .await;

    assert_eq!(report.state, AttemptState::Loaded);
    assert_eq!(report.log.count(Severity::Warning), 1);
    assert_eq!(report.log.count(Severity::Error), 0);
    assert_eq!(report.log.last_marker(), Some(StageMarker::EmitSucceeded));
}

#[tokio::test]
async fn sequential_compiles_never_mix_diagnostics() {
    let h = harness();
    let broken = h
        .service
        .compile("pub type Program { fn GetString() { return nope; } }")
        .await;
    let clean = h.service.compile(HELLO).await;

    assert!(broken.log.has_errors());
    assert!(!clean.log.has_errors());
    assert_eq!(clean.log.diagnostics().count(), 0);
    assert_eq!(
        markers(&clean.log),
        vec![StageMarker::ParseSucceeded, StageMarker::EmitSucceeded]
    );
    assert!(clean.attempt > broken.attempt);
}

#[tokio::test]
async fn attempts_are_numbered_and_modules_retained() {
    let h = harness();
    let first = h.service.compile(HELLO).await;
    let failed = h.service.compile("type").await;
    let third = h.service.compile(HELLO).await;

    assert_eq!(first.attempt, AttemptId::new(1));
    assert_eq!(failed.attempt, AttemptId::new(2));
    assert_eq!(third.attempt, AttemptId::new(3));
    assert_eq!(
        h.service.arena().attempts(),
        vec![AttemptId::new(1), AttemptId::new(3)]
    );
}

#[tokio::test]
async fn stable_language_version_rejects_loop() {
    let h = harness_with(
        common::config().with_language_version(quill_backend::LanguageVersion::Stable),
        ImageLoader::new(),
    );
    let report = h
        .service
        .compile("pub type Program { fn GetString() { loop { return 1; } } }")
        .await;
    assert_eq!(report.state, AttemptState::ParseFailed);
    assert!(report.log.render().contains("Q1008"));
}

#[tokio::test]
async fn deep_parentheses_fail_parse_without_crashing() {
    let h = harness();
    let depth = 20_000;
    let source = format!(
        "pub type Program {{ fn GetString() {{ return {}1{}; }} }}",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let report = h.service.compile(source).await;

    assert_eq!(report.state, AttemptState::ParseFailed);
    assert!(matches!(report.outcome, CompileOutcome::NotProduced));
    assert_eq!(markers(&report.log), vec![StageMarker::ParseFailed]);
    let text = report.log.render();
    assert!(text.contains("error Q1009: nesting exceeds the limit"), "{text}");
    assert_eq!(h.counts.emits(), 0);

    // The service is still usable.
    assert_eq!(h.service.compile(HELLO).await.state, AttemptState::Loaded);
}

#[tokio::test]
async fn long_plus_chain_fails_parse_without_crashing() {
    let h = harness();
    let chain = vec!["1"; 200_000].join(" + ");
    let source = format!("pub type Program {{ fn GetString() {{ return {chain}; }} }}");
    let report = h.service.compile_and_run(source).await;

    assert_eq!(report.state, AttemptState::ParseFailed);
    assert!(matches!(report.outcome, quillc::RunOutcome::NotCompiled));
    assert!(report.log.render().contains("Q1009"));
    assert_eq!(report.summary().error_type, Some(quillc::ErrorType::Compile));

    assert_eq!(h.service.compile(HELLO).await.state, AttemptState::Loaded);
}

#[tokio::test]
async fn nesting_under_limit_compiles_and_runs() {
    let h = harness();
    let chain = vec!["1"; 400].join(" + ");
    let source = format!(
        "pub type Program {{ fn GetString() {{ return {}{chain}{}; }} }}",
        "(".repeat(50),
        ")".repeat(50)
    );
    let report = h.service.compile_and_run(source).await;

    assert_eq!(report.state, AttemptState::Succeeded);
    assert_eq!(report.output(), Some("400"));
}

#[tokio::test]
async fn slow_parse_times_out() {
    let counts = StageCounts::default();
    let service = CompileService::new(
        RecordingBackend::new(counts.clone()).with_parse_delay(Duration::from_millis(500)),
        ImageLoader::new(),
        common::fetcher(),
        common::config().with_compile_timeout(Duration::from_millis(50)),
    );
    let report = service.compile(HELLO).await;

    assert_eq!(report.state, AttemptState::ParseFailed);
    assert_eq!(report.log.last_marker(), Some(StageMarker::ParseFailed));
    assert!(report.log.render().contains("parse timed out after 50ms"));
    assert_eq!(counts.emits(), 0);
}

#[tokio::test]
async fn slow_emit_times_out() {
    let counts = StageCounts::default();
    let service = CompileService::new(
        RecordingBackend::new(counts.clone()).with_emit_delay(Duration::from_millis(500)),
        ImageLoader::new(),
        common::fetcher(),
        common::config().with_compile_timeout(Duration::from_millis(50)),
    );
    let report = service.compile(HELLO).await;

    assert_eq!(report.state, AttemptState::EmitFailed);
    assert!(matches!(report.outcome, CompileOutcome::NotProduced));
    assert_eq!(
        markers(&report.log),
        vec![StageMarker::ParseSucceeded, StageMarker::EmitFailed]
    );
    assert!(report
        .log
        .render()
        .contains("compilation timed out after 50ms"));
    assert_eq!(counts.emits(), 1);
    assert!(service.arena().is_empty());
}

mod slow {
    //! A loader that stalls before delegating to [`ImageLoader`].

    use std::sync::Arc;
    use std::time::Duration;

    use quill_ir::BinaryModule;
    use quill_loader::{ImageLoader, LoadError, LoadedModule, ModuleLoader};

    pub struct SlowLoader {
        pub delay: Duration,
        pub inner: ImageLoader,
    }

    impl ModuleLoader for SlowLoader {
        fn load(&self, module: &BinaryModule) -> Result<Arc<dyn LoadedModule>, LoadError> {
            std::thread::sleep(self.delay);
            self.inner.load(module)
        }
    }
}

#[tokio::test]
async fn slow_load_times_out() {
    let service = CompileService::new(
        RecordingBackend::new(StageCounts::default()),
        slow::SlowLoader {
            delay: Duration::from_millis(500),
            inner: ImageLoader::new(),
        },
        common::fetcher(),
        common::config().with_load_timeout(Duration::from_millis(50)),
    );
    let report = service.compile(HELLO).await;

    assert_eq!(report.state, AttemptState::LoadFailed);
    match &report.outcome {
        CompileOutcome::LoadFailed(LoadError::Timeout { after }) => {
            assert_eq!(*after, Duration::from_millis(50));
        }
        other => panic!("expected load timeout, got {other:?}"),
    }
    assert_eq!(report.log.last_marker(), Some(StageMarker::EmitSucceeded));
    assert!(service.arena().is_empty());

    let run = service.compile_and_run(HELLO).await;
    assert!(matches!(
        run.outcome,
        quillc::RunOutcome::LoadFailed(LoadError::Timeout { .. })
    ));
    assert_eq!(run.summary().error_type, Some(quillc::ErrorType::Load));
}

mod garbage {
    //! A backend whose emitted bytes are not a module image.

    use quill_backend::{
        CompilerBackend, EmitFailure, EmitOptions, Emitted, ParseOptions, Parsed,
    };
    use quill_ir::{BinaryModule, SourceUnit};
    use quill_refs::ReferenceCatalog;

    pub struct GarbageBackend;

    impl CompilerBackend for GarbageBackend {
        type Syntax = ();

        fn parse(&self, _source: &SourceUnit, _options: &ParseOptions) -> Parsed<()> {
            Parsed {
                syntax: (),
                diagnostics: Vec::new(),
            }
        }

        fn emit(
            &self,
            _syntax: &(),
            _references: &ReferenceCatalog,
            _options: &EmitOptions,
        ) -> Result<Emitted, EmitFailure> {
            Ok(Emitted {
                module: BinaryModule::from(b"definitely not QMOD".to_vec()),
                diagnostics: Vec::new(),
            })
        }
    }
}

#[tokio::test]
async fn malformed_module_is_a_load_failure() {
    let service = CompileService::new(
        garbage::GarbageBackend,
        ImageLoader::new(),
        common::fetcher(),
        common::config(),
    );
    let report = service.compile("anything").await;

    assert_eq!(report.state, AttemptState::LoadFailed);
    assert!(matches!(
        report.outcome,
        CompileOutcome::LoadFailed(LoadError::Malformed(_))
    ));
    // The transcript still records a successful compilation.
    assert_eq!(report.log.last_marker(), Some(StageMarker::EmitSucceeded));
    assert!(service.arena().is_empty());

    let run = service.compile_and_run("anything").await;
    assert!(matches!(run.outcome, quillc::RunOutcome::LoadFailed(_)));
    assert_eq!(run.summary().error_type, Some(quillc::ErrorType::Load));
}
