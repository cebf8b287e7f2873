//! The run half: entry-point dispatch and runtime failures.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use quill_diagnostic::StageMarker;
use quill_loader::{ImageLoader, InvokeError};
use quillc::{AttemptState, CompileOutcome, ErrorType, RunOutcome};

use crate::common::{self, harness, harness_with, markers, HELLO};

#[tokio::test]
async fn hello_returns_text() {
    let h = harness();
    let report = h.service.compile_and_run(HELLO).await;

    assert_eq!(report.state, AttemptState::Succeeded);
    assert_eq!(report.output(), Some("hello"));
    assert!(report.is_success());
    assert_eq!(
        markers(&report.log),
        vec![StageMarker::ParseSucceeded, StageMarker::EmitSucceeded]
    );
}

#[tokio::test]
async fn library_constants_reach_the_output() {
    let h = harness();
    let report = h
        .service
        .compile_and_run(
            r#"
import Twilio;

pub type Program {
    new() { self.greeting = "hello from " + Twilio.Name + " v" + Twilio.Version; }
    fn GetString() { return self.greeting; }
}
"#,
        )
        .await;
    assert_eq!(report.output(), Some("hello from Twilio v7"));
}

#[tokio::test]
async fn none_result_is_absent_output() {
    let h = harness();
    let report = h
        .service
        .compile_and_run("pub type Program { fn GetString() { return none; } }")
        .await;

    assert_eq!(report.state, AttemptState::Succeeded);
    assert!(matches!(report.outcome, RunOutcome::Succeeded(None)));
    assert_eq!(report.output(), None);
    assert!(report.summary().success);
}

#[tokio::test]
async fn missing_program_is_a_runtime_failure() {
    let source = "pub type Helper { fn GetString() { return \"x\"; } }";
    let h = harness();

    let compiled = h.service.compile(source).await;
    assert!(matches!(compiled.outcome, CompileOutcome::Loaded(_)));

    let run = h.service.compile_and_run(source).await;
    assert_eq!(run.state, AttemptState::InvokeFailed);
    assert!(matches!(
        run.outcome,
        RunOutcome::InvokeFailed(InvokeError::AmbiguousOrMissingEntryType { found: 0 })
    ));
}

#[tokio::test]
async fn private_program_does_not_count() {
    let h = harness();
    let run = h
        .service
        .compile_and_run("type Program { fn GetString() { return \"x\"; } }")
        .await;
    assert!(matches!(
        run.outcome,
        RunOutcome::InvokeFailed(InvokeError::AmbiguousOrMissingEntryType { found: 0 })
    ));
}

#[tokio::test]
async fn missing_get_string() {
    let h = harness();
    let run = h
        .service
        .compile_and_run("pub type Program { fn GetText() { return \"x\"; } }")
        .await;
    assert!(matches!(
        run.outcome,
        RunOutcome::InvokeFailed(InvokeError::MissingMethod { .. })
    ));
}

#[tokio::test]
async fn constructor_without_zero_arg_overload() {
    let h = harness();
    let run = h
        .service
        .compile_and_run(
            "pub type Program { new(x) { self.x = x; } fn GetString() { return self.x; } }",
        )
        .await;
    assert!(matches!(
        run.outcome,
        RunOutcome::InvokeFailed(InvokeError::ConstructionFailed(_))
    ));
}

#[tokio::test]
async fn constructor_failure() {
    let h = harness();
    let run = h
        .service
        .compile_and_run(
            "pub type Program { new() { fail \"no config\"; } fn GetString() { return 1; } }",
        )
        .await;
    match run.outcome {
        RunOutcome::InvokeFailed(InvokeError::ConstructionFailed(msg)) => {
            assert_eq!(msg, "no config");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn user_code_failure_is_contained() {
    let h = harness();
    let run = h
        .service
        .compile_and_run("pub type Program { fn GetString() { fail \"boom \" + 42; } }")
        .await;

    assert_eq!(run.state, AttemptState::InvokeFailed);
    let summary = run.summary();
    assert!(!summary.success);
    assert_eq!(summary.error.as_deref(), Some("user code failed: boom 42"));
    assert_eq!(summary.error_type, Some(ErrorType::Runtime));

    // The service is still usable afterwards.
    let next = h.service.compile_and_run(HELLO).await;
    assert_eq!(next.output(), Some("hello"));
}

#[tokio::test]
async fn compile_failure_is_not_a_runtime_failure() {
    let h = harness();
    let run = h.service.compile_and_run("pub type {").await;

    assert!(matches!(run.outcome, RunOutcome::NotCompiled));
    assert_eq!(run.state, AttemptState::ParseFailed);
    assert_eq!(run.summary().error_type, Some(ErrorType::Compile));
}

#[tokio::test]
async fn step_budget_stops_runaway_loop() {
    let h = harness_with(common::config(), ImageLoader::new().with_step_budget(10_000));
    let run = h
        .service
        .compile_and_run("pub type Program { fn GetString() { loop { } } }")
        .await;
    assert!(matches!(
        run.outcome,
        RunOutcome::InvokeFailed(InvokeError::UserCodeFailed(ref msg)) if msg.contains("step budget")
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invoke_timeout_cancels_runaway_code() {
    let h = harness_with(
        common::config().with_invoke_timeout(Duration::from_millis(100)),
        ImageLoader::new().with_step_budget(u64::MAX),
    );
    let run = h
        .service
        .compile_and_run("pub type Program { fn GetString() { loop { } } }")
        .await;
    assert!(matches!(
        run.outcome,
        RunOutcome::InvokeFailed(InvokeError::Timeout { after }) if after == Duration::from_millis(100)
    ));

    // The cancelled attempt does not wedge the service.
    let next = h.service.compile_and_run(HELLO).await;
    assert_eq!(next.output(), Some("hello"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_are_serialized() {
    let h = Arc::new(harness());
    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.service.compile_and_run(HELLO).await })
        })
        .collect();

    let mut attempts = Vec::new();
    for task in tasks {
        let report = task.await.unwrap();
        assert_eq!(report.output(), Some("hello"));
        assert_eq!(report.log.len(), 2);
        attempts.push(report.attempt.raw());
    }
    attempts.sort_unstable();
    assert_eq!(attempts, vec![1, 2, 3, 4]);
    assert_eq!(h.counts.parses(), 4);
    assert_eq!(h.fetcher.fetch_count("Twilio"), 1);
}
