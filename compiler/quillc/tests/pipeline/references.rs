//! Reference resolution as seen through the service.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_diagnostic::StageMarker;
use quill_loader::ImageLoader;
use quill_refs::{MemoryFetcher, ReferenceFetcher};
use quillc::{AttemptState, CompileService, ServiceConfig};

use crate::common::{self, harness, name, RecordingBackend, StageCounts, HELLO};

#[tokio::test]
async fn warm_up_twice_fetches_once() {
    let h = harness();
    let first = h.service.warm_up().await;
    let second = h.service.warm_up().await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert!(first.contains("Twilio"));
    assert_eq!(h.fetcher.fetch_count("Twilio"), 1);
}

#[tokio::test]
async fn compiles_reuse_the_cached_catalog() {
    let h = harness();
    for _ in 0..3 {
        h.service.compile(HELLO).await;
    }
    assert_eq!(h.fetcher.fetch_count("Twilio"), 1);
    assert_eq!(h.fetcher.total_fetches(), 1);
}

#[tokio::test]
async fn missing_reference_is_skipped_not_fatal() {
    let fetcher = common::fetcher();
    let service = CompileService::new(
        RecordingBackend::new(StageCounts::default()),
        ImageLoader::new(),
        fetcher.clone() as Arc<dyn ReferenceFetcher>,
        common::config().with_reference(name("Xml")),
    );

    let catalog = service.warm_up().await;
    assert_eq!(catalog.len(), 1);
    let failures = service.resolver().failures().await;
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.as_str(), "Xml");

    // Code that does not need the missing library still runs.
    let run = service.compile_and_run(HELLO).await;
    assert_eq!(run.output(), Some("hello"));

    // Code that does sees an ordinary compiler diagnostic.
    let report = service
        .compile("import Xml;\npub type Program { fn GetString() { return none; } }")
        .await;
    assert_eq!(report.state, AttemptState::EmitFailed);
    assert_eq!(report.log.last_marker(), Some(StageMarker::EmitFailed));
    assert!(report.log.render().contains("error Q2001: unresolved import `Xml`"));

    // The failed name is never refetched.
    assert_eq!(fetcher.fetch_count("Xml"), 1);
}

#[tokio::test]
async fn no_references_configured() {
    let service = CompileService::new(
        RecordingBackend::new(StageCounts::default()),
        ImageLoader::new(),
        Arc::new(MemoryFetcher::new()),
        ServiceConfig::default(),
    );
    assert!(service.warm_up().await.is_empty());
    let run = service
        .compile_and_run("import Twilio;\npub type Program { fn GetString() { return Twilio.Name; } }")
        .await;
    assert_eq!(run.state, AttemptState::EmitFailed);
}
