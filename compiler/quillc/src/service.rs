//! The compile-and-run orchestrator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quill_backend::CompilerBackend;
use quill_diagnostic::{Diagnostic, DiagnosticLog, StageMarker};
use quill_ir::{AttemptId, BinaryModule, SourceUnit};
use quill_loader::{
    invoke_entry_point, CancelFlag, InvokeError, LoadError, LoadedHandle, ModuleArena, ModuleLoader,
};
use quill_refs::{ReferenceCatalog, ReferenceFetcher, ReferenceResolver};
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;
use tokio::time::{timeout, timeout_at, Instant};

use crate::{AttemptState, CompileOutcome, CompileReport, RunOutcome, RunReport, ServiceConfig};

/// One shared instance serves every request.
///
/// Attempts are serialized behind a gate. Within an attempt, parse, emit,
/// load and invoke run on the blocking pool under their configured
/// timeouts; reference resolution is the only stage that suspends on I/O.
pub struct CompileService<B: CompilerBackend, L: ModuleLoader> {
    backend: Arc<B>,
    loader: Arc<L>,
    resolver: ReferenceResolver,
    arena: ModuleArena,
    config: ServiceConfig,
    gate: Mutex<()>,
    next_attempt: AtomicU64,
}

/// Per-attempt bookkeeping: the transcript and where we are.
struct Attempt {
    id: AttemptId,
    log: DiagnosticLog,
    state: AttemptState,
}

impl Attempt {
    fn enter(&mut self, state: AttemptState) {
        tracing::debug!(attempt = %self.id, from = %self.state, to = %state, "attempt state");
        self.state = state;
    }

    fn fail_stage(&mut self, message: String, marker: StageMarker, state: AttemptState) {
        self.log.push(Diagnostic::error(message));
        self.log.mark(marker);
        self.enter(state);
    }

    fn into_compile(self, outcome: CompileOutcome) -> CompileReport {
        CompileReport {
            attempt: self.id,
            log: self.log,
            state: self.state,
            outcome,
        }
    }
}

impl<B: CompilerBackend, L: ModuleLoader> CompileService<B, L> {
    pub fn new(
        backend: B,
        loader: L,
        fetcher: Arc<dyn ReferenceFetcher>,
        config: ServiceConfig,
    ) -> Self {
        CompileService {
            backend: Arc::new(backend),
            loader: Arc::new(loader),
            resolver: ReferenceResolver::new(fetcher).with_fetch_timeout(config.fetch_timeout),
            arena: ModuleArena::new(),
            config,
            gate: Mutex::new(()),
            next_attempt: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Every module this service has loaded.
    pub fn arena(&self) -> &ModuleArena {
        &self.arena
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Resolve the configured references before the first request.
    pub async fn warm_up(&self) -> ReferenceCatalog {
        self.resolver.resolve(&self.config.references).await
    }

    /// Parse, emit and load `source`.
    pub async fn compile(&self, source: impl Into<SourceUnit>) -> CompileReport {
        let _gate = self.gate.lock().await;
        self.compile_locked(source.into()).await
    }

    /// Compile `source`, then run its `Program.GetString()`.
    pub async fn compile_and_run(&self, source: impl Into<SourceUnit>) -> RunReport {
        let _gate = self.gate.lock().await;
        let report = self.compile_locked(source.into()).await;
        let mut attempt = Attempt {
            id: report.attempt,
            log: report.log,
            state: report.state,
        };
        let outcome = match report.outcome {
            CompileOutcome::NotProduced => RunOutcome::NotCompiled,
            CompileOutcome::LoadFailed(err) => RunOutcome::LoadFailed(err),
            CompileOutcome::Loaded(handle) => {
                attempt.enter(AttemptState::Invoking);
                match self.invoke(handle).await {
                    Ok(text) => {
                        attempt.enter(AttemptState::Succeeded);
                        RunOutcome::Succeeded(text)
                    }
                    Err(err) => {
                        tracing::debug!(attempt = %attempt.id, error = %err, "invoke failed");
                        attempt.enter(AttemptState::InvokeFailed);
                        RunOutcome::InvokeFailed(err)
                    }
                }
            }
        };
        RunReport {
            attempt: attempt.id,
            log: attempt.log,
            state: attempt.state,
            outcome,
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    async fn compile_locked(&self, source: SourceUnit) -> CompileReport {
        let id = AttemptId::new(self.next_attempt.fetch_add(1, Ordering::Relaxed));
        let mut attempt = Attempt {
            id,
            log: DiagnosticLog::new(),
            state: AttemptState::Start,
        };

        let references = self.resolver.resolve(&self.config.references).await;
        let deadline = Instant::now() + self.config.compile_timeout;

        attempt.enter(AttemptState::Parsing);
        let backend = Arc::clone(&self.backend);
        let options = self.config.parse_options();
        let parse = spawn_blocking(move || backend.parse(&source, &options));
        let parsed = match timeout_at(deadline, parse).await {
            Ok(Ok(parsed)) => parsed,
            Ok(Err(join)) => {
                attempt.fail_stage(
                    format!("parse stage aborted: {join}"),
                    StageMarker::ParseFailed,
                    AttemptState::ParseFailed,
                );
                return attempt.into_compile(CompileOutcome::NotProduced);
            }
            Err(_) => {
                attempt.fail_stage(
                    timed_out("parse", self.config.compile_timeout),
                    StageMarker::ParseFailed,
                    AttemptState::ParseFailed,
                );
                return attempt.into_compile(CompileOutcome::NotProduced);
            }
        };

        let parse_failed = parsed.has_errors();
        attempt.log.extend(parsed.diagnostics);
        if parse_failed {
            attempt.log.mark(StageMarker::ParseFailed);
            attempt.enter(AttemptState::ParseFailed);
            return attempt.into_compile(CompileOutcome::NotProduced);
        }
        attempt.log.mark(StageMarker::ParseSucceeded);

        attempt.enter(AttemptState::Emitting);
        let backend = Arc::clone(&self.backend);
        let options = self.config.emit_options();
        let syntax = parsed.syntax;
        let emit = spawn_blocking(move || backend.emit(&syntax, &references, &options));
        let module = match timeout_at(deadline, emit).await {
            Ok(Ok(Ok(emitted))) => {
                attempt.log.extend(emitted.diagnostics);
                attempt.log.mark(StageMarker::EmitSucceeded);
                emitted.module
            }
            Ok(Ok(Err(failure))) => {
                attempt.log.extend(failure.diagnostics);
                attempt.log.mark(StageMarker::EmitFailed);
                attempt.enter(AttemptState::EmitFailed);
                return attempt.into_compile(CompileOutcome::NotProduced);
            }
            Ok(Err(join)) => {
                attempt.fail_stage(
                    format!("emit stage aborted: {join}"),
                    StageMarker::EmitFailed,
                    AttemptState::EmitFailed,
                );
                return attempt.into_compile(CompileOutcome::NotProduced);
            }
            Err(_) => {
                attempt.fail_stage(
                    timed_out("compilation", self.config.compile_timeout),
                    StageMarker::EmitFailed,
                    AttemptState::EmitFailed,
                );
                return attempt.into_compile(CompileOutcome::NotProduced);
            }
        };

        match self.load(id, module).await {
            Ok(handle) => {
                attempt.enter(AttemptState::Loaded);
                attempt.into_compile(CompileOutcome::Loaded(handle))
            }
            Err(err) => {
                tracing::debug!(attempt = %id, error = %err, "load failed");
                attempt.enter(AttemptState::LoadFailed);
                attempt.into_compile(CompileOutcome::LoadFailed(err))
            }
        }
    }

    async fn load(&self, id: AttemptId, module: BinaryModule) -> Result<LoadedHandle, LoadError> {
        let loader = Arc::clone(&self.loader);
        let after = self.config.load_timeout;
        let loaded = match timeout(after, spawn_blocking(move || loader.load(&module))).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join)) => return Err(LoadError::Rejected(join.to_string())),
            Err(_) => return Err(LoadError::Timeout { after }),
        };
        Ok(self.arena.insert(id, loaded))
    }

    async fn invoke(&self, handle: LoadedHandle) -> Result<Option<String>, InvokeError> {
        let cancel = CancelFlag::new();
        let flag = cancel.clone();
        let after = self.config.invoke_timeout;
        let task = spawn_blocking(move || invoke_entry_point(handle.module(), &flag));
        match timeout(after, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(InvokeError::UserCodeFailed(join.to_string())),
            Err(_) => {
                // The task keeps running until the loader notices the flag.
                cancel.cancel();
                Err(InvokeError::Timeout { after })
            }
        }
    }
}

fn timed_out(stage: &str, after: Duration) -> String {
    format!("{stage} timed out after {}ms", after.as_millis())
}
