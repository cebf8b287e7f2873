//! Process-lifetime storage for loaded modules.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use quill_ir::AttemptId;
use rustc_hash::FxHashMap;

use crate::LoadedModule;

/// A loaded module tagged with the attempt that produced it.
#[derive(Clone)]
pub struct LoadedHandle {
    attempt: AttemptId,
    module: Arc<dyn LoadedModule>,
}

impl LoadedHandle {
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn module(&self) -> &dyn LoadedModule {
        &*self.module
    }

    pub fn name(&self) -> &str {
        self.module.name()
    }
}

impl fmt::Debug for LoadedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedHandle")
            .field("attempt", &self.attempt)
            .field("module", &self.module.name())
            .finish()
    }
}

/// Every module loaded by the service, keyed by attempt.
///
/// Entries are never removed; a module stays resident for the life of the
/// process, like an assembly loaded into a runtime that cannot unload.
#[derive(Default)]
pub struct ModuleArena {
    modules: RwLock<FxHashMap<AttemptId, Arc<dyn LoadedModule>>>,
}

impl ModuleArena {
    pub fn new() -> Self {
        ModuleArena::default()
    }

    /// Retain `module` for `attempt`. A second insert for the same attempt
    /// keeps the first module.
    pub fn insert(&self, attempt: AttemptId, module: Arc<dyn LoadedModule>) -> LoadedHandle {
        let mut modules = self.modules.write();
        let module = Arc::clone(modules.entry(attempt).or_insert(module));
        tracing::debug!(%attempt, resident = modules.len(), "module retained");
        LoadedHandle { attempt, module }
    }

    pub fn get(&self, attempt: AttemptId) -> Option<LoadedHandle> {
        self.modules
            .read()
            .get(&attempt)
            .map(|module| LoadedHandle {
                attempt,
                module: Arc::clone(module),
            })
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    /// Resident attempts in ascending order.
    pub fn attempts(&self) -> Vec<AttemptId> {
        let mut ids: Vec<AttemptId> = self.modules.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for ModuleArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleArena")
            .field("resident", &self.len())
            .finish()
    }
}
