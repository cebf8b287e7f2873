//! The fixed `Program.GetString()` entry point.
//!
//! [`EntryPoint::resolve`] checks the module's symbol table before any user
//! code runs: exactly one exported `Program`, a zero-argument constructor,
//! a zero-argument `GetString`. [`EntryPoint::invoke`] then constructs and
//! calls, converting a panic at either step into the matching
//! [`InvokeError`].

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::{CancelFlag, ExportedType, InvokeError, LoadedModule};

pub const ENTRY_TYPE: &str = "Program";
pub const ENTRY_METHOD: &str = "GetString";

/// A type that passed the entry-point capability check.
pub struct EntryPoint {
    program: Arc<dyn ExportedType>,
}

impl EntryPoint {
    pub fn resolve(module: &dyn LoadedModule) -> Result<Self, InvokeError> {
        let mut candidates: Vec<Arc<dyn ExportedType>> = module
            .exported_types()
            .into_iter()
            .filter(|ty| ty.name() == ENTRY_TYPE)
            .collect();
        if candidates.len() != 1 {
            return Err(InvokeError::AmbiguousOrMissingEntryType {
                found: candidates.len(),
            });
        }
        let program = candidates.remove(0);

        if !program.has_constructor(0) {
            return Err(InvokeError::ConstructionFailed(format!(
                "`{ENTRY_TYPE}` has no zero-argument constructor"
            )));
        }
        if !program.has_method(ENTRY_METHOD, 0) {
            return Err(InvokeError::MissingMethod {
                type_name: ENTRY_TYPE.to_string(),
                method: ENTRY_METHOD.to_string(),
            });
        }
        Ok(EntryPoint { program })
    }

    /// Construct `Program` and call `GetString`.
    ///
    /// `Ok(None)` means the method returned `none`: a valid run with no
    /// output.
    pub fn invoke(&self, cancel: &CancelFlag) -> Result<Option<String>, InvokeError> {
        let mut instance = match catch_unwind(AssertUnwindSafe(|| self.program.construct(cancel)))
        {
            Ok(Ok(instance)) => instance,
            Ok(Err(fault)) => return Err(InvokeError::ConstructionFailed(fault.to_string())),
            Err(payload) => {
                return Err(InvokeError::ConstructionFailed(panic_message(&*payload)));
            }
        };
        tracing::debug!("entry type constructed");

        match catch_unwind(AssertUnwindSafe(|| instance.call(ENTRY_METHOD, cancel))) {
            Ok(Ok(value)) => Ok(value.to_text()),
            Ok(Err(fault)) => Err(InvokeError::UserCodeFailed(fault.to_string())),
            Err(payload) => Err(InvokeError::UserCodeFailed(panic_message(&*payload))),
        }
    }
}

/// Resolve and invoke in one step.
pub fn invoke_entry_point(
    module: &dyn LoadedModule,
    cancel: &CancelFlag,
) -> Result<Option<String>, InvokeError> {
    EntryPoint::resolve(module)?.invoke(cancel)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
