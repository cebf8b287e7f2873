//! Dynamic loading and entry-point invocation.
//!
//! The compile service hands an emitted [`BinaryModule`] to a
//! [`ModuleLoader`], retains the result in a [`ModuleArena`], and runs it
//! through [`EntryPoint`]. Loaders expose a reflection-style view of the
//! module (exported types, constructors, methods) and nothing else.
//!
//! Untrusted code runs behind two guards: a [`CancelFlag`] the loader polls,
//! and `catch_unwind` at the [`EntryPoint`] boundary so a panicking loader
//! never takes the host down.

mod arena;
mod cancel;
mod entry;
mod error;
mod image_loader;

use std::fmt;
use std::sync::Arc;

use quill_ir::{BinaryModule, Value};

pub use arena::{LoadedHandle, ModuleArena};
pub use cancel::CancelFlag;
pub use entry::{invoke_entry_point, EntryPoint, ENTRY_METHOD, ENTRY_TYPE};
pub use error::{InvokeError, LoadError, UserFault};
pub use image_loader::{ImageLoader, DEFAULT_STEP_BUDGET};

/// Turns emitted bytes into a loaded module.
pub trait ModuleLoader: Send + Sync + 'static {
    fn load(&self, module: &BinaryModule) -> Result<Arc<dyn LoadedModule>, LoadError>;
}

/// A module resident in the process.
pub trait LoadedModule: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Exported types in declaration order. Names may repeat; the entry
    /// point check counts them.
    fn exported_types(&self) -> Vec<Arc<dyn ExportedType>>;
}

/// Reflection handle for one exported type.
pub trait ExportedType: Send + Sync {
    fn name(&self) -> &str;

    fn has_constructor(&self, arity: usize) -> bool;

    fn has_method(&self, name: &str, arity: usize) -> bool;

    /// Run the zero-argument constructor.
    fn construct(&self, cancel: &CancelFlag) -> Result<Box<dyn Instance>, UserFault>;
}

/// A constructed object.
pub trait Instance: Send {
    /// Call a zero-argument method.
    fn call(&mut self, method: &str, cancel: &CancelFlag) -> Result<Value, UserFault>;
}
