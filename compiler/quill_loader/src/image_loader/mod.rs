//! Loader for `QMOD` module images.
//!
//! Loading decodes the image once; types and instances share it through an
//! `Arc`. Method bodies run on a small tree-walking [`Machine`] that checks
//! the cancel flag and a step budget on every step.

mod machine;

use std::fmt;
use std::sync::Arc;

use quill_ir::{BinaryModule, MethodDef, ModuleImage, Value};
use rustc_hash::FxHashMap;

use crate::{CancelFlag, ExportedType, Instance, LoadError, LoadedModule, ModuleLoader, UserFault};
use machine::Machine;

/// Steps a single constructor or method call may take.
pub const DEFAULT_STEP_BUDGET: u64 = 1_000_000;

/// Loads module images produced by the Quill backend.
#[derive(Copy, Clone, Debug)]
pub struct ImageLoader {
    step_budget: u64,
}

impl Default for ImageLoader {
    fn default() -> Self {
        ImageLoader {
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }
}

impl ImageLoader {
    pub fn new() -> Self {
        ImageLoader::default()
    }

    #[must_use]
    pub fn with_step_budget(mut self, steps: u64) -> Self {
        self.step_budget = steps;
        self
    }

    pub fn step_budget(&self) -> u64 {
        self.step_budget
    }
}

impl ModuleLoader for ImageLoader {
    fn load(&self, module: &BinaryModule) -> Result<Arc<dyn LoadedModule>, LoadError> {
        let image = ModuleImage::decode(module.as_bytes())?;
        tracing::debug!(
            name = %image.name,
            types = image.types.len(),
            "image loaded"
        );
        Ok(Arc::new(LoadedImage {
            image: Arc::new(image),
            step_budget: self.step_budget,
        }))
    }
}

struct LoadedImage {
    image: Arc<ModuleImage>,
    step_budget: u64,
}

impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("name", &self.image.name)
            .field("types", &self.image.types.len())
            .finish()
    }
}

impl LoadedModule for LoadedImage {
    fn name(&self) -> &str {
        &self.image.name
    }

    fn exported_types(&self) -> Vec<Arc<dyn ExportedType>> {
        self.image
            .types
            .iter()
            .enumerate()
            .filter(|(_, ty)| ty.exported)
            .map(|(index, _)| {
                Arc::new(ImageType {
                    image: Arc::clone(&self.image),
                    index,
                    step_budget: self.step_budget,
                }) as Arc<dyn ExportedType>
            })
            .collect()
    }
}

/// One type of a loaded image, addressed by index.
#[derive(Clone)]
struct ImageType {
    image: Arc<ModuleImage>,
    index: usize,
    step_budget: u64,
}

impl ImageType {
    fn def(&self) -> &quill_ir::TypeDef {
        &self.image.types[self.index]
    }

    fn run(
        &self,
        method: &MethodDef,
        fields: &mut FxHashMap<String, Value>,
        cancel: &CancelFlag,
    ) -> Result<Value, UserFault> {
        Machine::new(fields, &[], cancel, self.step_budget).run(&method.body)
    }
}

impl ExportedType for ImageType {
    fn name(&self) -> &str {
        &self.def().name
    }

    fn has_constructor(&self, arity: usize) -> bool {
        u8::try_from(arity).is_ok_and(|arity| self.def().constructor(arity).is_some())
    }

    fn has_method(&self, name: &str, arity: usize) -> bool {
        u8::try_from(arity).is_ok_and(|arity| self.def().method(name, arity).is_some())
    }

    fn construct(&self, cancel: &CancelFlag) -> Result<Box<dyn Instance>, UserFault> {
        let ctor = self.def().constructor(0).ok_or_else(|| {
            UserFault::InvalidProgram(format!("`{}` has no zero-argument constructor", self.name()))
        })?;
        let mut fields = FxHashMap::default();
        self.run(ctor, &mut fields, cancel)?;
        Ok(Box::new(ImageInstance {
            ty: self.clone(),
            fields,
        }))
    }
}

struct ImageInstance {
    ty: ImageType,
    fields: FxHashMap<String, Value>,
}

impl Instance for ImageInstance {
    fn call(&mut self, method: &str, cancel: &CancelFlag) -> Result<Value, UserFault> {
        let def = self.ty.def().method(method, 0).ok_or_else(|| {
            UserFault::InvalidProgram(format!(
                "`{}` has no zero-argument method `{method}`",
                self.ty.name()
            ))
        })?;
        self.ty.run(def, &mut self.fields, cancel)
    }
}
