//! Quill IR - shared data types for the playground pipeline.
//!
//! Everything that crosses a crate boundary in the compile-and-run pipeline
//! lives here:
//!
//! - [`Span`] and [`SourceUnit`]: what the user submitted, and where in it
//! - [`BinaryModule`]: raw emitted bytes, opaque to the orchestrator
//! - [`image`]: the `QMOD` module image format shared by the emitter and loader
//! - [`Value`]: runtime values produced by invoked code
//! - [`AttemptId`]: identity of one compile attempt

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-copied types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod attempt;
mod binary;
pub mod image;
mod source;
mod span;
mod value;

pub use attempt::AttemptId;
pub use binary::BinaryModule;
pub use image::{ConstantDef, Expr, ImageError, MethodDef, ModuleImage, Stmt, TypeDef};
pub use source::SourceUnit;
pub use span::{Span, SpanError};
pub use value::Value;
