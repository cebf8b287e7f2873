//! Reference catalog for the Quill playground.
//!
//! The compiler backend resolves `import`ed libraries against a catalog of
//! reference images. Those images are fetched by canonical name through a
//! [`ReferenceFetcher`] and cached by a [`ReferenceResolver`] for the life of
//! the process:
//!
//! - each name is fetched at most once, whether the fetch succeeded or not
//! - a failed name is skipped, never fatal to the whole resolution
//! - concurrent first-time requests are serialized behind one lock, so no
//!   fetch is ever duplicated
//!
//! There is no invalidation; the reference set is static configuration.

mod catalog;
mod fetch;
mod name;
mod resolver;

pub use catalog::{ReferenceCatalog, ReferenceModule};
pub use fetch::{DirectoryFetcher, FetchError, MemoryFetcher, ReferenceFetcher, LIBRARY_EXTENSION};
pub use name::ReferenceName;
pub use resolver::{ReferenceResolver, DEFAULT_FETCH_TIMEOUT};
