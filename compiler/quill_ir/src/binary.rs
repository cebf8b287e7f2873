//! Opaque emitted bytes.

use std::fmt;
use std::sync::Arc;

/// The emitted, loadable output of a successful compilation.
///
/// The orchestrator never looks inside; only the backend that produced it
/// and the loader that consumes it agree on the format.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BinaryModule {
    bytes: Arc<[u8]>,
}

impl BinaryModule {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        BinaryModule {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for BinaryModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryModule({} bytes)", self.bytes.len())
    }
}

impl From<Vec<u8>> for BinaryModule {
    fn from(bytes: Vec<u8>) -> Self {
        BinaryModule::from_bytes(bytes)
    }
}
