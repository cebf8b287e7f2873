use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::LIBRARY_EXTENSION;

/// Canonical name of a reference library, e.g. `Twilio`.
///
/// Surrounding whitespace and a trailing `.qlib` extension (any case) are
/// stripped, so `" Twilio.QLIB "` and `"Twilio"` name the same library.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ReferenceName(Arc<str>);

impl ReferenceName {
    /// Canonicalize a raw name. Returns `None` if nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let suffix_len = LIBRARY_EXTENSION.len() + 1;
        let stem = trimmed
            .len()
            .checked_sub(suffix_len)
            .and_then(|split| {
                let (stem, ext) = (trimmed.get(..split)?, trimmed.get(split..)?);
                let is_ext = ext.starts_with('.') && ext[1..].eq_ignore_ascii_case(LIBRARY_EXTENSION);
                is_ext.then_some(stem)
            })
            .unwrap_or(trimmed)
            .trim_end();
        if stem.is_empty() {
            None
        } else {
            Some(ReferenceName(Arc::from(stem)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the library image, e.g. `Twilio.qlib`.
    pub fn file_name(&self) -> String {
        format!("{}.{LIBRARY_EXTENSION}", self.0)
    }
}

impl Borrow<str> for ReferenceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceName({:?})", &*self.0)
    }
}

impl fmt::Display for ReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
