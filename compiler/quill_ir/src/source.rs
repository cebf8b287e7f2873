//! The text submitted for one compile attempt.

use std::fmt;
use std::sync::Arc;

/// Raw source text for one compile attempt.
///
/// Immutable once captured. Cloning shares the underlying buffer, so the
/// orchestrator can hand the same unit to a blocking compile task without
/// copying the text.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceUnit {
    text: Arc<str>,
}

impl SourceUnit {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        SourceUnit { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// 1-based `(line, column)` of a byte offset.
    ///
    /// Columns count characters, not bytes. Offsets past the end clamp to
    /// the position just after the last character.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = (offset as usize).min(self.text.len());
        let mut line = 1u32;
        let mut line_start = 0usize;
        for (idx, ch) in self.text.char_indices() {
            if idx >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                line_start = idx + 1;
            }
        }
        let column = self
            .text
            .get(line_start..offset)
            .map_or(0, |prefix| prefix.chars().count());
        (line, u32::try_from(column).unwrap_or(u32::MAX).saturating_add(1))
    }
}

impl fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceUnit")
            .field("len", &self.text.len())
            .finish()
    }
}

impl From<&str> for SourceUnit {
    fn from(text: &str) -> Self {
        SourceUnit::new(text)
    }
}

impl From<String> for SourceUnit {
    fn from(text: String) -> Self {
        SourceUnit::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_first_line() {
        let src = SourceUnit::from("abc");
        assert_eq!(src.line_col(0), (1, 1));
        assert_eq!(src.line_col(2), (1, 3));
    }

    #[test]
    fn test_line_col_after_newline() {
        let src = SourceUnit::from("ab\ncd\nef");
        assert_eq!(src.line_col(3), (2, 1));
        assert_eq!(src.line_col(7), (3, 2));
    }

    #[test]
    fn test_line_col_counts_chars() {
        let src = SourceUnit::from("é x");
        // `é` is two bytes; `x` sits at byte 3 but column 3.
        assert_eq!(src.line_col(3), (1, 3));
    }

    #[test]
    fn test_line_col_clamps_past_end() {
        let src = SourceUnit::from("ab");
        assert_eq!(src.line_col(99), (1, 3));
    }

    #[test]
    fn test_clone_shares_text() {
        let a = SourceUnit::from(String::from("pub type Program {}"));
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.text(), "pub type Program {}");
    }
}
