use std::fmt;

/// Identity of one compile attempt, assigned by the compile service.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct AttemptId(u64);

impl AttemptId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        AttemptId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
