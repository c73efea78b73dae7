//! Source locations for IR declarations
//!
//! Declarations keep the offsets of the syntax they were created from. Lowering
//! passes also synthesize declarations that have no source at all; those carry
//! [`Span::UNDEFINED`] so diagnostics can tell the two apart.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A unique identifier for a source file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// File id used for declarations produced by the compiler itself.
    pub const SYNTHETIC: Self = Self(u32::MAX);

    /// Creates a file id from its raw index
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Whether this id refers to no real file
    #[must_use]
    pub const fn is_synthetic(self) -> bool {
        self.0 == u32::MAX
    }
}

/// A byte offset span in a source file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Offset of the first byte
    pub start: u32,
    /// Offset one past the last byte
    pub end: u32,
}

impl Span {
    /// Offsets of a declaration that does not originate from source text.
    pub const UNDEFINED: Self = Self {
        start: u32::MAX,
        end: u32::MAX,
    };

    /// Creates a span, swapping the bounds if they arrive reversed
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Whether these offsets point into real source text
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.start != u32::MAX
    }

    /// Byte range of the span, `None` for undefined offsets
    #[must_use]
    pub fn range(&self) -> Option<Range<usize>> {
        self.is_defined()
            .then(|| self.start as usize..self.end as usize)
    }

    /// Length in bytes; undefined spans are empty
    #[must_use]
    pub const fn len(&self) -> u32 {
        if self.is_defined() {
            self.end - self.start
        } else {
            0
        }
    }

    /// Whether the span covers no bytes
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both inputs; undefined spans are ignored
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        match (self.is_defined(), other.is_defined()) {
            (true, true) => Self::new(self.start.min(other.start), self.end.max(other.end)),
            (true, false) => self,
            (false, _) => other,
        }
    }
}

/// A span with associated file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileSpan {
    /// File the offsets belong to
    pub file: FileId,
    /// Offsets inside the file
    pub span: Span,
}

impl FileSpan {
    /// Location of compiler-generated declarations
    pub const SYNTHETIC: Self = Self {
        file: FileId::SYNTHETIC,
        span: Span::UNDEFINED,
    };

    /// Creates a span inside `file`
    #[must_use]
    pub const fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }

    /// Whether this location points at real source
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.file.is_synthetic() || !self.span.is_defined()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_bounds_are_normalized() {
        let span = Span::new(10, 4);
        assert_eq!(span, Span { start: 4, end: 10 });
        assert_eq!(span.len(), 6);
    }

    #[test]
    fn test_undefined_span_has_no_range() {
        assert!(!Span::UNDEFINED.is_defined());
        assert!(Span::UNDEFINED.is_empty());
        assert_eq!(Span::UNDEFINED.range(), None);
        assert!(FileSpan::SYNTHETIC.is_synthetic());
    }

    #[test]
    fn test_cover_ignores_undefined() {
        let span = Span::new(3, 5);
        assert_eq!(span.cover(Span::UNDEFINED), span);
        assert_eq!(Span::UNDEFINED.cover(span), span);
        assert_eq!(span.cover(Span::new(8, 9)), Span::new(3, 9));
    }
}
