//! Source positions attached to AST nodes.
//!
//! A [`Span`] is a half-open byte range into a source buffer. A [`Location`]
//! resolves a span against a named source: it carries the file name, the
//! 1-based row and byte column of the span start, and gives access to the
//! exact source text the node was built from.

use std::{fmt, ops::Range, sync::Arc};

use serde::{Serialize, Serializer, ser::SerializeStruct};

/// Half-open byte range `start..end` into a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Get the span as a byte range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range)
    }
}

/// Position of an AST node in its source.
///
/// Locations are created once by the parser and never mutated. The file name
/// and source buffer are shared, so cloning a location is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    file: Arc<str>,
    source: Arc<str>,
    span: Span,
    row: usize,
    col: usize,
}

impl Location {
    /// Create a location for `span` inside `source`.
    ///
    /// `row` and `col` are 1-based; `col` counts bytes from the start of the line.
    ///
    /// # Panics
    ///
    /// Panics if `span` is not a valid char-boundary range of `source`.
    pub fn new(file: Arc<str>, source: Arc<str>, span: Span, row: usize, col: usize) -> Self {
        assert!(
            source.get(span.range()).is_some(),
            "location span {:?} out of bounds",
            span
        );
        Self {
            file,
            source,
            span,
            row,
            col,
        }
    }

    /// Name of the source the node came from.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Exact source text covered by the node.
    pub fn text(&self) -> &str {
        &self.source[self.span.range()]
    }

    /// Byte span of the node.
    pub fn span(&self) -> Span {
        self.span
    }

    /// 1-based line number.
    pub fn row(&self) -> usize {
        self.row
    }

    /// 1-based byte column.
    pub fn col(&self) -> usize {
        self.col
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.row, self.col)
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Location", 4)?;
        state.serialize_field("file", self.file())?;
        state.serialize_field("row", &self.row)?;
        state.serialize_field("col", &self.col)?;
        state.serialize_field("text", self.text())?;
        state.end()
    }
}
