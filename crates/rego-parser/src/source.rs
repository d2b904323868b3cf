//! Named source text and span to row/column resolution.

use std::sync::Arc;

use rego_core::{Location, Span};

/// A source buffer together with its name and line index.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: Arc<str>,
    text: Arc<str>,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            name: Arc::from(name),
            text: Arc::from(text),
            line_starts: line_starts(text),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based row and byte column of `offset`.
    pub fn row_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Resolve a span of this source into a [`Location`].
    pub fn location(&self, span: Span) -> Location {
        let (row, col) = self.row_col(span.start());
        Location::new(
            Arc::clone(&self.name),
            Arc::clone(&self.text),
            span,
            row,
            col,
        )
    }

    /// Empty span at the end of the text.
    pub fn end_span(&self) -> Span {
        Span::new(self.text.len()..self.text.len())
    }
}

/// Lines end at `\n`, `\r\n` or a lone `\r`.
fn line_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = vec![0];
    for (i, byte) in bytes.iter().enumerate() {
        match byte {
            b'\n' => starts.push(i + 1),
            b'\r' if bytes.get(i + 1) != Some(&b'\n') => starts.push(i + 1),
            _ => {}
        }
    }
    starts
}
