//! Position index over an immutable source text.
//!
//! Lines are 1-based, columns are 0-based byte offsets within the line.

use crate::boundary::Span;
use serde::{Deserialize, Serialize};

/// A line/column location in a source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Source text plus its newline-offset table
#[derive(Debug, Clone)]
pub struct SourceText<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { text, line_starts }
    }

    pub const fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of lines, counting a trailing empty line after a final newline
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line containing `offset` (offsets past the end map to the last line)
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Byte offset to line/column; `None` past end-of-text
    pub fn position(&self, offset: usize) -> Option<Position> {
        if offset > self.text.len() {
            return None;
        }
        let line = self.line_of(offset);
        Some(Position::new(line, offset - self.line_starts[line - 1]))
    }

    /// Line/column to byte offset.
    ///
    /// `None` when the line is outside the text, the column runs past the end of
    /// its line, the offset is at or beyond end-of-text, or it splits a character.
    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        if line == 0 || line > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let line_end = self
            .line_starts
            .get(line)
            .map_or(self.text.len(), |next| next - 1);
        if column > line_end - start {
            return None;
        }
        let offset = start + column;
        if offset >= self.text.len() || !self.text.is_char_boundary(offset) {
            return None;
        }
        Some(offset)
    }

    /// First and last line touched by `span`
    pub fn line_range(&self, span: Span) -> (usize, usize) {
        let start_line = self.line_of(span.start);
        let end_line = self.line_of(span.end.min(self.text.len())).max(start_line);
        (start_line, end_line)
    }

    /// Text covered by `span`; empty when the span does not fit the text
    pub fn slice(&self, span: Span) -> &'a str {
        self.text.get(span.start..span.end).unwrap_or("")
    }
}

/// Keep the first `max_chars` characters, appending "..." when anything was cut
pub fn elide(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Keep the first `max_chars` characters and always append "..."
pub fn elide_always(text: &str, max_chars: usize) -> String {
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(idx, _)| idx);
    format!("{}...", &text[..cut])
}
