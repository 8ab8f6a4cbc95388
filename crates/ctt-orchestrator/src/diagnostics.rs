//! Diagnostic collection, grouping by source file, and translation to the
//! LSP wire format — generalizing the teacher's `convert_errors`, which maps
//! one error kind to one `Diagnostic`, to route by URI across many files at
//! once.

use ctt_base::Span;
use std::collections::HashMap;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity as LspSeverity, Position, Range, Url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl Severity {
    fn to_lsp(self) -> LspSeverity {
        match self {
            Severity::Error => LspSeverity::ERROR,
            Severity::Warning => LspSeverity::WARNING,
            Severity::Information => LspSeverity::INFORMATION,
            Severity::Hint => LspSeverity::HINT,
        }
    }
}

/// A single problem found while processing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub range: Span,
    pub severity: Severity,
    pub message: String,
}

/// Converts a byte offset into a line/column `Position`, needed to turn a
/// `Span` (byte-offset based) into an LSP `Range` (line/column based).
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineIndex { line_starts }
    }

    pub fn position(&self, offset: u32) -> Position {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => Position::new(line as u32, 0),
            Err(insertion) => {
                let line = insertion - 1;
                let col = offset - self.line_starts[line];
                Position::new(line as u32, col)
            }
        }
    }

    /// The inverse of [`position`](Self::position): a line/column back to a
    /// byte offset.
    pub fn offset_of(&self, position: Position) -> u32 {
        let line_start = self
            .line_starts
            .get(position.line as usize)
            .copied()
            .unwrap_or_else(|| *self.line_starts.last().unwrap());
        line_start + position.character
    }
}

fn problem_to_diagnostic(problem: &Problem, line_index: &LineIndex) -> Diagnostic {
    Diagnostic {
        range: Range {
            start: line_index.position(problem.range.start),
            end: line_index.position(problem.range.end),
        },
        severity: Some(problem.severity.to_lsp()),
        source: Some("ctt".to_string()),
        message: problem.message.clone(),
        ..Default::default()
    }
}

/// Buffers problems per-URI until they're ready to be published, the same
/// role the teacher's `ServerState`/`diagnostics.rs` pairing plays together.
#[derive(Debug, Default)]
pub struct BufferReporter {
    by_uri: HashMap<Url, Vec<Problem>>,
}

impl BufferReporter {
    pub fn new() -> Self {
        BufferReporter::default()
    }

    pub fn report(&mut self, uri: Url, problem: Problem) {
        self.by_uri.entry(uri).or_default().push(problem);
    }

    /// Clears and returns every problem recorded for `uri`, ready to publish.
    pub fn take(&mut self, uri: &Url) -> Vec<Problem> {
        self.by_uri.remove(uri).unwrap_or_default()
    }

    pub fn to_lsp_diagnostics(&self, uri: &Url, source: &str) -> Vec<Diagnostic> {
        let line_index = LineIndex::new(source);
        self.by_uri
            .get(uri)
            .map(|problems| problems.iter().map(|p| problem_to_diagnostic(p, &line_index)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_finds_the_right_line_and_column() {
        let index = LineIndex::new("ab\ncd\nef");
        assert_eq!(index.position(0), Position::new(0, 0));
        assert_eq!(index.position(3), Position::new(1, 0));
        assert_eq!(index.position(5), Position::new(1, 2));
        assert_eq!(index.position(7), Position::new(2, 1));
    }

    #[test]
    fn offset_of_inverts_position() {
        let index = LineIndex::new("ab\ncd\nef");
        let pos = index.position(5);
        assert_eq!(index.offset_of(pos), 5);
    }

    #[test]
    fn reporter_groups_problems_by_uri() {
        let mut reporter = BufferReporter::new();
        let uri = Url::parse("file:///a.ctt").unwrap();
        reporter.report(
            uri.clone(),
            Problem {
                range: Span::point(0),
                severity: Severity::Error,
                message: "oops".to_string(),
            },
        );
        let taken = reporter.take(&uri);
        assert_eq!(taken.len(), 1);
        assert!(reporter.take(&uri).is_empty());
    }
}
