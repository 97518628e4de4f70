//! The [`TextBuffer`] trait defining the text-storage seam.
//!
//! The diff engine never owns document text; it reads lines and (for merge
//! operations) replaces line ranges through this trait. The real editor
//! buffer implements it; [`MemoryBuffer`] is the in-memory implementation
//! intended for tests and embedding.

use std::sync::{Arc, Mutex};

use crate::hunk::LineNum;

/// Shared handle to a participating document's text.
pub type SharedBuffer = Arc<Mutex<dyn TextBuffer>>;

/// Line-oriented access to one document's text.
///
/// Line numbers are 1-based throughout. Implementations must tolerate
/// out-of-range line numbers by returning `None` / empty rather than
/// panicking: the engine is defensive about stale block lists.
pub trait TextBuffer: Send {
    /// Number of lines in the document. An empty document has one empty line.
    fn line_count(&self) -> LineNum;

    /// The text of line `lnum`, without a trailing newline.
    ///
    /// Returns `None` when `lnum` is out of range.
    fn line(&self, lnum: LineNum) -> Option<String>;

    /// The lines of the closed range `[first, last]`, clamped to the
    /// document.
    fn lines(&self, first: LineNum, last: LineNum) -> Vec<String> {
        let mut out = Vec::new();
        let mut lnum = first.max(1);
        while lnum <= last {
            match self.line(lnum) {
                Some(text) => out.push(text),
                None => break,
            }
            lnum += 1;
        }
        out
    }

    /// Replace the closed range `[first, last]` with `replacement`.
    ///
    /// `last < first` encodes a pure insertion above `first`. The caller is
    /// responsible for reporting the matching edit to the diff engine.
    fn replace_lines(&mut self, first: LineNum, last: LineNum, replacement: Vec<String>);

    /// The whole document joined with `\n`, with a trailing newline.
    fn text(&self) -> String {
        let mut out = String::new();
        for lnum in 1..=self.line_count() {
            if let Some(line) = self.line(lnum) {
                out.push_str(&line);
            }
            out.push('\n');
        }
        out
    }
}

/// Growable in-memory text buffer backed by a `Vec<String>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryBuffer {
    lines: Vec<String>,
}

impl MemoryBuffer {
    /// Create a buffer from pre-split lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Create a buffer by splitting `text` on `\n`, accepting `\r\n` too.
    ///
    /// A trailing newline does not produce a final empty line.
    pub fn from_text(text: &str) -> Self {
        let body = text.strip_suffix('\n').unwrap_or(text);
        let lines = body
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        Self { lines }
    }

    /// Wrap this buffer in the shared handle the engine consumes.
    pub fn into_shared(self) -> SharedBuffer {
        Arc::new(Mutex::new(self))
    }

    /// Borrow the underlying lines.
    pub fn as_lines(&self) -> &[String] {
        &self.lines
    }
}

impl TextBuffer for MemoryBuffer {
    fn line_count(&self) -> LineNum {
        self.lines.len().max(1) as LineNum
    }

    fn line(&self, lnum: LineNum) -> Option<String> {
        if lnum < 1 {
            return None;
        }
        if self.lines.is_empty() && lnum == 1 {
            return Some(String::new());
        }
        self.lines.get(lnum as usize - 1).cloned()
    }

    fn replace_lines(&mut self, first: LineNum, last: LineNum, replacement: Vec<String>) {
        let first = first.max(1) as usize - 1;
        if last < first as LineNum + 1 {
            // Pure insertion above `first`.
            let at = first.min(self.lines.len());
            self.lines.splice(at..at, replacement);
            return;
        }
        let last = (last as usize).min(self.lines.len());
        let first = first.min(last);
        self.lines.splice(first..last, replacement);
    }
}
