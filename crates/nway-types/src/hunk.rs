//! The pairwise hunk model: one reported difference between two documents.

use serde::{Deserialize, Serialize};

/// A 1-based line number.
pub type LineNum = i64;

/// A count of lines.
pub type LineCount = i64;

/// A contiguous region in document A replaced by a (possibly different-sized,
/// possibly empty) region in document B.
///
/// `orig_count == 0` encodes a pure insertion: `orig_start` is then the first
/// line of the region the inserted text would occupy, i.e. one past the line
/// the insertion follows. Symmetrically, `new_count == 0` encodes a pure
/// deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// First affected line in the original document (1-based).
    pub orig_start: LineNum,
    /// Number of affected lines in the original document.
    pub orig_count: LineCount,
    /// First affected line in the new document (1-based).
    pub new_start: LineNum,
    /// Number of affected lines in the new document.
    pub new_count: LineCount,
}

impl Hunk {
    /// Build a hunk from its four fields.
    pub fn new(
        orig_start: LineNum,
        orig_count: LineCount,
        new_start: LineNum,
        new_count: LineCount,
    ) -> Self {
        Self {
            orig_start,
            orig_count,
            new_start,
            new_count,
        }
    }

    /// Returns `true` if this hunk is a pure insertion (no original lines).
    pub fn is_insertion(&self) -> bool {
        self.orig_count == 0
    }

    /// Returns `true` if this hunk is a pure deletion (no new lines).
    pub fn is_deletion(&self) -> bool {
        self.new_count == 0
    }

    /// One past the last affected original line.
    pub fn orig_end(&self) -> LineNum {
        self.orig_start + self.orig_count
    }

    /// One past the last affected new line.
    pub fn new_end(&self) -> LineNum {
        self.new_start + self.new_count
    }
}
