//! Foundation types for the nway diff engine.
//!
//! This crate provides the data types shared by the computation backend and
//! the block engine. It has no behavior beyond parsing and line comparison.
//!
//! # Key Types
//!
//! - [`Hunk`] -- One pairwise difference between two documents, in line-range form
//! - [`DiffOptions`] -- The parsed option flags bag (whitespace/case handling, algorithm, display)
//! - [`TextBuffer`] / [`MemoryBuffer`] -- The seam to the text-buffer layer, plus an in-memory impl

pub mod buffer;
pub mod hunk;
pub mod options;

pub use buffer::{MemoryBuffer, SharedBuffer, TextBuffer};
pub use hunk::{Hunk, LineCount, LineNum};
pub use options::{lines_match, DiffAlgorithm, DiffOptions, OptionsError};

/// Fixed number of participant slots per workspace group.
pub const MAX_PARTICIPANTS: usize = 4;
