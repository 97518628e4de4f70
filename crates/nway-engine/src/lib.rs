//! Multi-way live diff engine.
//!
//! A [`DiffWorkspace`] tracks up to four text documents and maintains one
//! unified list of difference blocks across all of them. Differences are
//! computed pairwise against the lowest participant and folded into the
//! list; reported edits update the list in place where possible and fall
//! back to a full recompute where not. On top of the list sit line
//! classification, line correspondence between documents, in-line change
//! bounds, block navigation, and merge-style "take" editing.
//!
//! # Key Types
//!
//! - [`DiffWorkspace`] -- Participant registry, block list, and all
//!   operations
//! - [`DiffBlock`] -- One difference region with per-participant extents
//! - [`LineDiff`] -- Classification of a single line
//! - [`ChangeBounds`] -- In-line changed-byte extent
//! - [`EngineError`] -- Error type for engine operations

mod adjust;
mod block;
mod error;
mod merge;
mod query;
mod take;
mod workspace;

pub use block::{BlockArena, DiffBlock};
pub use error::{EngineError, EngineResult};
pub use query::{ChangeBounds, Direction, LineDiff};
pub use workspace::DiffWorkspace;
