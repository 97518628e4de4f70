//! Error types for the engine crate.

use nway_compute::ComputeError;

/// Errors that can occur during engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A merge operation named a slot that does not currently participate.
    #[error("buffer is not in diff mode")]
    NotInDiffMode,

    /// More than two participants and no explicit source/target slot.
    #[error("more than two buffers in diff mode, don't know which one to use")]
    AmbiguousTarget,

    /// All participant slots of the group are occupied.
    #[error("no free participant slot in this group")]
    GroupFull,

    /// The computation backend failed; the block list is left empty.
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
