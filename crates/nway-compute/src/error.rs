//! Error types for the computation backend.

/// Errors that can occur while computing a pairwise diff.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// The external diff command or its capability probe failed. The caller
    /// proceeds with zero hunks ("no differences").
    #[error("cannot create diffs: {0}")]
    ComputationFailed(String),

    /// The internal backend could not materialize both documents in memory.
    /// The caller falls back to the external strategy and remembers the
    /// failure for this document.
    #[error("internal diff ran out of memory")]
    OutOfMemory,

    /// Creating, reading, or removing a temporary snapshot file failed.
    /// Surfaces to the user the same as `ComputationFailed`.
    #[error("diff I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for computation results.
pub type ComputeResult<T> = Result<T, ComputeError>;
