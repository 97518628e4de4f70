//! Diff computation backend for the nway engine.
//!
//! Turns two documents' line sequences into a list of [`Hunk`]s using one of
//! three interchangeable strategies: an in-process sequence alignment (the
//! `similar` crate), an external diff command run over temporary snapshot
//! files, or a user-supplied callback producing diff output for the backend
//! to read back.
//!
//! # Key Types
//!
//! - [`DiffComputer`] -- Strategy selection and the single `compute` entry point
//! - [`ExternalDiff`] / [`DiffCallback`] -- External command / callback plumbing
//! - [`ComputeError`] / [`ComputeResult`] -- Error surface
//!
//! [`Hunk`]: nway_types::Hunk

pub mod backend;
pub mod error;
pub mod external;
pub mod format;
pub mod internal;

pub use backend::{ComputeOutcome, DiffComputer};
pub use error::{ComputeError, ComputeResult};
pub use external::{DiffCallback, ExternalDiff};
pub use format::parse_diff_output;
pub use internal::internal_diff;
