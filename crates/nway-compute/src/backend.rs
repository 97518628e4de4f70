//! Strategy selection: one entry point in front of the internal and external
//! backends.

use tracing::warn;

use nway_types::{DiffOptions, Hunk};

use crate::error::{ComputeError, ComputeResult};
use crate::external::ExternalDiff;
use crate::internal::{internal_diff_with_budget, DEFAULT_MEMORY_BUDGET};

/// The result of one pairwise computation.
#[derive(Debug)]
pub struct ComputeOutcome {
    /// The hunks, in increasing `orig_start` order.
    pub hunks: Vec<Hunk>,
    /// Set when the internal backend ran out of memory and the external
    /// strategy was used instead. The caller remembers this per document so
    /// the internal backend is not retried for it.
    pub internal_failed: bool,
}

/// Selects and runs a diff strategy per computation.
///
/// The internal backend is used when the options ask for it, no user
/// callback is configured, and the document is not flagged from an earlier
/// out-of-memory failure; everything else goes through [`ExternalDiff`].
#[derive(Debug, Clone)]
pub struct DiffComputer {
    external: ExternalDiff,
    memory_budget: usize,
}

impl Default for DiffComputer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffComputer {
    /// A computer spawning the default `diff` command for the external path.
    pub fn new() -> Self {
        Self {
            external: ExternalDiff::default(),
            memory_budget: DEFAULT_MEMORY_BUDGET,
        }
    }

    /// A computer with a custom external runner (command or callback).
    pub fn with_external(external: ExternalDiff) -> Self {
        Self {
            external,
            memory_budget: DEFAULT_MEMORY_BUDGET,
        }
    }

    /// Override the internal backend's memory budget (test hook).
    pub fn with_memory_budget(mut self, budget: usize) -> Self {
        self.memory_budget = budget;
        self
    }

    /// Compute the hunks between `orig` and `new`.
    ///
    /// `skip_internal` is the caller's per-document memory of an earlier
    /// [`ComputeError::OutOfMemory`]; when set, the internal backend is not
    /// attempted.
    pub fn compute(
        &self,
        orig: &[String],
        new: &[String],
        opts: &DiffOptions,
        skip_internal: bool,
    ) -> ComputeResult<ComputeOutcome> {
        let want_internal = opts.internal && !self.external.has_callback() && !skip_internal;

        if want_internal {
            match internal_diff_with_budget(orig, new, opts, self.memory_budget) {
                Ok(hunks) => {
                    return Ok(ComputeOutcome {
                        hunks,
                        internal_failed: false,
                    })
                }
                Err(ComputeError::OutOfMemory) => {
                    warn!("internal diff out of memory, falling back to external diff");
                    let hunks = self.external.diff(orig, new, opts)?;
                    return Ok(ComputeOutcome {
                        hunks,
                        internal_failed: true,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let hunks = self.external.diff(orig, new, opts)?;
        Ok(ComputeOutcome {
            hunks,
            internal_failed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn internal_path_by_default() {
        let computer = DiffComputer::new();
        let outcome = computer
            .compute(
                &lines(&["x", "y", "z"]),
                &lines(&["x", "Y", "z"]),
                &DiffOptions::default(),
                false,
            )
            .unwrap();
        assert_eq!(outcome.hunks, vec![Hunk::new(2, 1, 2, 1)]);
        assert!(!outcome.internal_failed);
    }

    #[test]
    fn oom_falls_back_to_external_and_reports_it() {
        // Tiny budget forces the internal backend to fail; the external
        // path (the stock diff command) takes over and the failure is
        // reported so the caller can remember it.
        let computer = DiffComputer::new().with_memory_budget(1);
        let outcome = computer
            .compute(
                &lines(&["x", "y", "z"]),
                &lines(&["x", "Y", "z"]),
                &DiffOptions::default(),
                false,
            )
            .unwrap();
        assert_eq!(outcome.hunks, vec![Hunk::new(2, 1, 2, 1)]);
        assert!(outcome.internal_failed);
    }

    #[test]
    fn callback_takes_precedence_over_internal() {
        let external = ExternalDiff::with_callback(Arc::new(|_, _, out| {
            std::fs::write(out, "2c2\n")
        }));
        let computer = DiffComputer::with_external(external);
        let outcome = computer
            .compute(
                &lines(&["x", "y"]),
                &lines(&["x", "Y"]),
                &DiffOptions::default(),
                false,
            )
            .unwrap();
        assert_eq!(outcome.hunks, vec![Hunk::new(2, 1, 2, 1)]);
        assert!(!outcome.internal_failed);
    }

    #[test]
    fn skip_internal_uses_external() {
        let external = ExternalDiff::with_callback(Arc::new(|_, _, out| {
            std::fs::write(out, "1c1\n")
        }));
        let computer = DiffComputer::with_external(external);
        let outcome = computer
            .compute(&lines(&["a"]), &lines(&["b"]), &DiffOptions::default(), true)
            .unwrap();
        assert_eq!(outcome.hunks, vec![Hunk::new(1, 1, 1, 1)]);
    }

    #[test]
    fn external_disabled_internal_via_option() {
        let opts = DiffOptions::parse("filler").unwrap(); // no "internal"
        let external = ExternalDiff::with_callback(Arc::new(|_, _, out| {
            std::fs::write(out, "")
        }));
        let computer = DiffComputer::with_external(external);
        let outcome = computer
            .compute(&lines(&["a"]), &lines(&["a"]), &opts, false)
            .unwrap();
        assert!(outcome.hunks.is_empty());
    }
}
