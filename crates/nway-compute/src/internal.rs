//! Internal strategy: in-process sequence alignment via the `similar` crate.
//!
//! Lines are reduced to comparison keys according to the whitespace and case
//! options, the key sequences are aligned, and every non-equal operation
//! becomes one [`Hunk`] in 1-based numbering.

use similar::{capture_diff_slices, Algorithm, DiffOp};
use tracing::debug;

use nway_types::{DiffAlgorithm, DiffOptions, Hunk};

use crate::error::{ComputeError, ComputeResult};

/// Default memory budget for materializing both documents: 512 MiB.
///
/// Rust's global allocator aborts instead of reporting failure, so the
/// backend enforces an explicit budget and signals [`ComputeError::OutOfMemory`]
/// above it, letting the caller fall back to the external strategy.
pub const DEFAULT_MEMORY_BUDGET: usize = 512 * 1024 * 1024;

/// Compute the pairwise hunks between `orig` and `new` in process.
pub fn internal_diff(
    orig: &[String],
    new: &[String],
    opts: &DiffOptions,
) -> ComputeResult<Vec<Hunk>> {
    internal_diff_with_budget(orig, new, opts, DEFAULT_MEMORY_BUDGET)
}

/// As [`internal_diff`], with an explicit memory budget (test hook).
pub fn internal_diff_with_budget(
    orig: &[String],
    new: &[String],
    opts: &DiffOptions,
    budget: usize,
) -> ComputeResult<Vec<Hunk>> {
    let total: usize = orig
        .iter()
        .chain(new.iter())
        .map(|l| l.len() + 1)
        .sum();
    if total > budget {
        return Err(ComputeError::OutOfMemory);
    }

    let keys_orig: Vec<String> = orig.iter().map(|l| opts.comparison_key(l)).collect();
    let keys_new: Vec<String> = new.iter().map(|l| opts.comparison_key(l)).collect();

    let ops = capture_diff_slices(algorithm_for(opts.algorithm), &keys_orig, &keys_new);

    // Positions are tracked here rather than read from the ops: the
    // opposite-side index an op carries is not a running position and can
    // disagree with the op stream's own accumulated offsets.
    let mut old_pos: i64 = 0;
    let mut new_pos: i64 = 0;
    let mut hunks = Vec::new();
    for op in ops {
        let hunk = match op {
            DiffOp::Equal { len, .. } => {
                old_pos += len as i64;
                new_pos += len as i64;
                continue;
            }
            DiffOp::Delete { old_len, .. } => {
                let hunk = Hunk::new(old_pos + 1, old_len as i64, new_pos + 1, 0);
                old_pos += old_len as i64;
                hunk
            }
            DiffOp::Insert { new_len, .. } => {
                let hunk = Hunk::new(old_pos + 1, 0, new_pos + 1, new_len as i64);
                new_pos += new_len as i64;
                hunk
            }
            DiffOp::Replace {
                old_len, new_len, ..
            } => {
                let hunk = Hunk::new(old_pos + 1, old_len as i64, new_pos + 1, new_len as i64);
                old_pos += old_len as i64;
                new_pos += new_len as i64;
                hunk
            }
        };
        if opts.iblank && hunk_all_blank(&hunk, orig, new) {
            continue;
        }
        hunks.push(hunk);
    }

    debug!(hunks = hunks.len(), "internal diff complete");
    Ok(hunks)
}

fn algorithm_for(algo: DiffAlgorithm) -> Algorithm {
    match algo {
        DiffAlgorithm::Myers => Algorithm::Myers,
        // The closest available match: LCS searches for the minimal script.
        DiffAlgorithm::Minimal => Algorithm::Lcs,
        DiffAlgorithm::Patience => Algorithm::Patience,
        // Histogram refines patience; patience is the nearest equivalent.
        DiffAlgorithm::Histogram => Algorithm::Patience,
    }
}

/// Returns `true` when every line the hunk touches, on both sides, is blank.
fn hunk_all_blank(hunk: &Hunk, orig: &[String], new: &[String]) -> bool {
    let orig_blank = orig
        .iter()
        .skip(hunk.orig_start as usize - 1)
        .take(hunk.orig_count as usize)
        .all(|l| l.trim().is_empty());
    let new_blank = new
        .iter()
        .skip(hunk.new_start as usize - 1)
        .take(hunk.new_count as usize)
        .all(|l| l.trim().is_empty());
    orig_blank && new_blank
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_documents_no_hunks() {
        let a = lines(&["x", "y", "z"]);
        let hunks = internal_diff(&a, &a, &DiffOptions::default()).unwrap();
        assert!(hunks.is_empty());
    }

    #[test]
    fn single_changed_line() {
        let a = lines(&["x", "y", "z"]);
        let b = lines(&["x", "Y", "z"]);
        let hunks = internal_diff(&a, &b, &DiffOptions::default()).unwrap();
        assert_eq!(hunks, vec![Hunk::new(2, 1, 2, 1)]);
    }

    #[test]
    fn pure_insertion_uses_zero_count() {
        let a = lines(&["x", "z"]);
        let b = lines(&["x", "y", "z"]);
        let hunks = internal_diff(&a, &b, &DiffOptions::default()).unwrap();
        assert_eq!(hunks, vec![Hunk::new(2, 0, 2, 1)]);
    }

    #[test]
    fn pure_deletion_uses_zero_count() {
        let a = lines(&["x", "y", "z"]);
        let b = lines(&["x", "z"]);
        let hunks = internal_diff(&a, &b, &DiffOptions::default()).unwrap();
        assert_eq!(hunks, vec![Hunk::new(2, 1, 2, 0)]);
    }

    #[test]
    fn icase_suppresses_case_only_change() {
        let a = lines(&["x", "y", "z"]);
        let b = lines(&["x", "Y", "z"]);
        let opts = DiffOptions::parse("icase").unwrap();
        assert!(internal_diff(&a, &b, &opts).unwrap().is_empty());
    }

    #[test]
    fn iblank_drops_blank_only_hunks() {
        let a = lines(&["x", "", "z"]);
        let b = lines(&["x", "z"]);
        let opts = DiffOptions::parse("iblank").unwrap();
        assert!(internal_diff(&a, &b, &opts).unwrap().is_empty());

        // A real change is still reported.
        let c = lines(&["x", "w", "z"]);
        assert!(!internal_diff(&a, &c, &opts).unwrap().is_empty());
    }

    #[test]
    fn hunk_positions_stay_mutually_consistent() {
        // Repeated lines make the aligner emit separate insert and delete
        // ops whose opposite-side indices disagree with the accumulated
        // offsets; the hunk positions must come out consistent anyway.
        let a = lines(&["alpha", "", "beta", "beta"]);
        let b = lines(&["alpha", "alpha", "alpha", "", "alpha", "alpha", ""]);
        let hunks = internal_diff(&a, &b, &DiffOptions::default()).unwrap();

        let mut delta = 0;
        let mut prev_orig_end = 1;
        let mut prev_new_end = 1;
        for hunk in &hunks {
            assert!(hunk.orig_start >= prev_orig_end);
            assert!(hunk.new_start >= prev_new_end);
            assert_eq!(hunk.new_start, hunk.orig_start + delta);
            delta += hunk.new_count - hunk.orig_count;
            prev_orig_end = hunk.orig_end();
            prev_new_end = hunk.new_end();
        }
        assert_eq!(a.len() as i64 + delta, b.len() as i64);
    }

    #[test]
    fn budget_exceeded_is_out_of_memory() {
        let a = lines(&["a long enough line"]);
        let b = lines(&["another line"]);
        let err = internal_diff_with_budget(&a, &b, &DiffOptions::default(), 8).unwrap_err();
        assert!(matches!(err, ComputeError::OutOfMemory));
    }

    #[test]
    fn patience_algorithm_accepted() {
        let a = lines(&["a", "b", "c", "d"]);
        let b = lines(&["a", "c", "b", "d"]);
        let opts = DiffOptions::parse("internal,algorithm:patience").unwrap();
        let hunks = internal_diff(&a, &b, &opts).unwrap();
        assert!(!hunks.is_empty());
    }
}
