//! The [`DiffWorkspace`]: per-group owner of the participant registry, the
//! block list, the options snapshot, and the recompute machinery.
//!
//! All state is explicit and exclusively owned; operations run to completion
//! on the calling thread. A busy guard refuses re-entrant mutation (merge
//! while recompute, and the like) and records a pending recompute instead,
//! consumed when the active operation unwinds.

use tracing::{debug, warn};

use nway_compute::DiffComputer;
use nway_types::{DiffOptions, LineCount, LineNum, SharedBuffer, MAX_PARTICIPANTS};

use crate::block::{BlockArena, DiffBlock};
use crate::error::{EngineError, EngineResult};
use crate::merge::merge_hunks;

/// One occupied participant slot.
pub(crate) struct Participant {
    pub(crate) buffer: SharedBuffer,
    /// The internal backend ran out of memory on this document; skip it in
    /// future recomputes.
    pub(crate) internal_failed: bool,
}

/// Scoped token for the single active mutation.
///
/// Obtained from `DiffWorkspace::try_mutate` and handed back to
/// `DiffWorkspace::release` on every exit path. While a token is out, a
/// second mutation attempt is refused and recorded as a pending recompute.
pub(crate) struct RecomputeGuard(());

/// The multi-way diff state for one workspace group.
pub struct DiffWorkspace {
    pub(crate) slots: [Option<Participant>; MAX_PARTICIPANTS],
    pub(crate) arena: BlockArena,
    pub(crate) options: DiffOptions,
    pub(crate) computer: DiffComputer,
    /// The block list no longer matches the documents; the next read
    /// triggers a full recompute.
    pub(crate) invalid: bool,
    pub(crate) busy: bool,
    pub(crate) pending_recompute: bool,
    update_hook: Option<Box<dyn Fn() + Send>>,
}

impl std::fmt::Debug for DiffWorkspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffWorkspace")
            .field("participants", &self.participant_count())
            .field("blocks", &self.arena.len())
            .field("invalid", &self.invalid)
            .field("busy", &self.busy)
            .finish()
    }
}

impl Default for DiffWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffWorkspace {
    /// Create an empty workspace with the stock options.
    pub fn new() -> Self {
        Self::with_options(DiffOptions::default())
    }

    /// Create an empty workspace with the given options.
    pub fn with_options(options: DiffOptions) -> Self {
        Self {
            slots: Default::default(),
            arena: BlockArena::new(),
            options,
            computer: DiffComputer::new(),
            invalid: false,
            busy: false,
            pending_recompute: false,
            update_hook: None,
        }
    }

    /// Replace the computation backend (external command, callback, budget).
    pub fn set_computer(&mut self, computer: DiffComputer) {
        self.computer = computer;
        self.invalid = self.participant_count() >= 2;
    }

    /// The options snapshot currently in effect.
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Install a new options snapshot; the diff is recomputed on next read.
    pub fn set_options(&mut self, options: DiffOptions) {
        self.options = options;
        self.invalid = self.participant_count() >= 2;
    }

    /// Register a hook fired once per successful full recompute.
    pub fn set_update_hook(&mut self, hook: Box<dyn Fn() + Send>) {
        self.update_hook = Some(hook);
    }

    // ---------------------------------------------------------------
    // Participant registry
    // ---------------------------------------------------------------

    /// Add a document to the group, returning its slot.
    ///
    /// A document occupies at most one slot: re-adding returns the slot it
    /// already holds. Fails with [`EngineError::GroupFull`] when every slot
    /// is taken.
    pub fn add_participant(&mut self, buffer: SharedBuffer) -> EngineResult<usize> {
        for (slot, entry) in self.slots.iter().enumerate() {
            if let Some(p) = entry {
                if std::sync::Arc::ptr_eq(&p.buffer, &buffer) {
                    return Ok(slot);
                }
            }
        }
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(EngineError::GroupFull)?;
        self.slots[slot] = Some(Participant {
            buffer,
            internal_failed: false,
        });
        self.invalid = self.participant_count() >= 2;
        debug!(slot, "participant added");
        Ok(slot)
    }

    /// Remove the document in `slot` from the group.
    ///
    /// The block list is discarded once fewer than two participants remain.
    pub fn remove_participant(&mut self, slot: usize) {
        if slot >= MAX_PARTICIPANTS || self.slots[slot].is_none() {
            return;
        }
        self.slots[slot] = None;
        if self.participant_count() < 2 {
            self.arena.clear();
            self.invalid = false;
        } else {
            self.invalid = true;
        }
        debug!(slot, "participant removed");
    }

    /// Number of occupied slots.
    pub fn participant_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns `true` when `slot` holds a document.
    pub fn is_participant(&self, slot: usize) -> bool {
        slot < MAX_PARTICIPANTS && self.slots[slot].is_some()
    }

    /// Occupancy per slot.
    pub fn occupied(&self) -> [bool; MAX_PARTICIPANTS] {
        std::array::from_fn(|i| self.slots[i].is_some())
    }

    /// Slot indices of all participants, in slot order.
    pub fn participants(&self) -> Vec<usize> {
        (0..MAX_PARTICIPANTS).filter(|&i| self.is_participant(i)).collect()
    }

    // ---------------------------------------------------------------
    // Buffer access
    // ---------------------------------------------------------------

    pub(crate) fn line(&self, slot: usize, lnum: LineNum) -> Option<String> {
        let participant = self.slots.get(slot)?.as_ref()?;
        let buf = participant.buffer.lock().expect("buffer lock poisoned");
        buf.line(lnum)
    }

    pub(crate) fn line_count(&self, slot: usize) -> LineNum {
        match self.slots.get(slot).and_then(|s| s.as_ref()) {
            Some(p) => p.buffer.lock().expect("buffer lock poisoned").line_count(),
            None => 0,
        }
    }

    fn snapshot(&self, slot: usize) -> Vec<String> {
        match self.slots.get(slot).and_then(|s| s.as_ref()) {
            Some(p) => {
                let buf = p.buffer.lock().expect("buffer lock poisoned");
                buf.lines(1, buf.line_count())
            }
            None => Vec::new(),
        }
    }

    /// A snapshot of the current block list, for rendering and tests.
    pub fn blocks(&self) -> Vec<DiffBlock> {
        self.arena.to_vec()
    }

    /// Returns `true` when the next read will trigger a full recompute.
    pub fn is_dirty(&self) -> bool {
        self.invalid
    }

    // ---------------------------------------------------------------
    // Busy guard
    // ---------------------------------------------------------------

    pub(crate) fn try_mutate(&mut self) -> Option<RecomputeGuard> {
        if self.busy {
            self.pending_recompute = true;
            None
        } else {
            self.busy = true;
            Some(RecomputeGuard(()))
        }
    }

    pub(crate) fn release(&mut self, _guard: RecomputeGuard) {
        self.busy = false;
        if std::mem::take(&mut self.pending_recompute) {
            self.invalid = true;
        }
    }

    // ---------------------------------------------------------------
    // Full recompute
    // ---------------------------------------------------------------

    /// Discard and rebuild the whole block list from the computation
    /// backend.
    ///
    /// On backend failure the block list is left empty ("no differences")
    /// and the error is returned for reporting; the workspace stays valid.
    /// A call while another mutation is active is deferred.
    pub fn recompute(&mut self) -> EngineResult<()> {
        let Some(guard) = self.try_mutate() else {
            return Ok(());
        };
        let result = self.recompute_locked();
        self.release(guard);
        if result.is_ok() {
            if let Some(hook) = &self.update_hook {
                hook();
            }
        }
        result
    }

    fn recompute_locked(&mut self) -> EngineResult<()> {
        self.arena.clear();
        self.invalid = false;

        let occupied = self.occupied();
        let participants = self.participants();
        let Some((&idx_orig, rest)) = participants.split_first() else {
            return Ok(());
        };
        if rest.is_empty() {
            return Ok(());
        }

        let orig = self.snapshot(idx_orig);
        for &idx_new in rest {
            let new = self.snapshot(idx_new);
            let skip_internal = self.internal_failed(idx_orig) || self.internal_failed(idx_new);
            match self
                .computer
                .compute(&orig, &new, &self.options, skip_internal)
            {
                Ok(outcome) => {
                    if outcome.internal_failed {
                        self.mark_internal_failed(idx_orig);
                        self.mark_internal_failed(idx_new);
                    }
                    merge_hunks(&mut self.arena, &occupied, idx_orig, idx_new, &outcome.hunks);
                }
                Err(e) => {
                    warn!(error = %e, "cannot create diffs");
                    self.arena.clear();
                    return Err(EngineError::Compute(e));
                }
            }
        }

        debug_assert!(self.arena.is_ordered(&occupied));
        debug!(blocks = self.arena.len(), "diff recomputed");
        Ok(())
    }

    fn internal_failed(&self, slot: usize) -> bool {
        self.slots[slot].as_ref().is_some_and(|p| p.internal_failed)
    }

    fn mark_internal_failed(&mut self, slot: usize) {
        if let Some(p) = self.slots[slot].as_mut() {
            p.internal_failed = true;
        }
    }

    /// Recompute if a change invalidated the block list (the lazy path used
    /// by every query).
    pub fn ensure_current(&mut self) {
        if self.invalid && !self.busy {
            // The failure was already reported; queries proceed on the
            // empty list.
            let _ = self.recompute();
        }
    }

    // ---------------------------------------------------------------
    // Reported edits
    // ---------------------------------------------------------------

    /// Report that the closed range `[line1, line2]` of `slot`'s document
    /// was replaced by `new_count` lines.
    ///
    /// A pure insertion above line `n` is reported as `line1 = n`,
    /// `line2 = n - 1`. The block list is updated in place for structural
    /// edits; edits whose effect cannot be derived incrementally mark the
    /// group dirty instead. Calls made while another mutation is active are
    /// deferred the same way.
    pub fn apply_edit(&mut self, slot: usize, line1: LineNum, line2: LineNum, new_count: LineCount) {
        if !self.is_participant(slot) || self.participant_count() < 2 {
            return;
        }
        let Some(guard) = self.try_mutate() else {
            return;
        };
        self.apply_edit_locked(slot, line1, line2, new_count);
        self.release(guard);
    }

    fn apply_edit_locked(&mut self, slot: usize, line1: LineNum, line2: LineNum, new_count: LineCount) {
        let old_count = (line2 - line1 + 1).max(0);
        let delta = new_count - old_count;

        // A replacement splits into an in-place change over the lines both
        // versions keep and a pure insert or delete of the remainder. The
        // structural part goes first so the block lookup below sees settled
        // line numbers.
        let overlap = old_count.min(new_count);
        if delta > 0 {
            self.adjust_blocks(slot, line1 + overlap, line1 + overlap - 1, delta, 0, false);
        } else if delta < 0 {
            self.adjust_blocks(slot, line1 + overlap, line2, 0, -delta, false);
        }

        if overlap > 0 {
            // In-place change: inside a block the lines stay marked changed
            // and may shrink away via the equality re-check; outside every
            // block the incremental path cannot represent a new difference,
            // so force a recompute.
            let last = line1 + overlap - 1;
            let containing = self.arena.indices().find(|&idx| {
                let block = self.arena.get(idx);
                block.lnum[slot] <= line1 && last < block.end(slot)
            });
            match containing {
                Some(idx) => {
                    self.check_unchanged(idx);
                    self.sweep_degenerate();
                }
                None => self.invalid = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use nway_compute::{DiffComputer, ExternalDiff};
    use nway_types::{DiffOptions, MemoryBuffer, SharedBuffer, TextBuffer};

    use super::DiffWorkspace;
    use crate::error::EngineError;
    use crate::query::LineDiff;

    fn workspace(docs: &[&str]) -> (DiffWorkspace, Vec<SharedBuffer>) {
        let mut ws = DiffWorkspace::with_options(DiffOptions::default());
        let mut buffers = Vec::new();
        for doc in docs {
            let buf = MemoryBuffer::from_text(doc).into_shared();
            ws.add_participant(buf.clone()).unwrap();
            buffers.push(buf);
        }
        ws.recompute().unwrap();
        (ws, buffers)
    }

    #[test]
    fn identical_documents_produce_no_blocks() {
        let (mut ws, _) = workspace(&["x\ny\nz\n", "x\ny\nz\n"]);
        assert!(ws.blocks().is_empty());
        for lnum in 1..=3 {
            assert_eq!(ws.classify(0, lnum), LineDiff::Unchanged);
            assert_eq!(ws.classify(1, lnum), LineDiff::Unchanged);
        }
    }

    #[test]
    fn single_changed_line_produces_single_block() {
        let (mut ws, _) = workspace(&["x\ny\nz\n", "x\nY\nz\n"]);
        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lnum[0], 2);
        assert_eq!(blocks[0].count[0], 1);
        assert_eq!(blocks[0].lnum[1], 2);
        assert_eq!(blocks[0].count[1], 1);
        assert_eq!(ws.classify(0, 2), LineDiff::ChangedLine);
    }

    #[test]
    fn top_insertion_is_handled_incrementally() {
        let (mut ws, buffers) = workspace(&["x\ny\nz\n", "x\ny\nz\n"]);

        // Count full recomputes through the update hook; the incremental
        // path must not trigger one.
        let recomputes = Arc::new(AtomicUsize::new(0));
        let counter = recomputes.clone();
        ws.set_update_hook(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        buffers[0]
            .lock()
            .unwrap()
            .replace_lines(1, 0, vec!["w".into()]);
        ws.apply_edit(0, 1, 0, 1);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].count[0], 1);
        assert_eq!(blocks[0].count[1], 0);
        assert_eq!(ws.classify(0, 1), LineDiff::InsertedOrDeleted);
        assert_eq!(recomputes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn mixed_replacement_outside_blocks_marks_dirty() {
        // Replacing three equal lines with one new line changes the kept
        // line's content as well as the count; the incremental path cannot
        // represent that and must fall back to a recompute.
        let (mut ws, buffers) = workspace(&["a\nb\nc\nd\ne\n", "a\nb\nc\nd\ne\n"]);
        buffers[0]
            .lock()
            .unwrap()
            .replace_lines(2, 4, vec!["X".into()]);
        ws.apply_edit(0, 2, 4, 1);
        assert!(ws.is_dirty());

        assert_eq!(ws.classify(0, 2), LineDiff::ChangedLine);
        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lnum[0], 2);
        assert_eq!(blocks[0].count[0], 1);
        assert_eq!(blocks[0].lnum[1], 2);
        assert_eq!(blocks[0].count[1], 3);
    }

    #[test]
    fn mixed_replacement_inside_a_block_stays_incremental() {
        let (mut ws, buffers) = workspace(&["a\n1\n2\n3\n4\nb\n", "a\nx\nb\n"]);
        buffers[0]
            .lock()
            .unwrap()
            .replace_lines(2, 3, vec!["Y".into()]);
        ws.apply_edit(0, 2, 3, 1);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lnum[0], 2);
        assert_eq!(blocks[0].count[0], 3);
        assert_eq!(blocks[0].count[1], 1);
        assert_eq!(ws.classify(0, 2), LineDiff::ChangedLine);
    }

    #[test]
    fn take_clears_block_and_classification() {
        let (mut ws, _) = workspace(&["x\ny\nz\n", "x\nY\nz\n"]);
        ws.take(Some(1), Some(0), 2, 2).unwrap();
        assert_eq!(ws.classify(0, 2), LineDiff::Unchanged);
        assert!(ws.blocks().is_empty());
    }

    #[test]
    fn failing_external_backend_surfaces_and_leaves_empty_list() {
        let mut ws = DiffWorkspace::with_options(DiffOptions::empty());
        ws.set_computer(DiffComputer::with_external(ExternalDiff::new(
            "nway-no-such-diff-command",
        )));
        ws.add_participant(MemoryBuffer::from_text("a\n").into_shared())
            .unwrap();
        ws.add_participant(MemoryBuffer::from_text("b\n").into_shared())
            .unwrap();

        let err = ws.recompute().unwrap_err();
        assert!(matches!(err, EngineError::Compute(_)));
        assert!(ws.blocks().is_empty());
        assert!(!ws.is_dirty());
        // Queries keep working on the empty list.
        assert_eq!(ws.classify(0, 1), LineDiff::Unchanged);
    }

    #[test]
    fn recompute_is_idempotent() {
        let (mut ws, _) = workspace(&["a\nx\nc\nd\ny\n", "a\nq\nc\nd\nw\n"]);
        let first = ws.blocks();
        ws.recompute().unwrap();
        assert_eq!(ws.blocks(), first);
    }

    #[test]
    fn update_hook_fires_once_per_recompute() {
        let (mut ws, _) = workspace(&["a\n", "b\n"]);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        ws.set_update_hook(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        ws.recompute().unwrap();
        ws.recompute().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn group_capacity_is_enforced() {
        let mut ws = DiffWorkspace::new();
        for _ in 0..4 {
            ws.add_participant(MemoryBuffer::from_text("x\n").into_shared())
                .unwrap();
        }
        let err = ws
            .add_participant(MemoryBuffer::from_text("y\n").into_shared())
            .unwrap_err();
        assert!(matches!(err, EngineError::GroupFull));
    }

    #[test]
    fn readding_a_document_returns_its_slot() {
        let mut ws = DiffWorkspace::new();
        let buf = MemoryBuffer::from_text("x\n").into_shared();
        let slot = ws.add_participant(buf.clone()).unwrap();
        assert_eq!(ws.add_participant(buf).unwrap(), slot);
        assert_eq!(ws.participant_count(), 1);
    }

    #[test]
    fn removing_second_to_last_participant_drops_the_list() {
        let (mut ws, _) = workspace(&["a\n", "b\n"]);
        assert_eq!(ws.blocks().len(), 1);
        ws.remove_participant(1);
        assert!(ws.blocks().is_empty());
        assert!(!ws.is_dirty());
    }

    #[test]
    fn options_change_marks_dirty() {
        let (mut ws, _) = workspace(&["a\nB\n", "a\nb\n"]);
        assert_eq!(ws.blocks().len(), 1);

        let opts: DiffOptions = "internal,filler,icase".parse().unwrap();
        ws.set_options(opts);
        assert!(ws.is_dirty());
        assert_eq!(ws.classify(0, 2), LineDiff::Unchanged);
        assert!(ws.blocks().is_empty());
    }

    mod properties {
        use proptest::prelude::*;

        use nway_types::{DiffOptions, MemoryBuffer, SharedBuffer, TextBuffer};

        use crate::workspace::DiffWorkspace;

        fn doc_strategy() -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec(
                prop::sample::select(vec![
                    "alpha".to_string(),
                    "beta".to_string(),
                    "gamma".to_string(),
                    "".to_string(),
                ]),
                1..8,
            )
        }

        #[derive(Clone, Debug)]
        enum Edit {
            Insert { at: usize, lines: Vec<String> },
            Delete { at: usize, count: usize },
        }

        fn edit_strategy() -> impl Strategy<Value = Edit> {
            prop_oneof![
                (0usize..8, prop::collection::vec(
                    prop::sample::select(vec![
                        "alpha".to_string(),
                        "delta".to_string(),
                    ]),
                    1..3,
                ))
                    .prop_map(|(at, lines)| Edit::Insert { at, lines }),
                (0usize..8, 1usize..3).prop_map(|(at, count)| Edit::Delete { at, count }),
            ]
        }

        fn build(docs: &[Vec<String>]) -> (DiffWorkspace, Vec<SharedBuffer>) {
            let mut ws = DiffWorkspace::with_options(DiffOptions::default());
            let mut buffers = Vec::new();
            for doc in docs {
                let buf = MemoryBuffer::new(doc.clone()).into_shared();
                ws.add_participant(buf.clone()).unwrap();
                buffers.push(buf);
            }
            ws.recompute().unwrap();
            (ws, buffers)
        }

        fn apply(ws: &mut DiffWorkspace, buf: &SharedBuffer, slot: usize, edit: &Edit) {
            match edit {
                Edit::Insert { at, lines } => {
                    let line_count = buf.lock().unwrap().line_count();
                    // Insert above line `first`, clamped into the document.
                    let first = (*at as i64 % (line_count + 1)) + 1;
                    buf.lock()
                        .unwrap()
                        .replace_lines(first, first - 1, lines.clone());
                    ws.apply_edit(slot, first, first - 1, lines.len() as i64);
                }
                Edit::Delete { at, count } => {
                    let line_count = buf.lock().unwrap().line_count();
                    if line_count <= 1 {
                        return;
                    }
                    let first = (*at as i64 % line_count) + 1;
                    let last = (first + *count as i64 - 1).min(line_count);
                    // Keep at least one line so numbering stays well formed.
                    if last - first + 1 >= line_count {
                        return;
                    }
                    buf.lock().unwrap().replace_lines(first, last, Vec::new());
                    ws.apply_edit(slot, first, last, 0);
                }
            }
        }

        /// Outside the blocks the two documents must agree line for line;
        /// this is what makes the incremental path equivalent to a full
        /// recompute.
        fn assert_aligned_outside_blocks(ws: &DiffWorkspace, buffers: &[SharedBuffer]) {
            let blocks = ws.blocks();
            let mut cursor = vec![1i64; buffers.len()];
            for block in &blocks {
                let gap_len = block.lnum[0] - cursor[0];
                for slot in 1..buffers.len() {
                    assert_eq!(
                        block.lnum[slot] - cursor[slot],
                        gap_len,
                        "gap before block differs in length"
                    );
                }
                for off in 0..gap_len {
                    let reference = buffers[0].lock().unwrap().line(cursor[0] + off);
                    for slot in 1..buffers.len() {
                        let other = buffers[slot].lock().unwrap().line(cursor[slot] + off);
                        assert_eq!(reference, other, "gap text differs between documents");
                    }
                }
                for slot in 0..buffers.len() {
                    cursor[slot] = block.end(slot);
                }
            }
            let tail_len = buffers[0].lock().unwrap().line_count() - cursor[0];
            for slot in 1..buffers.len() {
                assert_eq!(
                    buffers[slot].lock().unwrap().line_count() - cursor[slot],
                    tail_len,
                    "tail length differs after the last block"
                );
            }
            for off in 0..=tail_len {
                let reference = buffers[0].lock().unwrap().line(cursor[0] + off);
                for slot in 1..buffers.len() {
                    let other = buffers[slot].lock().unwrap().line(cursor[slot] + off);
                    assert_eq!(reference, other, "tail text differs between documents");
                }
            }
        }

        proptest! {
            #[test]
            fn incremental_edits_keep_blocks_consistent(
                doc_a in doc_strategy(),
                doc_b in doc_strategy(),
                edits in prop::collection::vec((0usize..2, edit_strategy()), 0..6),
            ) {
                let (mut ws, buffers) = build(&[doc_a, doc_b]);
                for (slot, edit) in &edits {
                    apply(&mut ws, &buffers[*slot], *slot, edit);
                    prop_assert!(ws.arena.is_ordered(&ws.occupied()));
                }
                if ws.is_dirty() {
                    ws.recompute().unwrap();
                }
                assert_aligned_outside_blocks(&ws, &buffers);
            }

            #[test]
            fn corresponding_line_is_monotonic(
                doc_a in doc_strategy(),
                doc_b in doc_strategy(),
            ) {
                let (mut ws, buffers) = build(&[doc_a, doc_b]);
                let count = buffers[0].lock().unwrap().line_count();
                let mut previous = 0;
                for lnum in 1..=count {
                    let mapped = ws.corresponding_line(0, lnum, 1);
                    prop_assert!(mapped >= previous);
                    previous = mapped;
                }
            }

            #[test]
            fn recompute_twice_is_identical(
                doc_a in doc_strategy(),
                doc_b in doc_strategy(),
            ) {
                let (mut ws, _) = build(&[doc_a, doc_b]);
                let first = ws.blocks();
                ws.recompute().unwrap();
                prop_assert_eq!(ws.blocks(), first);
            }
        }
    }
}
