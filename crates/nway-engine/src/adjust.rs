//! Incremental block adjustment for reported edits.
//!
//! `adjust_blocks` rewrites the block list in place for a structural edit
//! (lines inserted or deleted) without re-running the diff. Each block is
//! classified against the edited range and shifted, shrunk, grown, or
//! removed; an edit touching no block becomes a block of its own. Blocks
//! that shrink or grow are re-checked line by line so lines that became
//! equal again drop out of the block.

use tracing::warn;

use nway_types::{lines_match, LineCount, LineNum, MAX_PARTICIPANTS};

use crate::block::DiffBlock;
use crate::workspace::DiffWorkspace;

impl DiffWorkspace {
    /// Update the block list for `inserted` lines added and `deleted` lines
    /// removed in the range `[line1, line2]` of `slot`'s document.
    ///
    /// With `suppress_new` set, an edit outside every block does not create
    /// a block; merge editing uses this while it maintains the affected
    /// block itself.
    pub(crate) fn adjust_blocks(
        &mut self,
        idx: usize,
        line1: LineNum,
        line2: LineNum,
        inserted: LineCount,
        deleted_total: LineCount,
        suppress_new: bool,
    ) {
        if inserted == 0 && deleted_total == 0 {
            return;
        }
        let occupied = self.occupied();
        let amount_after = inserted - deleted_total;

        // Remaining deletion while walking: a deletion can span several
        // blocks and the gaps between them.
        let mut deleted = deleted_total;
        let mut lnum_deleted = line1;

        let mut dprev: Option<usize> = None;
        let mut dp = self.arena.head();

        loop {
            // An edit strictly between two blocks (or outside the list)
            // becomes a new block of its own.
            let below_prev = dprev.map_or(true, |p| self.arena.get(p).end(idx) < line1);
            let above_next = match dp {
                Some(cur) => self.arena.get(cur).lnum[idx] - 1 > line2,
                None => true,
            };
            if below_prev && above_next && !suppress_new {
                let mut block = DiffBlock::default();
                block.lnum[idx] = line1;
                block.count[idx] = inserted;
                for i in 0..MAX_PARTICIPANTS {
                    if occupied[i] && i != idx {
                        block.lnum[i] = match dprev {
                            None => line1,
                            Some(p) => {
                                let prev = self.arena.get(p);
                                line1 + prev.end(i) - prev.end(idx)
                            }
                        };
                        block.count[i] = deleted;
                    }
                }
                dprev = Some(self.arena.insert_after(dprev, block));
            }

            let Some(cur) = dp else { break };
            let block = *self.arena.get(cur);
            let last = block.end(idx) - 1;

            if last >= line1 - 1 {
                if block.lnum[idx] - LineNum::from(inserted + deleted != 0) > line2 {
                    // The block is entirely below the edit: shift it.
                    if amount_after == 0 {
                        break;
                    }
                    self.arena.get_mut(cur).lnum[idx] += amount_after;
                } else {
                    let mut recheck = false;
                    if deleted > 0 {
                        let n;
                        let mut off = 0;
                        if block.lnum[idx] >= line1 {
                            if last <= line2 {
                                // The whole block was deleted. When the
                                // deletion runs on into the next block, the
                                // lines up to there were deleted too.
                                let next_in_range = self.arena.next(cur).filter(|&nx| {
                                    self.arena.get(nx).lnum[idx] - 1 <= line2
                                });
                                if let Some(nx) = next_in_range {
                                    let next_lnum = self.arena.get(nx).lnum[idx];
                                    let mut m = next_lnum - lnum_deleted;
                                    deleted -= m;
                                    m -= block.count[idx];
                                    lnum_deleted = next_lnum;
                                    n = m;
                                } else {
                                    n = deleted - block.count[idx];
                                }
                                self.arena.get_mut(cur).count[idx] = 0;
                            } else {
                                // Lines at and just before the top of the
                                // block were deleted.
                                off = block.lnum[idx] - lnum_deleted;
                                n = off;
                                self.arena.get_mut(cur).count[idx] -=
                                    line2 - block.lnum[idx] + 1;
                                recheck = true;
                            }
                            self.arena.get_mut(cur).lnum[idx] = line1;
                        } else if last < line2 {
                            // Lines at the bottom of the block were deleted,
                            // possibly on into the next block.
                            self.arena.get_mut(cur).count[idx] -= last - lnum_deleted + 1;
                            let next_in_range = self
                                .arena
                                .next(cur)
                                .filter(|&nx| self.arena.get(nx).lnum[idx] - 1 <= line2);
                            if let Some(nx) = next_in_range {
                                let next_lnum = self.arena.get(nx).lnum[idx];
                                n = next_lnum - 1 - last;
                                deleted -= next_lnum - lnum_deleted;
                                lnum_deleted = next_lnum;
                            } else {
                                n = line2 - last;
                            }
                            recheck = true;
                        } else {
                            // The deletion falls entirely inside the block.
                            n = 0;
                            self.arena.get_mut(cur).count[idx] -= deleted;
                        }

                        // The other documents gain the deleted span as
                        // difference and shift up where lines above their
                        // extent went away.
                        for i in 0..MAX_PARTICIPANTS {
                            if occupied[i] && i != idx {
                                let b = self.arena.get_mut(cur);
                                if b.lnum[i] > off {
                                    b.lnum[i] -= off;
                                } else {
                                    b.lnum[i] = 1;
                                }
                                b.count[i] += n;
                            }
                        }
                    } else if block.lnum[idx] <= line1 {
                        // Lines inserted inside this block.
                        self.arena.get_mut(cur).count[idx] += inserted;
                        recheck = true;
                    } else {
                        // Lines inserted right above this block.
                        self.arena.get_mut(cur).lnum[idx] += inserted;
                    }

                    if recheck {
                        self.check_unchanged(cur);
                    }
                }
            }

            // Merge with the previous block when the adjustment made them
            // touch.
            let touches = dprev.is_some_and(|p| {
                self.arena.get(p).end(idx) == self.arena.get(cur).lnum[idx]
            });
            match (dprev, touches) {
                (Some(p), true) => {
                    for i in 0..MAX_PARTICIPANTS {
                        if occupied[i] {
                            let add = self.arena.get(cur).count[i];
                            self.arena.get_mut(p).count[i] += add;
                        }
                    }
                    self.arena.remove_after(Some(p));
                    dp = self.arena.next(p);
                }
                _ => {
                    dprev = Some(cur);
                    dp = self.arena.next(cur);
                }
            }
        }

        self.sweep_degenerate();
    }

    /// Drop blocks whose count reached zero for every participant.
    pub(crate) fn sweep_degenerate(&mut self) {
        let occupied = self.occupied();
        let mut prev: Option<usize> = None;
        let mut cur = self.arena.head();
        while let Some(idx) = cur {
            if self.arena.get(idx).is_degenerate(&occupied) {
                cur = self.arena.next(idx);
                self.arena.remove_after(prev);
            } else {
                prev = Some(idx);
                cur = self.arena.next(idx);
            }
        }
    }

    /// Shrink the block at `dp` by dropping leading and trailing lines that
    /// are equal in every participant under the current options.
    ///
    /// A block whose extents fall outside a document is left alone; a line
    /// that cannot be read stops the shrink.
    pub(crate) fn check_unchanged(&mut self, dp: usize) {
        let occupied = self.occupied();
        let Some(i_org) = (0..MAX_PARTICIPANTS).find(|&i| occupied[i]) else {
            return;
        };
        if !self.check_sanity(dp) {
            warn!("diff block extends past the end of a document, not shrinking it");
            return;
        }

        for backward in [false, true] {
            loop {
                let block = *self.arena.get(dp);
                if block.count[i_org] <= 0 {
                    break;
                }
                let off_org = if backward { block.count[i_org] - 1 } else { 0 };
                let Some(line_org) = self.line(i_org, block.lnum[i_org] + off_org) else {
                    return;
                };

                let mut all_match = true;
                for i_new in (i_org + 1)..MAX_PARTICIPANTS {
                    if !occupied[i_new] {
                        continue;
                    }
                    let off_new = if backward { block.count[i_new] - 1 } else { 0 };
                    if off_new < 0 || off_new >= block.count[i_new] {
                        all_match = false;
                        break;
                    }
                    let Some(line_new) = self.line(i_new, block.lnum[i_new] + off_new) else {
                        return;
                    };
                    if !lines_match(&line_org, &line_new, &self.options) {
                        all_match = false;
                        break;
                    }
                }
                if !all_match {
                    break;
                }

                let block = self.arena.get_mut(dp);
                for i in 0..MAX_PARTICIPANTS {
                    if occupied[i] {
                        if !backward {
                            block.lnum[i] += 1;
                        }
                        block.count[i] -= 1;
                    }
                }
            }
        }
    }

    /// Returns `true` when the block's extents lie within every
    /// participant's document.
    pub(crate) fn check_sanity(&self, dp: usize) -> bool {
        let block = self.arena.get(dp);
        for i in 0..MAX_PARTICIPANTS {
            if self.is_participant(i) && block.end(i) - 1 > self.line_count(i) {
                return false;
            }
        }
        true
    }

    /// Returns `true` when the block's text is equal between slots `i1` and
    /// `i2` under the current options.
    pub(crate) fn equal_block_entry(&self, dp: usize, i1: usize, i2: usize) -> bool {
        let block = self.arena.get(dp);
        if block.count[i1] != block.count[i2] {
            return false;
        }
        if !self.check_sanity(dp) {
            return false;
        }
        for off in 0..block.count[i1] {
            let (Some(a), Some(b)) = (
                self.line(i1, block.lnum[i1] + off),
                self.line(i2, block.lnum[i2] + off),
            ) else {
                return false;
            };
            if !lines_match(&a, &b, &self.options) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use nway_types::{DiffOptions, MemoryBuffer, SharedBuffer, TextBuffer};

    use crate::workspace::DiffWorkspace;

    fn two_docs(a: &str, b: &str) -> (DiffWorkspace, SharedBuffer, SharedBuffer) {
        let buf_a = MemoryBuffer::from_text(a).into_shared();
        let buf_b = MemoryBuffer::from_text(b).into_shared();
        let mut ws = DiffWorkspace::with_options(DiffOptions::default());
        ws.add_participant(buf_a.clone()).unwrap();
        ws.add_participant(buf_b.clone()).unwrap();
        ws.recompute().unwrap();
        (ws, buf_a, buf_b)
    }

    fn replace(buf: &SharedBuffer, first: i64, last: i64, lines: &[&str]) {
        buf.lock()
            .unwrap()
            .replace_lines(first, last, lines.iter().map(|s| s.to_string()).collect());
    }

    #[test]
    fn insertion_far_below_blocks_shifts_nothing_and_appends() {
        // Difference at line 2; then two lines appended at the end of doc 0.
        let (mut ws, buf_a, _) = two_docs("a\nb\nc\nd\n", "a\nB\nc\nd\n");
        let before = ws.blocks();
        assert_eq!(before.len(), 1);

        replace(&buf_a, 5, 4, &["e", "f"]);
        ws.apply_edit(0, 5, 4, 2);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], before[0]);
        // The appended lines form their own block with no counterpart.
        assert_eq!(blocks[1].lnum[0], 5);
        assert_eq!(blocks[1].count[0], 2);
        assert_eq!(blocks[1].lnum[1], 5);
        assert_eq!(blocks[1].count[1], 0);
    }

    #[test]
    fn insertion_above_block_shifts_its_start() {
        let (mut ws, buf_a, _) = two_docs("a\nb\nc\nd\n", "a\nb\nc\nD\n");
        assert_eq!(ws.blocks()[0].lnum[0], 4);

        // One line above line 2 of doc 0: a standalone block appears at 2
        // and the old block moves down to line 5.
        replace(&buf_a, 2, 1, &["new"]);
        ws.apply_edit(0, 2, 1, 1);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lnum[0], 2);
        assert_eq!(blocks[0].count[0], 1);
        assert_eq!(blocks[0].count[1], 0);
        assert_eq!(blocks[1].lnum[0], 5);
        assert_eq!(blocks[1].lnum[1], 4);
    }

    #[test]
    fn deleting_the_extra_line_removes_the_block() {
        let (mut ws, buf_a, _) = two_docs("a\nx\nb\n", "a\nb\n");
        assert_eq!(ws.blocks().len(), 1);

        replace(&buf_a, 2, 2, &[]);
        ws.apply_edit(0, 2, 2, 0);
        assert!(!ws.is_dirty());
        assert!(ws.blocks().is_empty());
    }

    #[test]
    fn deletion_inside_block_shrinks_it() {
        // Lines 2-4 differ; delete line 3 of doc 0 (inside the block).
        let (mut ws, buf_a, _) = two_docs("a\nx\ny\nz\nb\n", "a\np\nq\nr\nb\n");
        assert_eq!(ws.blocks()[0].count[0], 3);

        replace(&buf_a, 3, 3, &[]);
        ws.apply_edit(0, 3, 3, 0);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].count[0], 2);
        assert_eq!(blocks[0].count[1], 3);
    }

    #[test]
    fn deletion_spanning_block_top_grows_other_side() {
        // Block at lines 3-4 of doc 0; delete lines 2-3 (one above the
        // block, one inside it).
        let (mut ws, buf_a, _) = two_docs("a\nb\nx\ny\nc\n", "a\nb\np\nq\nc\n");
        assert_eq!(ws.blocks()[0].lnum[0], 3);

        replace(&buf_a, 2, 3, &[]);
        ws.apply_edit(0, 2, 3, 0);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        // The block starts where the deletion started; one line of doc 0 is
        // left and doc 1 gained the line deleted above the block.
        assert_eq!(blocks[0].lnum[0], 2);
        assert_eq!(blocks[0].count[0], 1);
        assert_eq!(blocks[0].lnum[1], 2);
        assert_eq!(blocks[0].count[1], 3);
    }

    #[test]
    fn insertion_inside_block_rechecks_lines() {
        // Doc 1 has an extra line "m". Inserting the same text at the same
        // spot in doc 0 makes the documents equal; the recheck after the
        // grow shrinks the block away.
        let (mut ws, buf_a, _) = two_docs("a\nb\nc\n", "a\nb\nm\nc\n");
        assert_eq!(ws.blocks().len(), 1);

        replace(&buf_a, 3, 2, &["m"]);
        ws.apply_edit(0, 3, 2, 1);
        assert!(!ws.is_dirty());
        assert!(ws.blocks().is_empty());
    }

    #[test]
    fn adjacent_blocks_merge_when_gap_deleted() {
        // Differences at lines 2 and 4, equal line 3 between them. Deleting
        // line 3 of doc 0 makes the blocks touch and they merge into one.
        let (mut ws, buf_a, _) = two_docs("a\nx\nb\ny\nc\n", "a\nP\nb\nQ\nc\n");
        assert_eq!(ws.blocks().len(), 2);

        replace(&buf_a, 3, 3, &[]);
        ws.apply_edit(0, 3, 3, 0);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lnum[0], 2);
        assert_eq!(blocks[0].count[0], 2);
        assert_eq!(blocks[0].lnum[1], 2);
        assert_eq!(blocks[0].count[1], 3);
    }

    #[test]
    fn edit_between_blocks_creates_new_block_without_recompute() {
        let (mut ws, buf_a, _) = two_docs("a\nx\nb\nc\nd\ny\ne\n", "a\nX\nb\nc\nd\nY\ne\n");
        assert_eq!(ws.blocks().len(), 2);

        // One line above line 4 of doc 0, between the two blocks.
        replace(&buf_a, 4, 3, &["new"]);
        ws.apply_edit(0, 4, 3, 1);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].lnum[0], 4);
        assert_eq!(blocks[1].count[0], 1);
        assert_eq!(blocks[1].count[1], 0);
        // Doc 1 position of the fresh block honors the offset in effect
        // after the first block.
        assert_eq!(blocks[1].lnum[1], 4);
        // The last block shifted down on the edited side only.
        assert_eq!(blocks[2].lnum[0], 7);
        assert_eq!(blocks[2].lnum[1], 6);
    }

    #[test]
    fn in_place_edit_outside_blocks_marks_dirty() {
        let (mut ws, buf_a, _) = two_docs("a\nb\nc\n", "a\nB\nc\n");

        // Replacing line 1 with one line keeps the structure; the change is
        // outside every block, so the incremental path gives up.
        replace(&buf_a, 1, 1, &["A"]);
        ws.apply_edit(0, 1, 1, 1);
        assert!(ws.is_dirty());
    }

    #[test]
    fn in_place_edit_inside_block_stays_clean() {
        let (mut ws, buf_a, _) = two_docs("a\nx\nc\n", "a\nB\nc\n");

        replace(&buf_a, 2, 2, &["q"]);
        ws.apply_edit(0, 2, 2, 1);
        assert!(!ws.is_dirty());
        assert_eq!(ws.blocks().len(), 1);
    }

    #[test]
    fn in_place_edit_restoring_equality_drops_the_block() {
        let (mut ws, buf_a, _) = two_docs("a\nx\nc\n", "a\nB\nc\n");

        replace(&buf_a, 2, 2, &["B"]);
        ws.apply_edit(0, 2, 2, 1);
        assert!(!ws.is_dirty());
        assert!(ws.blocks().is_empty());
    }

    #[test]
    fn leading_insertion_into_empty_list() {
        let (mut ws, buf_a, _) = two_docs("x\ny\nz\n", "x\ny\nz\n");
        assert!(ws.blocks().is_empty());

        replace(&buf_a, 1, 0, &["w"]);
        ws.apply_edit(0, 1, 0, 1);
        assert!(!ws.is_dirty());

        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lnum[0], 1);
        assert_eq!(blocks[0].count[0], 1);
        assert_eq!(blocks[0].lnum[1], 1);
        assert_eq!(blocks[0].count[1], 0);
    }

    #[test]
    fn deletion_spanning_two_blocks_and_the_gap() {
        // Blocks at lines 2 and 4 of doc 0; delete lines 2-4 in one edit.
        let (mut ws, buf_a, _) = two_docs("a\nx\nb\ny\nc\n", "a\nP\nb\nQ\nc\n");
        assert_eq!(ws.blocks().len(), 2);

        replace(&buf_a, 2, 4, &[]);
        ws.apply_edit(0, 2, 4, 0);
        assert!(!ws.is_dirty());

        // Everything collapses into one block: nothing left on the doc 0
        // side, doc 1 keeps its three lines as the difference.
        let blocks = ws.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].count[0], 0);
        assert_eq!(blocks[0].lnum[1], 2);
        assert_eq!(blocks[0].count[1], 3);
    }
}
