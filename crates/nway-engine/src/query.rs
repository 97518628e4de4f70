//! Read-side queries over the block list: line classification, line
//! correspondence, in-line change bounds, and block navigation.
//!
//! Every query refreshes a dirty workspace first, so callers always see a
//! consistent view. Classification tolerates a slightly stale list: a line
//! inside a block whose text turns out to be equal everywhere reports
//! [`LineDiff::Unchanged`] rather than forcing a recompute.

use nway_types::{lines_match, LineCount, LineNum, MAX_PARTICIPANTS};

use crate::workspace::DiffWorkspace;

/// How one line of a participant relates to the other documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineDiff {
    /// The line is the same in every participant.
    Unchanged,
    /// The line differs from its counterpart lines.
    ChangedLine,
    /// The line has no counterpart in at least one participant.
    InsertedOrDeleted,
    /// This many virtual filler lines belong above the line to keep the
    /// participants vertically aligned.
    FillerAbove(LineCount),
}

/// Direction for block navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// In-line change extent of one line, from [`DiffWorkspace::find_change_bounds`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeBounds {
    /// The line has no counterpart in any other participant.
    pub added: bool,
    /// First and last differing byte column (0-based, inclusive), or `None`
    /// when no counterpart line differs in content.
    pub cols: Option<(usize, usize)>,
}

impl DiffWorkspace {
    /// Classify line `lnum` of the document in `slot`.
    pub fn classify(&mut self, slot: usize, lnum: LineNum) -> LineDiff {
        self.ensure_current();
        if !self.is_participant(slot) || self.arena.is_empty() {
            return LineDiff::Unchanged;
        }

        // First block that starts at or after the line, or has it just
        // below its end (the filler position).
        let Some(dp) = self
            .arena
            .indices()
            .find(|&idx| lnum <= self.arena.get(idx).end(slot))
        else {
            return LineDiff::Unchanged;
        };
        let block = *self.arena.get(dp);
        if lnum < block.lnum[slot] {
            return LineDiff::Unchanged;
        }

        if lnum < block.end(slot) {
            // Inside the block.
            let mut zero = false;
            let mut cmp = false;
            for i in 0..MAX_PARTICIPANTS {
                if !self.is_participant(i) || i == slot {
                    continue;
                }
                if block.count[i] == 0 {
                    zero = true;
                } else {
                    if block.count[i] != block.count[slot] {
                        return LineDiff::ChangedLine;
                    }
                    cmp = true;
                }
            }
            if cmp {
                // Equal counts everywhere: only a changed line when some
                // text actually differs.
                for i in 0..MAX_PARTICIPANTS {
                    if self.is_participant(i)
                        && i != slot
                        && block.count[i] != 0
                        && !self.equal_block_entry(dp, slot, i)
                    {
                        return LineDiff::ChangedLine;
                    }
                }
            }
            if !zero {
                // The list can be slightly stale after an in-place edit;
                // equal text inside a block is simply not highlighted.
                return LineDiff::Unchanged;
            }
            return LineDiff::InsertedOrDeleted;
        }

        // Just below the block: filler to align with longer participants.
        if !self.options.filler {
            return LineDiff::Unchanged;
        }
        let maxcount = (0..MAX_PARTICIPANTS)
            .filter(|&i| self.is_participant(i))
            .map(|i| block.count[i])
            .max()
            .unwrap_or(0);
        let filler = maxcount - block.count[slot];
        if filler > 0 {
            LineDiff::FillerAbove(filler)
        } else {
            LineDiff::Unchanged
        }
    }

    /// Number of virtual filler lines above line `lnum` of `slot`.
    pub fn filler_above(&mut self, slot: usize, lnum: LineNum) -> LineCount {
        match self.classify(slot, lnum) {
            LineDiff::FillerAbove(n) => n,
            _ => 0,
        }
    }

    /// Map line `lnum` of `slot_a` to the corresponding line of `slot_b`.
    ///
    /// Inside a block the offset into the block is preserved, clamped to
    /// the target's extent; outside the blocks the accumulated line-count
    /// difference is applied. The result is always a valid concrete line of
    /// `slot_b`'s document (filler is virtual and never returned).
    pub fn corresponding_line(&mut self, slot_a: usize, lnum: LineNum, slot_b: usize) -> LineNum {
        self.ensure_current();
        if !self.is_participant(slot_a) || !self.is_participant(slot_b) || slot_a == slot_b {
            return lnum;
        }

        let mut baseline = 0;
        for idx in self.arena.indices() {
            let block = self.arena.get(idx);
            if block.lnum[slot_a] > lnum {
                break;
            }
            if lnum < block.end(slot_a) {
                // Inside the block: keep the offset, clamped so the result
                // stays within (or at the line right after) the extent.
                let mut offset = lnum - block.lnum[slot_a];
                if offset > block.count[slot_b] {
                    offset = block.count[slot_b];
                }
                return block.lnum[slot_b] + offset;
            }
            baseline = block.end(slot_a) - block.end(slot_b);
        }

        let mapped = lnum - baseline;
        mapped.clamp(1, self.line_count(slot_b).max(1))
    }

    /// Byte bounds of the changed part of line `lnum` in `slot`, compared
    /// against every other participant's counterpart line.
    pub fn find_change_bounds(&mut self, slot: usize, lnum: LineNum) -> ChangeBounds {
        let none = ChangeBounds {
            added: false,
            cols: None,
        };
        self.ensure_current();
        if !self.is_participant(slot) {
            return none;
        }

        let Some(dp) = self
            .arena
            .indices()
            .find(|&idx| lnum <= self.arena.get(idx).end(slot))
        else {
            return none;
        };
        let block = *self.arena.get(dp);
        if lnum < block.lnum[slot] || lnum >= block.end(slot) || !self.check_sanity(dp) {
            return none;
        }
        let Some(line_org) = self.line(slot, lnum) else {
            return none;
        };
        let off = lnum - block.lnum[slot];

        let mut added = true;
        let mut start = usize::MAX;
        let mut end: Option<usize> = None;
        for i in 0..MAX_PARTICIPANTS {
            if !self.is_participant(i) || i == slot {
                continue;
            }
            // A counterpart exists only while the offset is within the
            // other document's extent.
            if off >= block.count[i] {
                continue;
            }
            added = false;
            let Some(line_new) = self.line(i, block.lnum[i] + off) else {
                continue;
            };
            if let Some((si, ei)) = self.line_change_span(&line_org, &line_new) {
                start = start.min(si);
                end = Some(end.map_or(ei, |e: usize| e.max(ei)));
            }
        }

        ChangeBounds {
            added,
            cols: end.filter(|_| start != usize::MAX).map(|e| (start, e)),
        }
    }

    /// First and last differing byte (inclusive) between two lines, under
    /// the whitespace and case options. `None` when they match.
    fn line_change_span(&self, org: &str, new: &str) -> Option<(usize, usize)> {
        let a = org.as_bytes();
        let b = new.as_bytes();
        let byte_eq = |x: u8, y: u8| {
            if self.options.icase {
                x.eq_ignore_ascii_case(&y)
            } else {
                x == y
            }
        };
        let is_ws = |x: u8| x == b' ' || x == b'\t';

        // Forward scan for the first difference.
        let mut si_a = 0;
        let mut si_b = 0;
        loop {
            if self.options.iwhiteall {
                while si_a < a.len() && is_ws(a[si_a]) {
                    si_a += 1;
                }
                while si_b < b.len() && is_ws(b[si_b]) {
                    si_b += 1;
                }
            }
            match (a.get(si_a), b.get(si_b)) {
                (Some(&x), Some(&y)) if byte_eq(x, y) => {
                    si_a += 1;
                    si_b += 1;
                }
                (Some(&x), Some(&y))
                    if self.options.iwhite && is_ws(x) && is_ws(y) =>
                {
                    si_a += 1;
                    si_b += 1;
                }
                (None, None) => return None,
                _ => break,
            }
        }

        // Backward scan for the last difference.
        let mut ei_a = a.len();
        let mut ei_b = b.len();
        loop {
            if self.options.iwhiteall {
                while ei_a > si_a && is_ws(a[ei_a - 1]) {
                    ei_a -= 1;
                }
                while ei_b > si_b && is_ws(b[ei_b - 1]) {
                    ei_b -= 1;
                }
            }
            if ei_a > si_a && ei_b > si_b {
                let (x, y) = (a[ei_a - 1], b[ei_b - 1]);
                if byte_eq(x, y) || (self.options.iwhite && is_ws(x) && is_ws(y)) {
                    ei_a -= 1;
                    ei_b -= 1;
                    continue;
                }
            }
            break;
        }

        let last = ei_a.max(si_a + 1) - 1;
        Some((si_a, last.max(si_a)))
    }

    /// Line to land on when jumping `count` difference blocks from
    /// `cursor` in `dir`, in `slot`'s numbering. `None` when there is no
    /// block to move to.
    pub fn next_block(
        &mut self,
        slot: usize,
        dir: Direction,
        count: usize,
        cursor: LineNum,
    ) -> Option<LineNum> {
        self.ensure_current();
        if !self.is_participant(slot) || self.arena.is_empty() {
            return None;
        }

        let line_count = self.line_count(slot);
        let mut lnum = cursor;
        for _ in 0..count.max(1) {
            let target = match dir {
                Direction::Forward => self
                    .arena
                    .iter()
                    .map(|b| b.lnum[slot])
                    .find(|&start| start > lnum),
                Direction::Backward => self
                    .arena
                    .iter()
                    .map(|b| b.lnum[slot])
                    .take_while(|&start| start < lnum)
                    .last(),
            };
            match target {
                Some(start) => lnum = start,
                None => break,
            }
        }

        let lnum = lnum.clamp(1, line_count.max(1));
        if lnum == cursor {
            None
        } else {
            Some(lnum)
        }
    }
}
