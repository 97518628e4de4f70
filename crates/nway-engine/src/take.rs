//! Merge-style editing: copy the text of difference blocks from one
//! participant into another.
//!
//! The block list is maintained in place while the target document is
//! rewritten, so a series of takes needs no recompute in between. Blocks
//! whose text becomes equal in every participant are dropped on the spot.

use tracing::debug;

use nway_types::{LineNum, MAX_PARTICIPANTS};

use crate::error::{EngineError, EngineResult};
use crate::workspace::DiffWorkspace;

impl DiffWorkspace {
    /// Replace the blocks intersecting lines `[line1, line2]` of the target
    /// document with the corresponding text of the source document.
    ///
    /// The range is in the target's line numbering. Either endpoint may be
    /// `None`: a missing slot is inferred as the only other participant,
    /// which requires the group to have exactly two. Both resolved slots
    /// must participate.
    pub fn take(
        &mut self,
        from: Option<usize>,
        to: Option<usize>,
        line1: LineNum,
        line2: LineNum,
    ) -> EngineResult<()> {
        self.ensure_current();
        let (idx_from, idx_to) = self.resolve_slots(from, to)?;
        let Some(guard) = self.try_mutate() else {
            return Ok(());
        };
        let result = self.take_locked(idx_from, idx_to, line1, line2);
        self.release(guard);
        result
    }

    fn resolve_slots(&self, from: Option<usize>, to: Option<usize>) -> EngineResult<(usize, usize)> {
        let check = |slot: usize| -> EngineResult<usize> {
            if self.is_participant(slot) {
                Ok(slot)
            } else {
                Err(EngineError::NotInDiffMode)
            }
        };
        let infer_other = |slot: usize| -> EngineResult<usize> {
            let participants = self.participants();
            if participants.len() != 2 {
                return Err(EngineError::AmbiguousTarget);
            }
            participants
                .into_iter()
                .find(|&p| p != slot)
                .ok_or(EngineError::NotInDiffMode)
        };
        match (from, to) {
            (Some(f), Some(t)) if f == t => Err(EngineError::AmbiguousTarget),
            (Some(f), Some(t)) => Ok((check(f)?, check(t)?)),
            (Some(f), None) => {
                let f = check(f)?;
                Ok((f, infer_other(f)?))
            }
            (None, Some(t)) => {
                let t = check(t)?;
                Ok((infer_other(t)?, t))
            }
            (None, None) => Err(EngineError::AmbiguousTarget),
        }
    }

    fn take_locked(
        &mut self,
        idx_from: usize,
        idx_to: usize,
        line1: LineNum,
        line2: LineNum,
    ) -> EngineResult<()> {
        let occupied = self.occupied();
        // Accumulated growth of the target document; the requested range
        // keeps referring to the original numbering.
        let mut off: LineNum = 0;
        let mut prev: Option<usize> = None;
        let mut cur = self.arena.head();

        while let Some(dp) = cur {
            let block = *self.arena.get(dp);
            if block.lnum[idx_to] > line2 + off {
                break;
            }
            let mut removed = false;

            if block.end(idx_to) > line1 + off {
                // The block intersects the requested range; a partial
                // intersection leaves the skipped lines in place.
                let mut lnum = block.lnum[idx_to];
                let mut count = block.count[idx_to];
                let mut start_skip = line1 + off - block.lnum[idx_to];
                if start_skip > 0 {
                    if start_skip > count {
                        lnum += count;
                        count = 0;
                    } else {
                        count -= start_skip;
                        lnum += start_skip;
                    }
                } else {
                    start_skip = 0;
                }

                let mut end_skip = block.end(idx_to) - 1 - (line2 + off);
                if end_skip > 0 {
                    // The range ends above the end of the block: do not
                    // replace the tail, and take fewer source lines.
                    count -= end_skip;
                    end_skip = block.count[idx_from] - start_skip - count;
                    if end_skip < 0 {
                        end_skip = 0;
                    }
                } else {
                    end_skip = 0;
                }
                let count = count.max(0);

                let take_count = (block.count[idx_from] - start_skip - end_skip).max(0);
                let from_first = block.lnum[idx_from] + start_skip;
                let new_lines = self.buffer_lines(idx_from, from_first, from_first + take_count - 1);
                let added = new_lines.len() as LineNum - count;

                self.buffer_replace(idx_to, lnum, lnum + count - 1, new_lines);
                let new_count = block.count[idx_to] + added;
                self.arena.get_mut(dp).count[idx_to] = new_count;

                if start_skip == 0 && end_skip == 0 {
                    // The whole block was taken; when every other
                    // participant already agrees with the source, the
                    // difference is gone.
                    let all_equal = (0..MAX_PARTICIPANTS)
                        .filter(|&i| occupied[i] && i != idx_from && i != idx_to)
                        .all(|i| self.equal_block_entry(dp, idx_from, i));
                    if all_equal {
                        cur = self.arena.next(dp);
                        self.arena.remove_after(prev);
                        removed = true;
                    }
                }

                if added != 0 {
                    // Later blocks shift by the growth; the edit itself was
                    // confined to this block.
                    let shift_from = if removed { cur } else { self.arena.next(dp) };
                    let mut walk = shift_from;
                    while let Some(idx) = walk {
                        self.arena.get_mut(idx).lnum[idx_to] += added;
                        walk = self.arena.next(idx);
                    }
                }
                off += added;
                debug!(
                    from = idx_from,
                    to = idx_to,
                    lnum,
                    count,
                    added,
                    removed,
                    "took block text"
                );
            }

            if !removed {
                prev = Some(dp);
                cur = self.arena.next(dp);
            }
        }

        self.sweep_degenerate();
        Ok(())
    }

    fn buffer_lines(&self, slot: usize, first: LineNum, last: LineNum) -> Vec<String> {
        match &self.slots[slot] {
            Some(p) => p.buffer.lock().expect("buffer lock poisoned").lines(first, last),
            None => Vec::new(),
        }
    }

    fn buffer_replace(&self, slot: usize, first: LineNum, last: LineNum, lines: Vec<String>) {
        if let Some(p) = &self.slots[slot] {
            p.buffer
                .lock()
                .expect("buffer lock poisoned")
                .replace_lines(first, last, lines);
        }
    }
}
