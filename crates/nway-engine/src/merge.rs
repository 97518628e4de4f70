//! Folding pairwise hunks into the unified multi-document block list.
//!
//! `merge_hunks` is called once per participant pair: slot `idx_orig` (the
//! base, the lowest occupied slot) against slot `idx_new`, with the hunks in
//! increasing `orig_start` order. Blocks that no hunk touches agree between
//! the two documents; their `idx_new` extent is copied from the base extent
//! shifted by the running offset accumulated at the previous block. Hunks
//! overlapping existing blocks grow them to the minimal union; the rest
//! become fresh blocks. Slots strictly between `idx_orig` and `idx_new` were
//! merged earlier and inherit the base extent wherever a fresh block
//! appears: had they differed there, they would have contributed their own
//! hunk.

use nway_types::{Hunk, MAX_PARTICIPANTS};

use crate::block::{BlockArena, DiffBlock};

/// Fill in slot `idx_new` of the block list from the pairwise `hunks`
/// between `idx_orig` and `idx_new`.
pub fn merge_hunks(
    arena: &mut BlockArena,
    occupied: &[bool; MAX_PARTICIPANTS],
    idx_orig: usize,
    idx_new: usize,
    hunks: &[Hunk],
) {
    let mut dprev: Option<usize> = None;
    let mut dp = arena.head();
    // Whether the idx_new extent of the block at `dp` still has to be set.
    let mut notset = true;

    for hunk in hunks {
        // Blocks entirely before this hunk: orig and new agree there, copy
        // the base extent across.
        while let Some(cur) = dp {
            if hunk.orig_start <= arena.get(cur).end(idx_orig) {
                break;
            }
            if notset {
                copy_entry(arena, dprev, cur, idx_orig, idx_new);
            }
            dprev = dp;
            dp = arena.next(cur);
            notset = true;
        }

        let overlaps = dp.is_some_and(|cur| {
            let block = arena.get(cur);
            hunk.orig_start <= block.end(idx_orig) && hunk.orig_end() >= block.lnum[idx_orig]
        });

        if let (Some(cur), true) = (dp, overlaps) {
            // The hunk overlaps one or more existing blocks: find the last
            // one it touches.
            let mut dpl = cur;
            while let Some(next) = arena.next(dpl) {
                if hunk.orig_end() < arena.get(next).lnum[idx_orig] {
                    break;
                }
                dpl = next;
            }

            // Leading disagreement: the hunk starts above the block, pull
            // the block's start back for every already-set slot.
            let off = arena.get(cur).lnum[idx_orig] - hunk.orig_start;
            if off > 0 {
                for i in idx_orig..idx_new {
                    if occupied[i] {
                        let block = arena.get_mut(cur);
                        block.lnum[i] -= off;
                        block.count[i] += off;
                    }
                }
                let block = arena.get_mut(cur);
                block.lnum[idx_new] = hunk.new_start;
                block.count[idx_new] = hunk.new_count;
            } else if notset {
                // The hunk starts at or inside the block; the leading lines
                // agree and count as offset, not as change.
                let block = arena.get_mut(cur);
                block.lnum[idx_new] = hunk.new_start + off;
                block.count[idx_new] = hunk.new_count - off;
            } else {
                // Second hunk overlapping a block whose idx_new extent was
                // already set; extend the count.
                let grow = hunk.new_count - hunk.orig_count + arena.get(dpl).end(idx_orig)
                    - arena.get(cur).end(idx_orig);
                arena.get_mut(cur).count[idx_new] += grow;
            }

            // Grow the block to whichever of the existing span and the hunk
            // ends last.
            let mut tail_off = (hunk.orig_end() - 1) - (arena.get(dpl).end(idx_orig) - 1);
            if tail_off < 0 {
                if notset {
                    arena.get_mut(cur).count[idx_new] += -tail_off;
                }
                tail_off = 0;
            }
            for i in idx_orig..idx_new {
                if occupied[i] {
                    let end_i = arena.get(dpl).end(i);
                    let start_i = arena.get(cur).lnum[i];
                    arena.get_mut(cur).count[i] = end_i - start_i + tail_off;
                }
            }

            // Drop the blocks that were merged into the first one.
            if dpl != cur {
                arena.remove_between(cur, dpl);
            }
            dp = Some(cur);
        } else {
            // No overlap: insert a fresh block between dprev and dp.
            let mut block = DiffBlock::default();
            block.lnum[idx_orig] = hunk.orig_start;
            block.count[idx_orig] = hunk.orig_count;
            block.lnum[idx_new] = hunk.new_start;
            block.count[idx_new] = hunk.new_count;
            let fresh = arena.insert_after(dprev, block);

            // Slots between the base and the new document agree with the
            // base here.
            for i in (idx_orig + 1)..idx_new {
                if occupied[i] {
                    copy_entry(arena, dprev, fresh, idx_orig, i);
                }
            }
            dp = Some(fresh);
        }
        notset = false;
    }

    // For the remaining blocks orig and new agree.
    while let Some(cur) = dp {
        if notset {
            copy_entry(arena, dprev, cur, idx_orig, idx_new);
        }
        dprev = dp;
        dp = arena.next(cur);
        notset = true;
    }
}

/// Set the `idx_new` extent of `dp` from its `idx_orig` extent, shifted by
/// the line-numbering offset in effect after the previous block.
fn copy_entry(
    arena: &mut BlockArena,
    dprev: Option<usize>,
    dp: usize,
    idx_orig: usize,
    idx_new: usize,
) {
    let off = match dprev {
        None => 0,
        Some(p) => {
            let prev = arena.get(p);
            prev.end(idx_orig) - prev.end(idx_new)
        }
    };
    let block = arena.get_mut(dp);
    block.lnum[idx_new] = block.lnum[idx_orig] - off;
    block.count[idx_new] = block.count[idx_orig];
}
