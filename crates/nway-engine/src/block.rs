//! The diff block store: an arena-backed ordered list of multi-document
//! difference blocks.
//!
//! Blocks are kept in an arena and chained by index, with explicit head and
//! tail. Removal and merging are plain index updates; freed slots go on a
//! free list for reuse. Per occupied participant slot the chain is strictly
//! ordered and non-overlapping: `lnum[i] + count[i] <= next.lnum[i]`.

use nway_types::{LineCount, LineNum, MAX_PARTICIPANTS};

/// One unified difference region, tracking every participant's extent.
///
/// A `count` of zero for a slot means that slot has no text in this region
/// (the lines were inserted in the other documents, or deleted here).
/// Non-participating slots carry zeroes and are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffBlock {
    /// Starting line of the block per slot (1-based).
    pub lnum: [LineNum; MAX_PARTICIPANTS],
    /// Number of lines of the block per slot.
    pub count: [LineCount; MAX_PARTICIPANTS],
}

impl DiffBlock {
    /// One past the last line of this block in `slot`.
    pub fn end(&self, slot: usize) -> LineNum {
        self.lnum[slot] + self.count[slot]
    }

    /// Returns `true` when the count is zero for every occupied slot.
    pub fn is_degenerate(&self, occupied: &[bool; MAX_PARTICIPANTS]) -> bool {
        (0..MAX_PARTICIPANTS).all(|i| !occupied[i] || self.count[i] == 0)
    }
}

#[derive(Clone, Debug)]
struct BlockNode {
    block: DiffBlock,
    next: Option<usize>,
}

/// Arena-backed singly linked list of [`DiffBlock`]s.
#[derive(Clone, Debug, Default)]
pub struct BlockArena {
    nodes: Vec<Option<BlockNode>>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Vec<usize>,
    len: usize,
}

impl BlockArena {
    /// Create an empty block list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list has no blocks.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the first block.
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    /// Index of the last block.
    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    /// Index of the block following `idx`.
    pub fn next(&self, idx: usize) -> Option<usize> {
        self.nodes.get(idx).and_then(|n| n.as_ref()).and_then(|n| n.next)
    }

    /// Shared access to a block.
    ///
    /// Panics on a stale index; indices are only ever produced by this arena
    /// and invalidated by `clear`.
    pub fn get(&self, idx: usize) -> &DiffBlock {
        &self.nodes[idx].as_ref().expect("stale block index").block
    }

    /// Exclusive access to a block.
    pub fn get_mut(&mut self, idx: usize) -> &mut DiffBlock {
        &mut self.nodes[idx].as_mut().expect("stale block index").block
    }

    /// Remove all blocks.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn alloc(&mut self, block: DiffBlock, next: Option<usize>) -> usize {
        let node = BlockNode { block, next };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.len += 1;
        idx
    }

    /// Insert `block` after `prev`, or at the head when `prev` is `None`.
    /// Returns the new block's index.
    pub fn insert_after(&mut self, prev: Option<usize>, block: DiffBlock) -> usize {
        match prev {
            None => {
                let idx = self.alloc(block, self.head);
                if self.head.is_none() {
                    self.tail = Some(idx);
                }
                self.head = Some(idx);
                idx
            }
            Some(p) => {
                let next = self.next(p);
                let idx = self.alloc(block, next);
                self.nodes[p].as_mut().expect("stale block index").next = Some(idx);
                if next.is_none() {
                    self.tail = Some(idx);
                }
                idx
            }
        }
    }

    /// Remove the block following `prev` (the head when `prev` is `None`).
    /// Returns the removed block, if any.
    pub fn remove_after(&mut self, prev: Option<usize>) -> Option<DiffBlock> {
        let victim = match prev {
            None => self.head?,
            Some(p) => self.next(p)?,
        };
        let node = self.nodes[victim].take().expect("stale block index");
        match prev {
            None => self.head = node.next,
            Some(p) => self.nodes[p].as_mut().expect("stale block index").next = node.next,
        }
        if self.tail == Some(victim) {
            self.tail = prev;
        }
        self.free.push(victim);
        self.len -= 1;
        Some(node.block)
    }

    /// Remove every block strictly after `first` up to and including `last`.
    /// No-op when `last == first`.
    pub fn remove_between(&mut self, first: usize, last: usize) {
        while self.next(first).is_some() {
            let removing_last = self.next(first) == Some(last);
            self.remove_after(Some(first));
            if removing_last {
                break;
            }
        }
    }

    /// Iterate over block indices in list order.
    pub fn indices(&self) -> BlockIndices<'_> {
        BlockIndices {
            arena: self,
            cur: self.head,
        }
    }

    /// Iterate over blocks in list order.
    pub fn iter(&self) -> impl Iterator<Item = &DiffBlock> + '_ {
        self.indices().map(move |idx| self.get(idx))
    }

    /// Collect the blocks into a vector, for comparison and display.
    pub fn to_vec(&self) -> Vec<DiffBlock> {
        self.iter().copied().collect()
    }

    /// Check the strict ordering and non-overlap invariant for every
    /// occupied slot. Used by tests and debug assertions.
    pub fn is_ordered(&self, occupied: &[bool; MAX_PARTICIPANTS]) -> bool {
        let mut prev: Option<&DiffBlock> = None;
        for block in self.iter() {
            if let Some(p) = prev {
                for i in 0..MAX_PARTICIPANTS {
                    if occupied[i] && p.end(i) > block.lnum[i] {
                        return false;
                    }
                }
            }
            prev = Some(block);
        }
        true
    }
}

/// Iterator over block indices in list order.
pub struct BlockIndices<'a> {
    arena: &'a BlockArena,
    cur: Option<usize>,
}

impl Iterator for BlockIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.cur?;
        self.cur = self.arena.next(idx);
        Some(idx)
    }
}
