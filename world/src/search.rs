//! Reusable breadth-first search workspace shared by the navigation solvers.

use std::collections::VecDeque;

use rampart_core::Direction;

/// Epoch at which the visited buffer is wiped instead of incremented further.
pub(crate) const EPOCH_RESET_THRESHOLD: u32 = 1 << 30;

/// Marker stored in the parent buffer for cells without a predecessor.
pub(crate) const NO_PARENT: usize = usize::MAX;

/// Visited stamps, parent links and frontier queue reused across searches.
///
/// A cell counts as visited in the current search iff its stamp equals the
/// current epoch, so starting a search never clears the buffer. The buffers
/// are reallocated only when the cell count changes.
#[derive(Clone, Debug)]
pub(crate) struct SearchScratch {
    visited: Vec<u32>,
    parents: Vec<usize>,
    queue: VecDeque<usize>,
    epoch: u32,
    reset_threshold: u32,
}

impl SearchScratch {
    pub(crate) fn new() -> Self {
        Self::with_reset_threshold(EPOCH_RESET_THRESHOLD)
    }

    pub(crate) fn with_reset_threshold(reset_threshold: u32) -> Self {
        Self {
            visited: Vec::new(),
            parents: Vec::new(),
            queue: VecDeque::new(),
            epoch: 0,
            reset_threshold: reset_threshold.max(2),
        }
    }

    /// Sizes the buffers for `cell_count` cells and opens a fresh search.
    pub(crate) fn begin(&mut self, cell_count: usize) {
        if self.visited.len() != cell_count {
            self.visited = vec![0; cell_count];
            self.parents = vec![NO_PARENT; cell_count];
            self.epoch = 0;
        }

        self.epoch += 1;
        if self.epoch >= self.reset_threshold {
            self.visited.fill(0);
            self.epoch = 1;
        }

        self.queue.clear();
    }

    /// Stamps the cell as visited, returning `false` if it already was.
    pub(crate) fn visit(&mut self, index: usize) -> bool {
        match self.visited.get_mut(index) {
            Some(stamp) if *stamp != self.epoch => {
                *stamp = self.epoch;
                true
            }
            _ => false,
        }
    }

    /// Stamps the cell as visited, records its parent and enqueues it.
    pub(crate) fn discover(&mut self, index: usize, parent: usize) {
        if self.visit(index) {
            self.parents[index] = parent;
            self.queue.push_back(index);
        }
    }

    /// Enqueues a search origin that has no predecessor.
    pub(crate) fn discover_root(&mut self, index: usize) {
        self.discover(index, NO_PARENT);
    }

    pub(crate) fn pop(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }

    pub(crate) fn parent(&self, index: usize) -> Option<usize> {
        self.parents
            .get(index)
            .copied()
            .filter(|parent| *parent != NO_PARENT)
    }

    #[cfg(test)]
    pub(crate) fn epoch(&self) -> u32 {
        self.epoch
    }
}

impl Default for SearchScratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat index of the cell one step away in `direction`.
///
/// Steps that would leave the grid return `None`; in particular stepping east
/// from the last column never wraps onto the next row.
pub(crate) fn neighbor_index(
    index: usize,
    direction: Direction,
    columns: usize,
    rows: usize,
) -> Option<usize> {
    if columns == 0 {
        return None;
    }

    let column = index % columns;
    let row = index / columns;
    if row >= rows {
        return None;
    }

    match direction {
        Direction::North => row.checked_sub(1).map(|row| row * columns + column),
        Direction::East => (column + 1 < columns).then(|| index + 1),
        Direction::South => (row + 1 < rows).then(|| index + columns),
        Direction::West => column.checked_sub(1).map(|column| row * columns + column),
    }
}
