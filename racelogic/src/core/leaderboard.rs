use crate::core::competitor::Competitor;
use crate::core::registry::Handle;

/// Leaderboard is an array based binary max-heap of competitor handles ordered by ranking
/// score (parent of `i` at `(i - 1) / 2`). It never owns the records: every operation reads the
/// scores from the competitor slice it is given, so scores changed in place are picked up by
/// `rebuild`.
#[derive(Debug, Default, Clone)]
pub struct Leaderboard {
    heap: Vec<Handle>,
}

fn score(competitors: &[Competitor], handle: Handle) -> f64 {
    competitors[handle.index()].ranking_score()
}

impl Leaderboard {
    pub fn new() -> Leaderboard {
        Leaderboard::default()
    }

    pub fn push(&mut self, handle: Handle, competitors: &[Competitor]) {
        self.heap.push(handle);
        self.sift_up(self.heap.len() - 1, competitors);
    }

    /// Removes and returns the handle with the highest score.
    pub fn pop(&mut self, competitors: &[Competitor]) -> Option<Handle> {
        if self.heap.is_empty() {
            return None;
        }
        let root = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0, competitors);
        }
        Some(root)
    }

    pub fn peek(&self) -> Option<Handle> {
        self.heap.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn size(&self) -> usize {
        self.heap.len()
    }

    /// Heap order is not guaranteed by the iteration order.
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.heap.iter().copied()
    }

    /// rebuild restores the heap order after scores were changed in place (bottom-up
    /// heapify, O(n)).
    pub fn rebuild(&mut self, competitors: &[Competitor]) {
        for i in (0..self.heap.len() / 2).rev() {
            self.sift_down(i, competitors);
        }
    }

    /// Handles sorted by descending score without touching the heap.
    pub fn ranking(&self, competitors: &[Competitor]) -> Vec<Handle> {
        let mut tmp = self.clone();
        let mut ranking = Vec::with_capacity(tmp.size());
        while let Some(handle) = tmp.pop(competitors) {
            ranking.push(handle);
        }
        ranking
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn sift_up(&mut self, mut i: usize, competitors: &[Competitor]) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if score(competitors, self.heap[parent]) < score(competitors, self.heap[i]) {
                self.heap.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize, competitors: &[Competitor]) {
        let len = self.heap.len();
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut idx_max = i;

            if left < len && score(competitors, self.heap[left]) > score(competitors, self.heap[idx_max]) {
                idx_max = left;
            }
            if right < len && score(competitors, self.heap[right]) > score(competitors, self.heap[idx_max]) {
                idx_max = right;
            }
            if idx_max == i {
                break;
            }
            self.heap.swap(i, idx_max);
            i = idx_max;
        }
    }
}
