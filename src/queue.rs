/// Max-heap of pending merges.
///
/// Entries are never removed or re-keyed once pushed.  The encoder detects
/// superseded entries when they surface (see `tokenizer.rs`), which keeps
/// this a plain `BinaryHeap`.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Error, Result};
use crate::sequence::Handle;

/// Which end of the score range wins a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrder {
    /// Higher score first (log-probability vocabularies).
    Descending,
    /// Lower score first (rank vocabularies, rank 0 is the best merge).
    Ascending,
}

impl ScoreOrder {
    /// `Greater` when `a` should be merged before `b`.
    #[inline]
    pub fn compare(self, a: f64, b: f64) -> Ordering {
        match self {
            ScoreOrder::Descending => a.total_cmp(&b),
            ScoreOrder::Ascending => b.total_cmp(&a),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub left: Handle,
    pub right: Handle,
    pub score: f64,
    /// Byte length of the merged content when the candidate was created.
    pub checksum: usize,
}

struct Ranked {
    order: ScoreOrder,
    cand: Candidate,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order
            .compare(self.cand.score, other.cand.score)
            // earlier left handle wins ties
            .then_with(|| other.cand.left.cmp(&self.cand.left))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

pub struct CandidateQueue {
    order: ScoreOrder,
    heap: BinaryHeap<Ranked>,
}

impl CandidateQueue {
    pub fn new(order: ScoreOrder) -> Self {
        CandidateQueue {
            order,
            heap: BinaryHeap::new(),
        }
    }

    pub fn with_capacity(order: ScoreOrder, n: usize) -> Self {
        CandidateQueue {
            order,
            heap: BinaryHeap::with_capacity(n),
        }
    }

    pub fn push(&mut self, cand: Candidate) {
        self.heap.push(Ranked {
            order: self.order,
            cand,
        });
    }

    pub fn pop(&mut self) -> Result<Candidate> {
        self.heap.pop().map(|r| r.cand).ok_or(Error::EmptyQueue)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Sequence;

    fn handles(n: usize) -> Vec<Handle> {
        let mut seq = Sequence::new();
        (0..n).map(|_| seq.append("x")).collect()
    }

    fn cand(h: &[Handle], left: usize, score: f64) -> Candidate {
        Candidate {
            left: h[left],
            right: h[left + 1],
            score,
            checksum: 2,
        }
    }

    fn drain(q: &mut CandidateQueue) -> Vec<(usize, f64)> {
        let mut out = Vec::new();
        while !q.is_empty() {
            let c = q.pop().unwrap();
            out.push((c.left.index(), c.score));
        }
        out
    }

    #[test]
    fn descending_prefers_high_score_then_early_left() {
        let h = handles(6);
        let mut q = CandidateQueue::new(ScoreOrder::Descending);
        q.push(cand(&h, 3, 1.0));
        q.push(cand(&h, 0, -2.0));
        q.push(cand(&h, 4, 5.0));
        q.push(cand(&h, 1, 1.0));
        assert_eq!(q.len(), 4);
        assert_eq!(drain(&mut q), vec![(4, 5.0), (1, 1.0), (3, 1.0), (0, -2.0)]);
    }

    #[test]
    fn ascending_prefers_low_rank_then_early_left() {
        let h = handles(6);
        let mut q = CandidateQueue::with_capacity(ScoreOrder::Ascending, 4);
        q.push(cand(&h, 2, 5.0));
        q.push(cand(&h, 4, 0.0));
        q.push(cand(&h, 3, 7.0));
        q.push(cand(&h, 0, 5.0));
        assert_eq!(drain(&mut q), vec![(4, 0.0), (0, 5.0), (2, 5.0), (3, 7.0)]);
    }

    #[test]
    fn pop_on_empty_is_an_error() {
        let mut q = CandidateQueue::new(ScoreOrder::Descending);
        assert!(q.is_empty());
        assert!(matches!(q.pop(), Err(Error::EmptyQueue)));
    }
}
