// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity binary max-heap used to keep the current best `k` candidates
//! during nearest-neighbor search.
//!
//! The heap is ordered by a [`HeapOrder`]; the element that ranks highest sits
//! at the top. With [`NaturalOrder`] over [`Neighbor`] the top is the worst
//! (farthest) candidate kept so far, so "replace the worst if the new one is
//! better" is a [`PriorityQueue::top`] check followed by
//! [`PriorityQueue::pop_push`].

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use crate::error::{IndexError, Result};

/// Ordering relation for a [`PriorityQueue`].
pub trait HeapOrder<T> {
    /// `Greater` means `a` ranks closer to the top than `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Order by `T: Ord`; the largest element is on top.
#[derive(Copy, Clone, Debug, Default)]
pub struct NaturalOrder;

impl<T: Ord> HeapOrder<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Order by a comparison closure.
#[derive(Copy, Clone)]
pub struct FnOrder<F>(pub F);

impl<F> Debug for FnOrder<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("FnOrder").finish_non_exhaustive()
    }
}

impl<T, F: Fn(&T, &T) -> Ordering> HeapOrder<T> for FnOrder<F> {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b)
    }
}

/// A nearest-neighbor hit: primitive index and its distance to the target.
///
/// Ordered by distance, then by index, so that neighbor sets have a total,
/// deterministic order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor {
    /// Distance to the query target.
    pub distance: f64,
    /// Primitive index.
    pub index: usize,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// Bounded queue of nearest-neighbor candidates, worst on top.
pub type NeighborQueue = PriorityQueue<Neighbor>;

// Larger queues grow on demand, still never past their capacity.
const PREALLOCATE_MAX: usize = 1024;

/// Fixed-capacity binary max-heap.
pub struct PriorityQueue<T, O = NaturalOrder> {
    heap: Vec<T>,
    capacity: usize,
    order: O,
}

impl<T, O: Default> PriorityQueue<T, O> {
    /// Create an empty queue that holds at most `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_order(capacity, O::default())
    }
}

impl<T, O> PriorityQueue<T, O> {
    /// Create an empty queue with an explicit order.
    pub fn with_order(capacity: usize, order: O) -> Self {
        Self {
            heap: Vec::with_capacity(capacity.min(PREALLOCATE_MAX)),
            capacity,
            order,
        }
    }

    /// Maximum number of elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of elements.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue holds no elements.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Whether the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Remove all elements, keeping the capacity.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// The top element, if any.
    pub fn top(&self) -> Option<&T> {
        self.heap.first()
    }

    /// Elements in heap (array) order.
    pub fn as_slice(&self) -> &[T] {
        &self.heap
    }
}

impl<T, O: HeapOrder<T>> PriorityQueue<T, O> {
    /// Insert an element.
    ///
    /// Fails with [`IndexError::CapacityExceeded`] if the queue is full.
    pub fn push(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            return Err(IndexError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.heap.push(value);
        self.sift_up(self.heap.len() - 1);
        Ok(())
    }

    /// Remove and return the top element.
    pub fn pop(&mut self) -> Option<T> {
        let last = self.heap.pop()?;
        if self.heap.is_empty() {
            return Some(last);
        }
        let top = core::mem::replace(&mut self.heap[0], last);
        self.sift_down(0);
        Some(top)
    }

    /// Equivalent to `pop()` followed by `push(value)`, done as a single
    /// down-heap pass. Returns the popped element.
    ///
    /// On an empty queue this is a plain push.
    pub fn pop_push(&mut self, value: T) -> Result<Option<T>> {
        if self.heap.is_empty() {
            self.push(value)?;
            return Ok(None);
        }
        let top = core::mem::replace(&mut self.heap[0], value);
        self.sift_down(0);
        Ok(Some(top))
    }

    /// Drain the queue, returning its elements from the bottom of the order up.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.heap.len());
        while let Some(v) = self.pop() {
            out.push(v);
        }
        out.reverse();
        out
    }

    /// Like [`into_sorted_vec`](Self::into_sorted_vec) but leaves the queue
    /// empty and reusable.
    pub fn drain_sorted(&mut self, out: &mut Vec<T>) {
        let start = out.len();
        while let Some(v) = self.pop() {
            out.push(v);
        }
        out[start..].reverse();
    }

    fn above(&self, a: usize, b: usize) -> bool {
        self.order.compare(&self.heap[a], &self.heap[b]) == Ordering::Greater
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.above(pos, parent) {
                break;
            }
            self.heap.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut next = pos;
            if left < len && self.above(left, next) {
                next = left;
            }
            if right < len && self.above(right, next) {
                next = right;
            }
            if next == pos {
                break;
            }
            self.heap.swap(pos, next);
            pos = next;
        }
    }
}

impl<T: Debug, O> Debug for PriorityQueue<T, O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("len", &self.heap.len())
            .field("capacity", &self.capacity)
            .field("top", &self.heap.first())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn heap_law_holds<T, O: HeapOrder<T>>(q: &PriorityQueue<T, O>) -> bool {
        let h = q.as_slice();
        (1..h.len()).all(|i| q.order.compare(&h[(i - 1) / 2], &h[i]) != Ordering::Less)
    }

    #[test]
    fn push_pop_is_max_first() {
        let mut q: PriorityQueue<i32> = PriorityQueue::with_capacity(8);
        for v in [5, 1, 9, 3, 7] {
            q.push(v).unwrap();
            assert!(heap_law_holds(&q));
        }
        assert_eq!(q.top(), Some(&9));
        assert_eq!(q.len(), 5);
        let drained: Vec<_> = core::iter::from_fn(|| q.pop()).collect();
        assert_eq!(drained, vec![9, 7, 5, 3, 1]);
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut q: PriorityQueue<u8> = PriorityQueue::with_capacity(2);
        q.push(1).unwrap();
        q.push(2).unwrap();
        assert!(q.is_full());
        assert_eq!(
            q.push(3),
            Err(IndexError::CapacityExceeded { capacity: 2 })
        );
        // pop_push never grows the queue, so it works when full.
        assert_eq!(q.pop_push(0), Ok(Some(2)));
        assert_eq!(q.len(), 2);
        assert_eq!(q.top(), Some(&1));

        let mut zero: PriorityQueue<u8> = PriorityQueue::with_capacity(0);
        assert!(zero.push(1).is_err());
        assert!(zero.pop_push(1).is_err());
    }

    #[test]
    fn pop_push_on_empty_pushes() {
        let mut q: PriorityQueue<u8> = PriorityQueue::with_capacity(1);
        assert_eq!(q.pop_push(4), Ok(None));
        assert_eq!(q.top(), Some(&4));
    }

    #[test]
    fn custom_order_makes_min_heap() {
        let mut q = PriorityQueue::with_order(4, FnOrder(|a: &i32, b: &i32| b.cmp(a)));
        for v in [3, 1, 2] {
            q.push(v).unwrap();
        }
        assert_eq!(q.top(), Some(&1));
        assert_eq!(q.into_sorted_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn neighbors_worst_on_top_with_index_tie_break() {
        let mut q = NeighborQueue::with_capacity(3);
        q.push(Neighbor { distance: 1.0, index: 4 }).unwrap();
        q.push(Neighbor { distance: 2.0, index: 0 }).unwrap();
        q.push(Neighbor { distance: 2.0, index: 7 }).unwrap();
        assert_eq!(q.top().map(|c| c.index), Some(7));
        let mut out = Vec::new();
        q.drain_sorted(&mut out);
        assert!(q.is_empty());
        let order: Vec<_> = out.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![4, 0, 7]);
    }

    #[test]
    fn randomized_operations_match_sorted_model() {
        let mut rng = StdRng::seed_from_u64(7);
        for cap in [1_usize, 2, 5, 16, 33] {
            let mut q: PriorityQueue<u32> = PriorityQueue::with_capacity(cap);
            let mut model: Vec<u32> = Vec::new();
            for _ in 0..500 {
                let v = rng.gen_range(0..100_u32);
                match rng.gen_range(0..3_u8) {
                    0 => {
                        let r = q.push(v);
                        if model.len() < cap {
                            assert!(r.is_ok());
                            model.push(v);
                        } else {
                            assert!(r.is_err());
                        }
                    }
                    1 => {
                        model.sort_unstable();
                        assert_eq!(q.pop(), model.pop());
                    }
                    _ => {
                        model.sort_unstable();
                        let popped = model.pop();
                        model.push(v);
                        assert_eq!(q.pop_push(v), Ok(popped));
                    }
                }
                assert!(heap_law_holds(&q));
                assert_eq!(q.len(), model.len());
                assert_eq!(q.top().copied(), model.iter().copied().max());
                assert!(q.len() <= q.capacity());
            }
        }
    }
}
