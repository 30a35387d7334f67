// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait for local spatial search implementations.

use alloc::vec::Vec;

use crate::error::{IndexError, Result};
use crate::predicate::Predicate;
use crate::queue::{Neighbor, NeighborQueue};
use crate::types::{Aabb3D, Point3};

/// A static set of primitives that can answer every predicate kind.
///
/// Indices reported by a backend are the caller-supplied primitive indices.
pub trait Backend {
    /// Number of primitives.
    fn len(&self) -> usize;

    /// Whether the backend holds no primitives.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of primitives with a non-empty box, the only ones any query
    /// can report.
    fn non_empty_len(&self) -> usize;

    /// Union of all primitive boxes; [`Aabb3D::EMPTY`] when empty.
    fn bounds(&self) -> Aabb3D;

    /// Call `f` with the index and box of every primitive matching a spatial
    /// predicate.
    ///
    /// No order is guaranteed. Fails with [`IndexError::InvalidArgument`] for
    /// [`Predicate::Nearest`].
    fn visit_spatial<F: FnMut(usize, &Aabb3D)>(&self, predicate: &Predicate, f: F) -> Result<()>;

    /// Append the `min(k, len)` nearest primitives to `out`, ascending by
    /// distance then index, using `queue` as scratch space.
    ///
    /// Fails with [`IndexError::InvalidArgument`] when `k == 0` and with
    /// [`IndexError::CapacityExceeded`] when `k > queue.capacity()`.
    fn query_nearest_with(
        &self,
        target: Point3,
        k: usize,
        queue: &mut NeighborQueue,
        out: &mut Vec<Neighbor>,
    ) -> Result<()>;

    /// Call `f` with the index of every primitive matching a spatial predicate.
    fn for_each_spatial<F: FnMut(usize)>(&self, predicate: &Predicate, mut f: F) -> Result<()> {
        self.visit_spatial(predicate, |index, _| f(index))
    }

    /// Indices of the primitives matching a spatial predicate.
    fn query_spatial(&self, predicate: &Predicate) -> Result<Vec<usize>> {
        let mut out = Vec::new();
        self.for_each_spatial(predicate, |i| out.push(i))?;
        Ok(out)
    }

    /// The `min(k, len)` nearest primitives, ascending by distance then index.
    fn query_nearest(&self, target: Point3, k: usize) -> Result<Vec<Neighbor>> {
        check_neighbor_count(k)?;
        let k = k.min(self.len());
        let mut out = Vec::with_capacity(k);
        if k == 0 {
            return Ok(out);
        }
        let mut queue = NeighborQueue::with_capacity(k);
        self.query_nearest_with(target, k, &mut queue, &mut out)?;
        Ok(out)
    }

    /// Answer any predicate.
    ///
    /// Spatial hits carry the box distance to the center for `Within` and
    /// `0.0` for `Overlap`.
    fn query(&self, predicate: &Predicate) -> Result<Vec<Neighbor>> {
        let mut out = Vec::new();
        match predicate {
            Predicate::Nearest(n) => return self.query_nearest(n.target, n.k),
            Predicate::Within(s) => self.visit_spatial(predicate, |index, aabb| {
                out.push(Neighbor {
                    distance: aabb.distance(&s.center),
                    index,
                });
            })?,
            Predicate::Overlap(_) => self.visit_spatial(predicate, |index, _| {
                out.push(Neighbor {
                    distance: 0.0,
                    index,
                });
            })?,
        }
        Ok(out)
    }
}

pub(crate) fn check_neighbor_count(k: usize) -> Result<()> {
    if k == 0 {
        return Err(IndexError::InvalidArgument(
            "nearest requires at least one neighbor",
        ));
    }
    Ok(())
}

pub(crate) fn check_queue(k: usize, queue: &NeighborQueue) -> Result<()> {
    check_neighbor_count(k)?;
    if k > queue.capacity() {
        return Err(IndexError::CapacityExceeded {
            capacity: queue.capacity(),
        });
    }
    Ok(())
}

/// Keep `candidate` if fewer than `k` are kept or it beats the worst kept.
#[inline]
pub(crate) fn offer(queue: &mut NeighborQueue, k: usize, candidate: Neighbor) -> Result<()> {
    if queue.len() < k {
        queue.push(candidate)
    } else if queue.top().is_some_and(|worst| candidate < *worst) {
        queue.pop_push(candidate).map(|_| ())
    } else {
        Ok(())
    }
}

pub(crate) fn spatial_only(predicate: &Predicate) -> Result<()> {
    if predicate.is_spatial() {
        Ok(())
    } else {
        Err(IndexError::InvalidArgument(
            "nearest predicates are answered by the nearest traversal",
        ))
    }
}
