// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat vector backend with linear scans. Small and simple; good for tiny sets
//! and as a brute-force reference.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::{Backend, check_queue, offer, spatial_only};
use crate::error::Result;
use crate::predicate::Predicate;
use crate::queue::{Neighbor, NeighborQueue};
use crate::types::{Aabb3D, Point3};

/// Flat vector backend with linear scans.
#[derive(Clone, Default)]
pub struct FlatVec {
    entries: Vec<(usize, Aabb3D)>,
    bounds: Aabb3D,
    non_empty: usize,
}

impl FlatVec {
    /// Store `boxes`, indexed by position.
    pub fn new(boxes: &[Aabb3D]) -> Self {
        Self::from_entries(boxes.iter().copied().enumerate().collect())
    }

    /// Store `(index, box)` pairs with caller-chosen indices.
    pub fn from_entries(entries: Vec<(usize, Aabb3D)>) -> Self {
        let bounds = entries
            .iter()
            .fold(Aabb3D::EMPTY, |acc, (_, b)| acc.union(b));
        let non_empty = entries.iter().filter(|(_, b)| !b.is_empty()).count();
        Self {
            entries,
            bounds,
            non_empty,
        }
    }
}

impl Debug for FlatVec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlatVec")
            .field("len", &self.entries.len())
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl Backend for FlatVec {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn non_empty_len(&self) -> usize {
        self.non_empty
    }

    fn bounds(&self) -> Aabb3D {
        self.bounds
    }

    fn visit_spatial<F: FnMut(usize, &Aabb3D)>(
        &self,
        predicate: &Predicate,
        mut f: F,
    ) -> Result<()> {
        spatial_only(predicate)?;
        for (i, b) in &self.entries {
            if predicate.test(b) {
                f(*i, b);
            }
        }
        Ok(())
    }

    fn query_nearest_with(
        &self,
        target: Point3,
        k: usize,
        queue: &mut NeighborQueue,
        out: &mut Vec<Neighbor>,
    ) -> Result<()> {
        check_queue(k, queue)?;
        queue.clear();
        for (index, b) in &self.entries {
            if b.is_empty() {
                continue;
            }
            offer(
                queue,
                k,
                Neighbor {
                    distance: b.distance(&target),
                    index: *index,
                },
            )?;
        }
        queue.drain_sorted(out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn line(n: usize) -> Vec<Aabb3D> {
        (0..n)
            .map(|i| Aabb3D::from_point(Point3::new(i as f64, 0.0, 0.0)))
            .collect()
    }

    #[test]
    fn flatvec_spatial_and_nearest() {
        let fv = FlatVec::new(&line(5));
        assert_eq!(fv.len(), 5);
        assert_eq!(
            fv.bounds(),
            Aabb3D::new(Point3::ORIGIN, Point3::new(4.0, 0.0, 0.0))
        );
        let hits = fv
            .query_spatial(&Predicate::within(Point3::new(2.0, 0.0, 0.0), 1.0))
            .unwrap();
        assert_eq!(hits, vec![1, 2, 3]);

        let nn = fv.query_nearest(Point3::new(2.4, 0.0, 0.0), 2).unwrap();
        let idx: Vec<_> = nn.iter().map(|n| n.index).collect();
        assert_eq!(idx, vec![2, 3]);
    }

    #[test]
    fn flatvec_nearest_respects_smaller_k_than_capacity() {
        let fv = FlatVec::new(&line(6));
        let mut queue = NeighborQueue::with_capacity(8);
        let mut out = Vec::new();
        fv.query_nearest_with(Point3::ORIGIN, 3, &mut queue, &mut out)
            .unwrap();
        let idx: Vec<_> = out.iter().map(|n| n.index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn flatvec_rejects_nearest_in_spatial_walk() {
        let fv = FlatVec::new(&line(2));
        assert!(
            fv.query_spatial(&Predicate::nearest(Point3::ORIGIN, 1))
                .is_err()
        );
    }
}
