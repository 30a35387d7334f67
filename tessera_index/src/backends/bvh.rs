// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static binary bounding volume hierarchy with SAH-like splits.
//!
//! The tree is built once from a snapshot of boxes and never modified. Nodes
//! live in a single arena and refer to their children by offset; every leaf
//! holds exactly one primitive and every internal node's box is the union of
//! its children's boxes.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::backend::{Backend, check_queue, offer, spatial_only};
use crate::error::Result;
use crate::predicate::Predicate;
use crate::queue::{Neighbor, NeighborQueue};
use crate::types::{Aabb3D, DIM, Point3};

/// A static BVH over `(index, box)` primitives.
#[derive(Clone, Default)]
pub struct Bvh {
    root: Option<NodeIdx>,
    arena: Vec<Node>,
    len: usize,
    non_empty: usize,
}

#[derive(Copy, Clone, Debug)]
enum Kind {
    Leaf { index: usize },
    Internal { left: NodeIdx, right: NodeIdx },
}

#[derive(Copy, Clone, Debug)]
struct Node {
    bbox: Aabb3D,
    kind: Kind,
}

impl Node {
    const PLACEHOLDER: Self = Self {
        bbox: Aabb3D::EMPTY,
        kind: Kind::Leaf { index: usize::MAX },
    };
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

type BvhItem = (usize, Aabb3D);

/// Split cost of one side. Margin keeps flat and collinear sets splitting
/// evenly where surface area alone is zero.
#[inline]
fn metric(b: &Aabb3D) -> f64 {
    b.half_area() + b.margin()
}

fn sort_along(items: &mut [BvhItem], axis: usize) {
    items.sort_by(|a, b| {
        a.1.centroid()[axis]
            .total_cmp(&b.1.centroid()[axis])
            .then(a.0.cmp(&b.0))
    });
}

fn bbox_items(items: &[BvhItem]) -> Aabb3D {
    items
        .iter()
        .fold(Aabb3D::EMPTY, |acc, (_, b)| acc.union(b))
}

/// SAH-like split: for each axis sort by centroid, precompute prefix/suffix
/// boxes, and choose `k` minimizing `metric(LB_k) * k + metric(RB_k) * (n - k)`.
/// Equal costs prefer the more balanced split. Leaves `items` sorted along the
/// chosen axis and returns `k` in `1..n`.
fn split_sah(items: &mut [BvhItem], prefix: &mut Vec<Aabb3D>, suffix: &mut Vec<Aabb3D>) -> usize {
    let n = items.len();
    debug_assert!(n >= 2, "split needs at least two items");
    // (cost, imbalance, axis, k)
    let mut best: Option<(f64, usize, usize, usize)> = None;
    for axis in 0..DIM {
        sort_along(items, axis);

        prefix.clear();
        let mut acc = Aabb3D::EMPTY;
        for (_, b) in items.iter() {
            acc.expand_box(b);
            prefix.push(acc);
        }
        suffix.clear();
        suffix.resize(n, Aabb3D::EMPTY);
        let mut acc = Aabb3D::EMPTY;
        for (i, (_, b)) in items.iter().enumerate().rev() {
            acc.expand_box(b);
            suffix[i] = acc;
        }

        for k in 1..n {
            let cost = metric(&prefix[k - 1]) * k as f64 + metric(&suffix[k]) * (n - k) as f64;
            let imbalance = (2 * k).abs_diff(n);
            let better = match best {
                None => true,
                Some((bc, bi, _, _)) => cost < bc || (cost == bc && imbalance < bi),
            };
            if better {
                best = Some((cost, imbalance, axis, k));
            }
        }
    }
    let Some((_, _, axis, k)) = best else {
        return n / 2;
    };
    if axis != DIM - 1 {
        sort_along(items, axis);
    }
    k
}

impl Bvh {
    /// Build over `boxes`; primitive indices are positions in the slice.
    pub fn new(boxes: &[Aabb3D]) -> Self {
        Self::from_entries(boxes.iter().copied().enumerate().collect())
    }

    /// Build over `(index, box)` pairs with caller-chosen indices.
    pub fn from_entries(mut items: Vec<(usize, Aabb3D)>) -> Self {
        let n = items.len();
        if n == 0 {
            return Self::default();
        }
        let non_empty = items.iter().filter(|(_, b)| !b.is_empty()).count();
        let mut arena = Vec::with_capacity(2 * n - 1);
        arena.push(Node::PLACEHOLDER);
        let mut prefix = Vec::with_capacity(n);
        let mut suffix = Vec::with_capacity(n);

        // (node, lo, hi): fill `node` from `items[lo..hi]`.
        let mut work = vec![(0_usize, 0_usize, n)];
        while let Some((node, lo, hi)) = work.pop() {
            let range = &mut items[lo..hi];
            let bbox = bbox_items(range);
            if range.len() == 1 {
                arena[node] = Node {
                    bbox,
                    kind: Kind::Leaf { index: range[0].0 },
                };
                continue;
            }
            let k = split_sah(range, &mut prefix, &mut suffix);
            let left = arena.len();
            arena.push(Node::PLACEHOLDER);
            let right = arena.len();
            arena.push(Node::PLACEHOLDER);
            arena[node] = Node {
                bbox,
                kind: Kind::Internal {
                    left: NodeIdx::new(left),
                    right: NodeIdx::new(right),
                },
            };
            work.push((right, lo + k, hi));
            work.push((left, lo, lo + k));
        }

        Self {
            root: Some(NodeIdx::new(0)),
            arena,
            len: n,
            non_empty,
        }
    }

    /// Number of arena nodes (`2n - 1` for `n > 0`).
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Length of the longest root-to-leaf path, counted in nodes.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 1_usize)];
        while let Some((i, d)) = stack.pop() {
            deepest = deepest.max(d);
            if let Kind::Internal { left, right } = self.arena[i.get()].kind {
                stack.push((left, d + 1));
                stack.push((right, d + 1));
            }
        }
        deepest
    }
}

impl Backend for Bvh {
    fn len(&self) -> usize {
        self.len
    }

    fn non_empty_len(&self) -> usize {
        self.non_empty
    }

    fn bounds(&self) -> Aabb3D {
        self.root
            .map_or(Aabb3D::EMPTY, |r| self.arena[r.get()].bbox)
    }

    fn visit_spatial<F: FnMut(usize, &Aabb3D)>(
        &self,
        predicate: &Predicate,
        mut f: F,
    ) -> Result<()> {
        spatial_only(predicate)?;
        let Some(root_idx) = self.root else {
            return Ok(());
        };
        let mut stack = vec![root_idx];
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if !predicate.test(&n.bbox) {
                continue;
            }
            match n.kind {
                Kind::Leaf { index } => f(index, &n.bbox),
                Kind::Internal { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
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
        let Some(root_idx) = self.root else {
            return Ok(());
        };
        let k = k.min(self.len);

        // Entries carry the minimum possible distance from `target` to the subtree.
        let root_dist = self.arena[root_idx.get()].bbox.distance(&target);
        let mut stack = vec![(root_idx, root_dist)];
        while let Some((i, dist)) = stack.pop() {
            // Only empty subtrees are skipped; a far target can overflow real
            // distances to +inf, and those still compete by index.
            if self.arena[i.get()].bbox.is_empty() {
                continue;
            }
            // Strict: a subtree at exactly the worst distance may still hold a
            // smaller index.
            if queue.len() >= k && queue.top().is_some_and(|worst| dist > worst.distance) {
                continue;
            }
            match self.arena[i.get()].kind {
                Kind::Leaf { index } => offer(
                    queue,
                    k,
                    Neighbor {
                        distance: dist,
                        index,
                    },
                )?,
                Kind::Internal { left, right } => {
                    let dl = self.arena[left.get()].bbox.distance(&target);
                    let dr = self.arena[right.get()].bbox.distance(&target);
                    // Nearer child goes on top of the stack.
                    if dl <= dr {
                        stack.push((right, dr));
                        stack.push((left, dl));
                    } else {
                        stack.push((left, dl));
                        stack.push((right, dr));
                    }
                }
            }
        }
        queue.drain_sorted(out);
        Ok(())
    }
}

impl Debug for Bvh {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bvh")
            .field("len", &self.len)
            .field("arena_nodes", &self.arena.len())
            .field("bounds", &self.bounds())
            .finish_non_exhaustive()
    }
}
