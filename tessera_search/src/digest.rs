// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-level tree over the per-rank bounding boxes.

use tessera_index::{Aabb3D, Backend, Bvh, Point3, Predicate};

use crate::error::Result;

/// What one rank contributes to the digest.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RankSummary {
    /// Union of the rank's primitive boxes.
    pub bounds: Aabb3D,
    /// Number of primitives on the rank.
    pub size: usize,
    /// Number of those primitives with a non-empty box.
    pub non_empty: usize,
}

impl RankSummary {
    /// Summarize a local backend.
    pub fn of<B: Backend>(local: &B) -> Self {
        Self {
            bounds: local.bounds(),
            size: local.len(),
            non_empty: local.non_empty_len(),
        }
    }

    fn is_searchable(&self) -> bool {
        self.non_empty > 0 && !self.bounds.is_empty()
    }
}

/// Replicated summary of the whole distributed tree: one [`RankSummary`] per
/// rank, and a small BVH over the searchable ranks' boxes whose leaf indices
/// are ranks.
///
/// Every rank builds the same digest from the same gathered data, so routing
/// decisions agree everywhere.
#[derive(Clone, Debug)]
pub struct RankDigest {
    tree: Bvh,
    ranks: Vec<RankSummary>,
}

impl RankDigest {
    /// Build from the summaries of every rank, indexed by rank.
    pub fn new(ranks: Vec<RankSummary>) -> Self {
        let entries = ranks
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_searchable())
            .map(|(rank, r)| (rank, r.bounds))
            .collect();
        Self {
            tree: Bvh::from_entries(entries),
            ranks,
        }
    }

    /// Number of ranks summarized (including empty ones).
    pub fn comm_size(&self) -> usize {
        self.ranks.len()
    }

    /// Number of ranks holding at least one primitive with a non-empty box.
    pub fn non_empty_ranks(&self) -> usize {
        self.tree.len()
    }

    /// Total number of primitives over all ranks.
    pub fn size(&self) -> usize {
        self.ranks.iter().map(|r| r.size).sum()
    }

    /// Union of all rank boxes.
    pub fn bounds(&self) -> Aabb3D {
        self.tree.bounds()
    }

    /// Summary of `rank`, if in range.
    pub fn rank(&self, rank: usize) -> Option<&RankSummary> {
        self.ranks.get(rank)
    }

    /// Primitive count of `rank`; 0 for ranks out of range.
    pub fn rank_size(&self, rank: usize) -> usize {
        self.ranks.get(rank).map_or(0, |r| r.size)
    }

    /// Bounding box of `rank`; empty for ranks out of range.
    pub fn rank_bounds(&self, rank: usize) -> Aabb3D {
        self.ranks.get(rank).map_or(Aabb3D::EMPTY, |r| r.bounds)
    }

    fn searchable_ranks(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranks
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_searchable())
            .map(|(rank, _)| rank)
    }

    /// Ranks that may hold matches for `predicate`, ascending.
    ///
    /// Spatial predicates select ranks whose box passes the predicate's
    /// bounding test; nearest predicates select every non-empty rank.
    pub fn candidates(&self, predicate: &Predicate) -> Result<Vec<usize>> {
        let mut ranks = match predicate {
            Predicate::Nearest(_) => self.searchable_ranks().collect(),
            _ => self.tree.query_spatial(predicate)?,
        };
        ranks.sort_unstable();
        Ok(ranks)
    }

    /// Non-empty ranks ascending by box distance to `target`, ties by rank.
    pub fn ranks_by_distance(&self, target: Point3) -> Result<Vec<usize>> {
        if self.tree.is_empty() {
            return Ok(Vec::new());
        }
        let nearest = self.tree.query_nearest(target, self.tree.len())?;
        Ok(nearest.into_iter().map(|n| n.index).collect())
    }

    /// Non-empty ranks whose box lies within `radius` of `target`, ascending.
    pub fn ranks_within(&self, target: Point3, radius: f64) -> Result<Vec<usize>> {
        let mut ranks = self
            .tree
            .query_spatial(&Predicate::within(target, radius))?;
        ranks.sort_unstable();
        Ok(ranks)
    }

    /// Smallest radius around `target` that provably encloses `k` matchable
    /// primitives, judged by the farthest corner of each rank box; `None` when
    /// the tree holds fewer than `k` of them.
    pub fn enclosing_radius(&self, target: Point3, k: usize) -> Option<f64> {
        let mut by_far_corner: Vec<(f64, usize)> = self
            .ranks
            .iter()
            .filter(|r| r.is_searchable())
            .map(|r| (r.bounds.max_distance(&target), r.non_empty))
            .collect();
        by_far_corner.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut seen = 0;
        for (radius, count) in by_far_corner {
            seen += count;
            if seen >= k {
                return Some(radius);
            }
        }
        None
    }
}
