// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compressed (CSR) query results.

use core::ops::Range;

use serde::{Deserialize, Serialize};

/// One match: a primitive identified by its owning rank and local index.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Index of the primitive on its owning rank.
    pub index: usize,
    /// Owning rank.
    pub rank: usize,
    /// Distance to the query point; present for nearest batches only.
    pub distance: Option<f64>,
}

/// Results of one query batch in compressed row layout.
///
/// The hits of query `q` are `indices[offsets[q]..offsets[q + 1]]` (and the
/// same range of `ranks` and `distances`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    /// `len() + 1` non-decreasing offsets, starting at 0.
    pub offsets: Vec<usize>,
    /// Local index of each hit on its owning rank.
    pub indices: Vec<usize>,
    /// Owning rank of each hit.
    pub ranks: Vec<usize>,
    /// Distance of each hit; `Some` for nearest batches, `None` otherwise.
    pub distances: Option<Vec<f64>>,
}

impl QueryResults {
    /// Results with no hits for `queries` queries.
    pub fn empty(queries: usize, with_distances: bool) -> Self {
        Self {
            offsets: vec![0; queries + 1],
            indices: Vec::new(),
            ranks: Vec::new(),
            distances: with_distances.then(Vec::new),
        }
    }

    /// Assemble from `(query, hit)` pairs already ordered by query.
    pub(crate) fn from_sorted(
        queries: usize,
        hits: impl IntoIterator<Item = (usize, Hit)>,
        with_distances: bool,
    ) -> Self {
        let mut out = Self::empty(queries, with_distances);
        let mut counts = vec![0_usize; queries];
        let mut last = 0;
        for (query, hit) in hits {
            debug_assert!(
                query < queries && query >= last,
                "hits must be grouped by ascending query"
            );
            last = query;
            counts[query] += 1;
            out.indices.push(hit.index);
            out.ranks.push(hit.rank);
            if let Some(distances) = &mut out.distances {
                distances.push(hit.distance.unwrap_or(f64::INFINITY));
            }
        }
        for (q, count) in counts.into_iter().enumerate() {
            out.offsets[q + 1] = out.offsets[q] + count;
        }
        out
    }

    /// Number of queries.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Whether the batch had no queries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of hits over all queries.
    pub fn total_hits(&self) -> usize {
        self.indices.len()
    }

    /// Position range of the hits of query `q`.
    ///
    /// # Panics
    ///
    /// Panics if `q >= len()`.
    pub fn range(&self, q: usize) -> Range<usize> {
        self.offsets[q]..self.offsets[q + 1]
    }

    /// Hits of query `q`.
    ///
    /// # Panics
    ///
    /// Panics if `q >= len()`.
    pub fn hits(&self, q: usize) -> impl Iterator<Item = Hit> + '_ {
        self.range(q).map(move |i| Hit {
            index: self.indices[i],
            rank: self.ranks[i],
            distance: self.distances.as_ref().map(|d| d[i]),
        })
    }
}
