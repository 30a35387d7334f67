// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree configuration.

use serde::{Deserialize, Serialize};

/// How a distributed nearest query guarantees an exact answer.
///
/// Both strategies return the same neighbors; they trade messages for rounds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearestStrategy {
    /// Ask the closest ranks holding at least `k` primitives, derive a search
    /// radius from their answers, then ask every remaining rank inside that
    /// radius. Two exchanges; few ranks contacted.
    #[default]
    TwoRound,
    /// Derive a radius that provably encloses `k` primitives from the rank
    /// boxes alone and ask every rank inside it. One exchange; possibly more
    /// ranks contacted.
    Conservative,
}

/// Options for a [`DistributedTree`](crate::DistributedTree).
///
/// All ranks must use the same options; a query fails with
/// [`SearchError::InvalidArgument`](crate::SearchError::InvalidArgument) on
/// every rank otherwise.
///
/// Missing fields take their default when deserializing:
///
/// ```
/// use tessera_search::{NearestStrategy, TreeOptions};
///
/// let opts: TreeOptions = serde_json::from_str(r#"{ "nearest_strategy": "conservative" }"#).unwrap();
/// assert_eq!(opts.max_neighbors, 256);
/// assert_eq!(opts.nearest_strategy, NearestStrategy::Conservative);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Capacity of every nearest-search scratch queue; the largest `k` a
    /// nearest query may ask for.
    /// Default: 256
    pub max_neighbors: usize,

    /// Exactness policy for nearest queries.
    /// Default: [`NearestStrategy::TwoRound`]
    pub nearest_strategy: NearestStrategy,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_neighbors: 256,
            nearest_strategy: NearestStrategy::TwoRound,
        }
    }
}

impl TreeOptions {
    /// Set [`max_neighbors`](Self::max_neighbors).
    pub fn with_max_neighbors(mut self, max_neighbors: usize) -> Self {
        self.max_neighbors = max_neighbors;
        self
    }

    /// Set [`nearest_strategy`](Self::nearest_strategy).
    pub fn with_nearest_strategy(mut self, strategy: NearestStrategy) -> Self {
        self.nearest_strategy = strategy;
        self
    }
}
