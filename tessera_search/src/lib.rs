// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Search: a spatial search tree distributed over the ranks of a process
//! group.
//!
//! Each rank contributes the primitives it owns (axis-aligned boxes; points are
//! zero-volume boxes). No rank ever holds a global copy of the data. Instead:
//!
//! - every rank builds a local [`Bvh`](tessera_index::Bvh) over its own primitives;
//! - one all-gather of per-rank summaries (bounds, size) gives every rank the same [`RankDigest`],
//!   a tiny tree with one leaf per rank;
//! - a query batch is routed through the digest to the ranks that may hold
//!   matches, answered there in parallel (rayon), and sent back, using two
//!   any-to-any exchanges per round ([`tessera_comm::Distributor`]).
//!
//! Results come back in compressed row layout ([`QueryResults`]): for query `q`,
//! `offsets[q]..offsets[q + 1]` indexes the `(index, rank)` of its hits.
//!
//! Nearest queries are exact. How exactness is reached is configurable through
//! [`NearestStrategy`]; both strategies return identical answers.
//!
//! # Example
//!
//! ```rust
//! use tessera_comm::{Communicator, LocalGroup};
//! use tessera_index::{Aabb3D, Point3, Predicate};
//! use tessera_search::DistributedTree;
//!
//! let counts = LocalGroup::new(3).run(|comm| {
//!     // Rank r owns 4 points along x in [r, r + 1).
//!     let r = comm.rank() as f64;
//!     let points: Vec<Aabb3D> = (0..4)
//!         .map(|i| Aabb3D::from_point(Point3::new(r + 0.25 * i as f64, 0.0, 0.0)))
//!         .collect();
//!     let tree = DistributedTree::new(&comm, &points).unwrap();
//!     assert_eq!(tree.size(), 12);
//!
//!     // Everything within 0.3 of x = 1.
//!     let results = tree
//!         .query(&[Predicate::within(Point3::new(1.0, 0.0, 0.0), 0.3)])
//!         .unwrap();
//!     results.hits(0).count()
//! });
//! // x = 0.75 on rank 0, x = 1.0 and x = 1.25 on rank 1.
//! assert_eq!(counts, vec![3, 3, 3]);
//! ```
//!
//! ## Collective calls
//!
//! [`DistributedTree::new`] and [`DistributedTree::query`] must be called on every
//! rank, in the same order. A rank with nothing to ask passes an empty batch.
//! Batches are homogeneous: all predicates on all ranks share one kind.
//!
//! ## Logging
//!
//! Build and query phases emit `tracing` events at `debug` level; individual
//! messages are traced by the communicator. No subscriber is installed.

mod digest;
mod error;
mod options;
mod results;
mod tree;

pub use digest::{RankDigest, RankSummary};
pub use error::{Result, SearchError};
pub use options::{NearestStrategy, TreeOptions};
pub use results::{Hit, QueryResults};
pub use tree::DistributedTree;
