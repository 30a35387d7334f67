// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Index: a static 3D bounding volume hierarchy with exact queries.
//!
//! Tessera Index is the per-process building block of Tessera's distributed
//! search tree, and is usable on its own.
//!
//! - Build once from a snapshot of axis-aligned boxes (points are zero-volume boxes).
//! - Query by box overlap ([`Predicate::Overlap`]), radius ([`Predicate::Within`]),
//!   or exact k-nearest ([`Predicate::Nearest`]).
//! - Nearest results are sorted by distance with ties broken by primitive index,
//!   so answers are deterministic.
//!
//! There is no insert/remove: rebuild to change the primitive set.
//!
//! # Example
//!
//! ```rust
//! use tessera_index::{Aabb3D, Backend, Bvh, Point3, Predicate};
//!
//! let boxes = [
//!     Aabb3D::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
//!     Aabb3D::new(Point3::new(2.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0)),
//!     Aabb3D::from_point(Point3::new(5.0, 0.5, 0.5)),
//! ];
//! let bvh = Bvh::new(&boxes);
//!
//! // Box overlap.
//! let hits = bvh
//!     .query_spatial(&Predicate::overlap_point(Point3::new(2.5, 0.5, 0.5)))
//!     .unwrap();
//! assert_eq!(hits, vec![1]);
//!
//! // Two nearest neighbors of a point, closest first.
//! let nn = bvh.query_nearest(Point3::new(4.0, 0.5, 0.5), 2).unwrap();
//! assert_eq!(nn[0].index, 1);
//! assert_eq!(nn[1].index, 2);
//! assert_eq!(nn[0].distance, 1.0);
//! ```
//!
//! ## Choosing a backend
//!
//! - [`Bvh`]: binary hierarchy with SAH-like splits; the default for everything.
//! - [`FlatVec`]: linear scans. Good for very small sets and as a brute-force
//!   reference in tests.
//!
//! Both implement [`Backend`], the seam the distributed tree is generic over.
//!
//! ## Bounded priority queue
//!
//! Nearest search keeps its current best `k` in a fixed-capacity max-heap
//! ([`PriorityQueue`]). [`Backend::query_nearest_with`] takes a caller-owned
//! [`NeighborQueue`] so workers can reuse one scratch queue across queries; asking
//! for more neighbors than its capacity fails with [`IndexError::CapacityExceeded`].
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in coordinates. Empty boxes ([`Aabb3D::EMPTY`]) may be
//! stored but never match any predicate.
//!
//! ## Features
//!
//! - `std` (default): use std float math.
//! - `libm`: float math for `no_std` builds.
//! - `serde`: `Serialize`/`Deserialize` for geometry and predicate types.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod error;
pub mod predicate;
pub mod queue;
pub mod types;

pub use backend::Backend;
pub use backends::bvh::Bvh;
pub use backends::flatvec::FlatVec;
pub use error::IndexError;
pub use predicate::{Nearest, Predicate, PredicateKind};
pub use queue::{FnOrder, HeapOrder, NaturalOrder, Neighbor, NeighborQueue, PriorityQueue};
pub use types::{Aabb3D, DIM, Point3, Sphere};
