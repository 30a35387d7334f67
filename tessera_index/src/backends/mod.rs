// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend implementations for different local search strategies.
//!
//! - `flatvec`: flat vector with linear scans (small, simple; the brute-force reference).
//! - `bvh`: static binary hierarchy with SAH-like splits.
//!
//! SAH note
//! --------
//! The BVH uses an SAH-like split heuristic.
//! For a split point `k` along a centroid-sorted axis we minimize:
//!
//! `cost(k) = metric(LB_k) * k + metric(RB_k) * (n - k)`
//!
//! where `LB_k` and `RB_k` are the bounding boxes of the first `k` and remaining `n - k` items
//! and `metric` is half the surface area plus the margin (sum of extents).
//! The margin term keeps flat or collinear inputs (all surface areas zero) splitting evenly.
//! We evaluate all `k` in O(n) per axis using prefix/suffix bounding boxes, and pick the lowest cost,
//! preferring the more balanced split on ties.

pub mod bvh;
pub mod flatvec;
