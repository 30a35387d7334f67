// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Query predicates.
//!
//! A [`Predicate`] is a plain value: it can be validated once, sent to another
//! process, and replayed against any tree.

use crate::error::{IndexError, Result};
use crate::types::{Aabb3D, Point3, Sphere};

/// Find the `k` primitives closest to `target`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nearest {
    /// Query point.
    pub target: Point3,
    /// Number of neighbors requested; must be at least 1.
    pub k: usize,
}

/// A spatial or nearest-neighbor query.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Predicate {
    /// Primitives whose box intersects the given box (closed intervals).
    Overlap(Aabb3D),
    /// Primitives whose box lies within `radius` of `center`.
    Within(Sphere),
    /// The `k` nearest primitives.
    Nearest(Nearest),
}

/// Discriminant of a [`Predicate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PredicateKind {
    /// [`Predicate::Overlap`]
    Overlap,
    /// [`Predicate::Within`]
    Within,
    /// [`Predicate::Nearest`]
    Nearest,
}

impl Predicate {
    /// Overlap with a box.
    pub const fn overlap(aabb: Aabb3D) -> Self {
        Self::Overlap(aabb)
    }

    /// Overlap with a single point.
    pub const fn overlap_point(p: Point3) -> Self {
        Self::Overlap(Aabb3D::from_point(p))
    }

    /// Radius search around `center`.
    pub const fn within(center: Point3, radius: f64) -> Self {
        Self::Within(Sphere::new(center, radius))
    }

    /// `k` nearest neighbors of `target`.
    pub const fn nearest(target: Point3, k: usize) -> Self {
        Self::Nearest(Nearest { target, k })
    }

    /// The predicate's discriminant.
    pub const fn kind(&self) -> PredicateKind {
        match self {
            Self::Overlap(_) => PredicateKind::Overlap,
            Self::Within(_) => PredicateKind::Within,
            Self::Nearest(_) => PredicateKind::Nearest,
        }
    }

    /// Reject malformed predicates.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Overlap(_) => Ok(()),
            Self::Within(s) => {
                if s.radius.is_nan() || s.radius < 0.0 {
                    return Err(IndexError::InvalidArgument(
                        "within radius must be non-negative",
                    ));
                }
                Ok(())
            }
            Self::Nearest(n) => {
                if n.k == 0 {
                    return Err(IndexError::InvalidArgument(
                        "nearest requires at least one neighbor",
                    ));
                }
                Ok(())
            }
        }
    }

    /// The cheap bounding test used to prune subtrees and accept leaves.
    ///
    /// Always false for [`Predicate::Nearest`], which has no spatial extent.
    #[inline]
    pub fn test(&self, aabb: &Aabb3D) -> bool {
        match self {
            Self::Overlap(q) => q.intersects(aabb),
            Self::Within(s) => s.intersects(aabb),
            Self::Nearest(_) => false,
        }
    }

    /// Whether this is a spatial (non-nearest) predicate.
    pub const fn is_spatial(&self) -> bool {
        !matches!(self, Self::Nearest(_))
    }
}
