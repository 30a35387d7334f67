// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::ops::Index;

/// Number of spatial dimensions.
pub const DIM: usize = 3;

/// A point in 3D.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3(pub [f64; DIM]);

impl Point3 {
    /// The origin.
    pub const ORIGIN: Self = Self([0.0; DIM]);

    /// Create a point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// Coordinates as an array.
    pub const fn coords(&self) -> [f64; DIM] {
        self.0
    }

    /// Euclidean distance between two points.
    pub fn distance(&self, other: &Self) -> f64 {
        let mut acc = 0.0;
        for d in 0..DIM {
            let delta = self.0[d] - other.0[d];
            acc += delta * delta;
        }
        sqrt(acc)
    }
}

impl Index<usize> for Point3 {
    type Output = f64;

    #[inline]
    fn index(&self, axis: usize) -> &f64 {
        &self.0[axis]
    }
}

impl From<[f64; DIM]> for Point3 {
    fn from(coords: [f64; DIM]) -> Self {
        Self(coords)
    }
}

/// Axis-aligned bounding box in 3D.
///
/// A box with `min[d] > max[d]` on any axis is empty. [`Aabb3D::EMPTY`] is the
/// canonical empty box: it is the identity for [`Aabb3D::union`], never
/// intersects anything, and is infinitely far from every point.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb3D {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Default for Aabb3D {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb3D {
    /// The canonical empty box (`min = +∞`, `max = −∞`).
    pub const EMPTY: Self = Self {
        min: Point3([f64::INFINITY; DIM]),
        max: Point3([f64::NEG_INFINITY; DIM]),
    };

    /// Create a new AABB from min/max corners.
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Zero-volume box around a single point.
    pub const fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Return true if the AABB is empty or inverted on any axis. Assumes no NaN.
    pub fn is_empty(&self) -> bool {
        (0..DIM).any(|d| self.max[d] < self.min[d])
    }

    /// Grow the box to include `p`.
    pub fn expand(&mut self, p: Point3) {
        for d in 0..DIM {
            self.min.0[d] = self.min[d].min(p[d]);
            self.max.0[d] = self.max[d].max(p[d]);
        }
    }

    /// Grow the box to include `other`. Expanding by an empty box is a no-op.
    pub fn expand_box(&mut self, other: &Self) {
        for d in 0..DIM {
            self.min.0[d] = self.min[d].min(other.min[d]);
            self.max.0[d] = self.max[d].max(other.max[d]);
        }
    }

    /// The smallest box containing both inputs.
    pub fn union(mut self, other: &Self) -> Self {
        self.expand_box(other);
        self
    }

    /// Closed-interval overlap test on every axis.
    pub fn intersects(&self, other: &Self) -> bool {
        (0..DIM).all(|d| self.min[d] <= other.max[d] && other.min[d] <= self.max[d])
    }

    /// Whether the point lies inside the box (boundary included).
    pub fn contains(&self, p: &Point3) -> bool {
        (0..DIM).all(|d| self.min[d] <= p[d] && p[d] <= self.max[d])
    }

    /// Euclidean distance from `p` to the closest point of the box.
    ///
    /// Zero when `p` is inside; `+∞` for an empty box.
    pub fn distance(&self, p: &Point3) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        let mut acc = 0.0;
        for d in 0..DIM {
            let excess = if p[d] < self.min[d] {
                self.min[d] - p[d]
            } else if p[d] > self.max[d] {
                p[d] - self.max[d]
            } else {
                0.0
            };
            acc += excess * excess;
        }
        sqrt(acc)
    }

    /// Euclidean distance from `p` to the farthest corner of the box.
    ///
    /// Every point of the box is at most this far from `p`. `+∞` for an empty box.
    pub fn max_distance(&self, p: &Point3) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        let mut acc = 0.0;
        for d in 0..DIM {
            let far = (p[d] - self.min[d]).max(self.max[d] - p[d]);
            acc += far * far;
        }
        sqrt(acc)
    }

    /// Box center. Meaningless for an empty box.
    pub fn centroid(&self) -> Point3 {
        let mut c = [0.0; DIM];
        for (d, c) in c.iter_mut().enumerate() {
            *c = 0.5 * (self.min[d] + self.max[d]);
        }
        Point3(c)
    }

    fn extents(&self) -> [f64; DIM] {
        let mut e = [0.0; DIM];
        for (d, e) in e.iter_mut().enumerate() {
            *e = (self.max[d] - self.min[d]).max(0.0);
        }
        e
    }

    /// Half of the surface area.
    pub fn half_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let [x, y, z] = self.extents();
        x * y + y * z + z * x
    }

    /// Sum of the edge lengths along each axis.
    pub fn margin(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.extents().iter().sum()
    }
}

/// A ball given by center and radius.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sphere {
    /// Center point.
    pub center: Point3,
    /// Radius; must be non-negative.
    pub radius: f64,
}

impl Sphere {
    /// Create a sphere.
    pub const fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Whether the sphere touches the box (distance to the box within the radius).
    pub fn intersects(&self, aabb: &Aabb3D) -> bool {
        !aabb.is_empty() && aabb.distance(&self.center) <= self.radius
    }

    /// Bounding box of the sphere.
    pub fn bounds(&self) -> Aabb3D {
        let mut b = Aabb3D::from_point(self.center);
        for d in 0..DIM {
            b.min.0[d] -= self.radius;
            b.max.0[d] += self.radius;
        }
        b
    }
}

#[cfg(feature = "std")]
#[inline]
pub(crate) fn sqrt(v: f64) -> f64 {
    v.sqrt()
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
#[inline]
pub(crate) fn sqrt(v: f64) -> f64 {
    libm::sqrt(v)
}

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("tessera_index requires either the `std` or `libm` feature");
