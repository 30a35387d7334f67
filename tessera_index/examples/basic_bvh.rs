// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Tessera Index: build a BVH, then run each predicate kind.

use tessera_index::{Aabb3D, Backend, Bvh, Point3, Predicate};

fn main() {
    // A 4x4 grid of unit boxes in the z = 0 plane.
    let mut boxes = Vec::new();
    for y in 0..4 {
        for x in 0..4 {
            let min = Point3::new(x as f64 * 2.0, y as f64 * 2.0, 0.0);
            let max = Point3::new(min[0] + 1.0, min[1] + 1.0, 1.0);
            boxes.push(Aabb3D::new(min, max));
        }
    }
    let bvh = Bvh::new(&boxes);
    println!("{bvh:?}, depth {}", bvh.depth());

    let overlap = Predicate::overlap(Aabb3D::new(
        Point3::new(1.5, 1.5, 0.0),
        Point3::new(4.5, 2.5, 0.5),
    ));
    println!("overlap: {:?}", bvh.query_spatial(&overlap));

    let within = Predicate::within(Point3::new(3.0, 3.0, 0.5), 1.0);
    println!("within: {:?}", bvh.query(&within));

    let nearest = bvh.query_nearest(Point3::new(-1.0, -1.0, 0.0), 3);
    println!("nearest: {nearest:?}");
}
