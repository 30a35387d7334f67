// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_index::{Aabb3D, Backend, Bvh, Point3, Predicate};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

fn gen_grid_boxes(n: usize, cell: f64) -> Vec<Aabb3D> {
    let mut out = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let min = Point3::new(x as f64 * cell, y as f64 * cell, z as f64 * cell);
                out.push(Aabb3D::new(
                    min,
                    Point3::new(min[0] + cell, min[1] + cell, min[2] + cell),
                ));
            }
        }
    }
    out
}

fn to_rstar_boxes(v: &[Aabb3D]) -> Vec<Rectangle<[f64; 3]>> {
    v.iter()
        .map(|b| Rectangle::from_corners(b.min.coords(), b.max.coords()))
        .collect()
}

fn bench_rstar_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("rstar_external_compare");
    for &n in &[16usize, 32] {
        let boxes = gen_grid_boxes(n, 10.0);
        let query = Aabb3D::new(
            Point3::new(50.0, 50.0, 50.0),
            Point3::new(120.0, 120.0, 120.0),
        );
        group.throughput(Throughput::Elements((n * n * n) as u64));

        group.bench_function(format!("tessera_build_query_n{}", n), |b| {
            b.iter(|| {
                let bvh = Bvh::new(&boxes);
                let hits = bvh.query_spatial(&Predicate::overlap(query)).unwrap();
                black_box(hits.len());
            })
        });

        group.bench_function(format!("rstar_build_query_bulk_n{}", n), |b| {
            b.iter_batched(
                || to_rstar_boxes(&boxes),
                |rectangles| {
                    let tree = RTree::bulk_load(rectangles);
                    let aabb = AABB::from_corners(query.min.coords(), query.max.coords());
                    let hits: usize = tree.locate_in_envelope_intersecting(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        let bvh = Bvh::new(&boxes);
        let tree = RTree::bulk_load(to_rstar_boxes(&boxes));
        let target = Point3::new(77.0, 33.0, 101.0);
        group.bench_function(format!("tessera_nearest_k16_n{}", n), |b| {
            b.iter(|| black_box(bvh.query_nearest(target, 16).unwrap()))
        });
        group.bench_function(format!("rstar_nearest_k16_n{}", n), |b| {
            b.iter(|| {
                let hits: usize = tree.nearest_neighbor_iter(&target.coords()).take(16).count();
                black_box(hits);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rstar_external_compare);
criterion_main!(benches);
