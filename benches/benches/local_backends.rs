// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_index::{Aabb3D, Backend, Bvh, FlatVec, NeighborQueue, Point3, Predicate};

fn gen_grid_boxes(n: usize, cell: f64) -> Vec<Aabb3D> {
    let mut out = Vec::with_capacity(n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let min = Point3::new(x as f64 * cell, y as f64 * cell, z as f64 * cell);
                let max = Point3::new(min[0] + cell, min[1] + cell, min[2] + cell);
                out.push(Aabb3D::new(min, max));
            }
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_points(count: usize, extent: f64, seed: u64) -> Vec<Aabb3D> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            Aabb3D::from_point(Point3::new(
                rng.next_f64() * extent,
                rng.next_f64() * extent,
                rng.next_f64() * extent,
            ))
        })
        .collect()
}

fn gen_clustered_points(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Aabb3D> {
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let centers: Vec<[f64; 3]> = (0..n_clusters)
        .map(|_| {
            [
                rng.next_f64() * 1000.0,
                rng.next_f64() * 1000.0,
                rng.next_f64() * 1000.0,
            ]
        })
        .collect();
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for c in centers {
        for _ in 0..per_cluster {
            out.push(Aabb3D::from_point(Point3::new(
                c[0] + (rng.next_f64() - 0.5) * spread,
                c[1] + (rng.next_f64() - 0.5) * spread,
                c[2] + (rng.next_f64() - 0.5) * spread,
            )));
        }
    }
    out
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[16usize, 32] {
        let boxes = gen_grid_boxes(n, 10.0);
        group.throughput(Throughput::Elements((n * n * n) as u64));
        group.bench_function(format!("bvh_grid_n{}", n), |b| {
            b.iter(|| black_box(Bvh::new(&boxes)));
        });
    }
    let clustered = gen_clustered_points(32, 512, 40.0);
    group.throughput(Throughput::Elements(clustered.len() as u64));
    group.bench_function("bvh_clustered", |b| {
        b.iter(|| black_box(Bvh::new(&clustered)));
    });
    group.finish();
}

fn bench_spatial(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial");
    let boxes = gen_grid_boxes(32, 10.0);
    let bvh = Bvh::new(&boxes);
    let flat = FlatVec::new(&boxes);
    let overlap = Predicate::overlap(Aabb3D::new(
        Point3::new(100.0, 100.0, 100.0),
        Point3::new(140.0, 140.0, 140.0),
    ));
    let within = Predicate::within(Point3::new(160.0, 160.0, 160.0), 25.0);
    for (name, predicate) in [("overlap", overlap), ("within", within)] {
        group.bench_function(format!("bvh_{}", name), |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                bvh.for_each_spatial(&predicate, |_| hits += 1).unwrap();
                black_box(hits);
            });
        });
        group.bench_function(format!("flatvec_{}", name), |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                flat.for_each_spatial(&predicate, |_| hits += 1).unwrap();
                black_box(hits);
            });
        });
    }
    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");
    let points = gen_random_points(50_000, 1000.0, 0xCAFE_F00D_DEAD_BEEF);
    let targets = gen_random_points(256, 1000.0, 0xFACE_FEED_CAFE_BABE);
    let bvh = Bvh::new(&points);
    let flat = FlatVec::new(&points[..5_000]);
    group.throughput(Throughput::Elements(targets.len() as u64));
    for &k in &[1usize, 16, 64] {
        group.bench_function(format!("bvh_k{}", k), |b| {
            b.iter_batched(
                || (NeighborQueue::with_capacity(k), Vec::with_capacity(k)),
                |(mut queue, mut out)| {
                    for t in &targets {
                        out.clear();
                        bvh.query_nearest_with(t.min, k, &mut queue, &mut out)
                            .unwrap();
                        black_box(out.len());
                    }
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("flatvec_5k_k{}", k), |b| {
            b.iter(|| {
                for t in &targets {
                    black_box(flat.query_nearest(t.min, k).unwrap());
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_spatial, bench_nearest);
criterion_main!(benches);
