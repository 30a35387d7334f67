// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessera_comm::{Communicator, LocalGroup};
use tessera_index::{Aabb3D, Point3, Predicate};
use tessera_search::{DistributedTree, NearestStrategy, TreeOptions};

/// Rank `r` owns an `n x n x n` lattice of points in the slab `[r, r + 1)` along x.
fn slab_points(rank: usize, n: usize) -> Vec<Aabb3D> {
    let step = 1.0 / n as f64;
    let mut out = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                out.push(Aabb3D::from_point(Point3::new(
                    rank as f64 + i as f64 * step,
                    j as f64 * step,
                    k as f64 * step,
                )));
            }
        }
    }
    out
}

fn slab_targets(rank: usize, size: usize, count: usize) -> Vec<Point3> {
    // Targets sit on the boundary to the next slab so that every query
    // touches two ranks.
    let x = ((rank + 1) % size) as f64;
    (0..count)
        .map(|i| Point3::new(x, (i as f64 + 0.5) / count as f64, 0.5))
        .collect()
}

fn bench_distributed(c: &mut Criterion) {
    let mut group = c.benchmark_group("distributed");
    const QUERIES: usize = 64;
    for &size in &[1usize, 2, 4] {
        group.throughput(Throughput::Elements((QUERIES * size) as u64));
        for (name, strategy) in [
            ("two_round", NearestStrategy::TwoRound),
            ("conservative", NearestStrategy::Conservative),
        ] {
            group.bench_function(format!("nearest_k8_{}_p{}", name, size), |b| {
                b.iter(|| {
                    LocalGroup::new(size).run(|comm| {
                        let rank = comm.rank();
                        let options = TreeOptions::default().with_nearest_strategy(strategy);
                        let tree =
                            DistributedTree::with_options(&comm, &slab_points(rank, 16), options)
                                .unwrap();
                        let batch: Vec<Predicate> = slab_targets(rank, size, QUERIES)
                            .into_iter()
                            .map(|t| Predicate::nearest(t, 8))
                            .collect();
                        black_box(tree.query(&batch).unwrap().total_hits())
                    })
                });
            });
        }
        group.bench_function(format!("within_p{}", size), |b| {
            b.iter(|| {
                LocalGroup::new(size).run(|comm| {
                    let rank = comm.rank();
                    let tree = DistributedTree::new(&comm, &slab_points(rank, 16)).unwrap();
                    let batch: Vec<Predicate> = slab_targets(rank, size, QUERIES)
                        .into_iter()
                        .map(|t| Predicate::within(t, 0.1))
                        .collect();
                    black_box(tree.query(&batch).unwrap().total_hits())
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distributed);
criterion_main!(benches);
