// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Distributed k-nearest neighbors.
//!
//! Four in-memory ranks each own a jittered lattice of points in their own
//! slab of space. Every rank asks for the neighbors of a few points near the
//! slab boundaries, so answers mix primitives from several ranks.
//!
//! Tree options may be given as JSON; missing fields keep their defaults.
//! Each query is echoed back as JSON next to its hits.
//!
//! Run:
//! - `cargo run -p tessera_demos --example distributed_knn`
//! - `RUST_LOG=tessera_search=debug cargo run -p tessera_demos --example distributed_knn -- '{"nearest_strategy":"conservative"}'`

use tessera_comm::{Communicator, LocalGroup};
use tessera_index::{Aabb3D, Point3, Predicate};
use tessera_search::{DistributedTree, TreeOptions};

const RANKS: usize = 4;
const PER_AXIS: usize = 6;
const K: usize = 5;

fn slab(rank: usize) -> Vec<Aabb3D> {
    let step = 1.0 / PER_AXIS as f64;
    let mut out = Vec::new();
    for i in 0..PER_AXIS {
        for j in 0..PER_AXIS {
            for k in 0..PER_AXIS {
                // Deterministic jitter so that distances rarely tie.
                let jitter = ((i * 31 + j * 17 + k * 7 + rank) % 11) as f64 * 1e-3;
                out.push(Aabb3D::from_point(Point3::new(
                    rank as f64 + i as f64 * step + jitter,
                    j as f64 * step,
                    k as f64 * step,
                )));
            }
        }
    }
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let options: TreeOptions = match std::env::args().nth(1) {
        Some(json) => serde_json::from_str(&json)?,
        None => TreeOptions::default(),
    };
    tracing::info!(?options, ranks = RANKS, "starting");

    let reports = LocalGroup::new(RANKS).run(|comm| {
        let rank = comm.rank();
        let tree = DistributedTree::with_options(&comm, &slab(rank), options)?;
        // Targets on the boundary between this slab and the next one.
        let x = (rank + 1) as f64;
        let batch: Vec<Predicate> = (0..3)
            .map(|i| Predicate::nearest(Point3::new(x, 0.25 * (i + 1) as f64, 0.5), K))
            .collect();
        let results = tree.query(&batch)?;

        let mut lines = Vec::new();
        for (q, predicate) in batch.iter().enumerate() {
            let hits: Vec<String> = results
                .hits(q)
                .map(|h| format!("r{}#{}@{:.3}", h.rank, h.index, h.distance.unwrap_or(f64::NAN)))
                .collect();
            let asked = serde_json::to_string(predicate).unwrap_or_default();
            lines.push(format!("rank {rank} {asked}\n    {}", hits.join(" ")));
        }
        Ok::<_, tessera_search::SearchError>(lines)
    });

    for report in reports {
        for line in report? {
            println!("{line}");
        }
    }
    Ok(())
}
