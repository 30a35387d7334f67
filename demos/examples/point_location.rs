// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point location for field transfer.
//!
//! A source mesh of unit cells is split across ranks; each rank also holds a
//! set of target points that do not line up with its own cells. Overlap
//! queries tell every rank which remote cell contains each of its targets,
//! and radius queries list the cells close enough to interpolate from.
//!
//! Run:
//! - `cargo run -p tessera_demos --example point_location`

use tessera_comm::{Communicator, LocalGroup};
use tessera_index::{Aabb3D, Point3, Predicate};
use tessera_search::DistributedTree;

const RANKS: usize = 3;
const CELLS: usize = 4;

/// Rank `r` owns the cells of row `r` in a `RANKS x CELLS` grid.
fn cells(rank: usize) -> Vec<Aabb3D> {
    (0..CELLS)
        .map(|i| {
            Aabb3D::new(
                Point3::new(i as f64, rank as f64, 0.0),
                Point3::new(i as f64 + 1.0, rank as f64 + 1.0, 1.0),
            )
        })
        .collect()
}

/// Targets of rank `r` sit in the middle of the column `r` cells.
fn targets(rank: usize) -> Vec<Point3> {
    (0..RANKS)
        .map(|row| Point3::new(rank as f64 + 0.5, row as f64 + 0.5, 0.5))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let reports = LocalGroup::new(RANKS).run(|comm| {
        let rank = comm.rank();
        let tree = DistributedTree::new(&comm, &cells(rank))?;
        let points = targets(rank);

        let owners = tree.query(
            &points
                .iter()
                .map(|p| Predicate::overlap_point(*p))
                .collect::<Vec<_>>(),
        )?;
        let neighborhoods = tree.query(
            &points
                .iter()
                .map(|p| Predicate::within(*p, 0.75))
                .collect::<Vec<_>>(),
        )?;

        let mut lines = Vec::new();
        for (q, p) in points.iter().enumerate() {
            let owner: Vec<String> = owners
                .hits(q)
                .map(|h| format!("r{}#{}", h.rank, h.index))
                .collect();
            lines.push(format!(
                "rank {rank} target {:?}: cell {} with {} cells within 0.75",
                p.coords(),
                owner.join(","),
                neighborhoods.hits(q).count()
            ));
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
