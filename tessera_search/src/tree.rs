// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The distributed search tree.

use core::cmp::Ordering;
use core::fmt::Debug;

use rayon::prelude::*;
use tessera_comm::{Communicator, Distributor};
use tessera_index::{
    Aabb3D, Backend, Bvh, IndexError, Nearest, Neighbor, NeighborQueue, Predicate, PredicateKind,
};

use crate::digest::{RankDigest, RankSummary};
use crate::error::{Result, SearchError};
use crate::options::{NearestStrategy, TreeOptions};
use crate::results::{Hit, QueryResults};

/// A query forwarded to one candidate rank.
#[derive(Copy, Clone, Debug)]
struct Request {
    query: usize,
    predicate: Predicate,
    /// Nearest answers farther than this are not sent back.
    radius: f64,
}

/// One hit on its way back to the rank that asked.
#[derive(Copy, Clone, Debug)]
struct Answer {
    query: usize,
    index: usize,
    rank: usize,
    distance: f64,
}

impl Answer {
    fn order(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
            .then(self.rank.cmp(&other.rank))
    }
}

/// What every rank announces before a batch is routed.
#[derive(Copy, Clone, Debug, PartialEq)]
struct BatchHeader {
    kind: Option<PredicateKind>,
    options: TreeOptions,
}

/// A spatial index over primitives partitioned across the ranks of a
/// [`Communicator`].
///
/// Each rank owns a local [`Backend`] (a [`Bvh`] by default) over its own
/// primitives and a replicated [`RankDigest`] of every rank's bounds. Queries
/// are routed through the digest to the ranks that can hold matches,
/// answered there, and sent back; results name each hit by owning rank and
/// local index.
///
/// Construction and [`query`](Self::query) are collective: every rank of the
/// group must call them, the same number of times and in the same order.
///
/// ```
/// use tessera_comm::{Communicator, LocalGroup};
/// use tessera_index::{Aabb3D, Point3, Predicate};
/// use tessera_search::DistributedTree;
///
/// let found = LocalGroup::new(2).run(|comm| {
///     // Rank r owns one unit box starting at x = r.
///     let x = comm.rank() as f64;
///     let boxes = [Aabb3D::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))];
///     let tree = DistributedTree::new(comm, &boxes).unwrap();
///     let results = tree
///         .query(&[Predicate::nearest(Point3::new(1.9, 0.5, 0.5), 1)])
///         .unwrap();
///     results.hits(0).map(|h| (h.rank, h.index)).collect::<Vec<_>>()
/// });
/// assert_eq!(found, vec![vec![(1, 0)], vec![(1, 0)]]);
/// ```
pub struct DistributedTree<C: Communicator, B: Backend = Bvh> {
    comm: C,
    local: B,
    digest: RankDigest,
    options: TreeOptions,
}

impl<C: Communicator> DistributedTree<C, Bvh> {
    /// Build over this rank's `boxes` (possibly none) with default options.
    /// Collective.
    pub fn new(comm: C, boxes: &[Aabb3D]) -> Result<Self> {
        Self::with_options(comm, boxes, TreeOptions::default())
    }

    /// Build over this rank's `boxes` with `options`. Collective.
    pub fn with_options(comm: C, boxes: &[Aabb3D], options: TreeOptions) -> Result<Self> {
        Self::with_backend(comm, Bvh::new(boxes), options)
    }
}

impl<C: Communicator, B: Backend> DistributedTree<C, B> {
    /// Wrap an already built local backend. Collective.
    pub fn with_backend(comm: C, local: B, options: TreeOptions) -> Result<Self> {
        let summaries = comm.all_gather(RankSummary::of(&local))?;
        let digest = RankDigest::new(summaries);
        tracing::debug!(
            rank = comm.rank(),
            local_size = local.len(),
            global_size = digest.size(),
            non_empty_ranks = digest.non_empty_ranks(),
            "distributed tree built"
        );
        Ok(Self {
            comm,
            local,
            digest,
            options,
        })
    }

    /// Number of primitives over all ranks.
    pub fn size(&self) -> usize {
        self.digest.size()
    }

    /// Whether no rank holds any primitive.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Union of the boxes of all primitives on all ranks.
    pub fn bounds(&self) -> Aabb3D {
        self.digest.bounds()
    }

    /// This rank's backend.
    pub fn local(&self) -> &B {
        &self.local
    }

    /// The replicated per-rank summary.
    pub fn digest(&self) -> &RankDigest {
        &self.digest
    }

    /// This process's rank.
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    /// Number of ranks in the group.
    pub fn comm_size(&self) -> usize {
        self.comm.size()
    }

    /// Options the tree was built with.
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }
}

impl<C: Communicator, B: Backend + Sync> DistributedTree<C, B> {
    /// Answer a batch of predicates. Collective.
    ///
    /// Every predicate in the batch, and in every other rank's batch, must be
    /// of the same kind; ranks may submit empty batches. Result row `q`
    /// belongs to `predicates[q]`:
    ///
    /// - overlap and radius hits are grouped by ascending owning rank;
    /// - nearest hits are the exact global `min(k, size)` nearest primitives,
    ///   ascending by distance, ties by local index and then by rank, and
    ///   carry their distances.
    ///
    /// Malformed batches fail before anything is exchanged. Ranks that
    /// disagree on the batch kind or on the tree options all fail with
    /// [`SearchError::InvalidArgument`].
    pub fn query(&self, predicates: &[Predicate]) -> Result<QueryResults> {
        let local_kind = self.check_batch(predicates)?;
        let Some(kind) = self.agree(local_kind)? else {
            return Ok(QueryResults::empty(predicates.len(), false));
        };
        tracing::debug!(
            rank = self.rank(),
            queries = predicates.len(),
            ?kind,
            "query batch"
        );
        match kind {
            PredicateKind::Nearest => {
                let targets: Vec<Nearest> = predicates
                    .iter()
                    .filter_map(|p| match p {
                        Predicate::Nearest(n) => Some(*n),
                        _ => None,
                    })
                    .collect();
                match self.options.nearest_strategy {
                    NearestStrategy::TwoRound => self.nearest_two_round(&targets),
                    NearestStrategy::Conservative => self.nearest_conservative(&targets),
                }
            }
            PredicateKind::Overlap | PredicateKind::Within => self.spatial(predicates),
        }
    }

    fn check_batch(&self, predicates: &[Predicate]) -> Result<Option<PredicateKind>> {
        let Some(first) = predicates.first() else {
            return Ok(None);
        };
        let kind = first.kind();
        for (q, predicate) in predicates.iter().enumerate() {
            if predicate.kind() != kind {
                return Err(SearchError::InvalidArgument(format!(
                    "query {q} is {:?} in a {kind:?} batch",
                    predicate.kind()
                )));
            }
            predicate.validate().map_err(|e| match e {
                IndexError::InvalidArgument(msg) => {
                    SearchError::InvalidArgument(format!("query {q}: {msg}"))
                }
                other => other.into(),
            })?;
            if let Predicate::Nearest(n) = predicate
                && n.k > self.options.max_neighbors
            {
                return Err(SearchError::CapacityExceeded {
                    requested: n.k,
                    capacity: self.options.max_neighbors,
                });
            }
        }
        Ok(Some(kind))
    }

    /// Agree on the batch kind across ranks; `None` when every batch is empty.
    fn agree(&self, kind: Option<PredicateKind>) -> Result<Option<PredicateKind>> {
        let headers = self.comm.all_gather(BatchHeader {
            kind,
            options: self.options,
        })?;
        if let Some(rank) = headers.iter().position(|h| h.options != headers[0].options) {
            return Err(SearchError::InvalidArgument(format!(
                "rank {rank} uses different tree options than rank 0"
            )));
        }
        let mut agreed: Option<(usize, PredicateKind)> = None;
        for (rank, header) in headers.iter().enumerate() {
            let Some(k) = header.kind else {
                continue;
            };
            match agreed {
                None => agreed = Some((rank, k)),
                Some((first, a)) if a != k => {
                    return Err(SearchError::InvalidArgument(format!(
                        "rank {rank} submitted a {k:?} batch, rank {first} a {a:?} batch"
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(agreed.map(|(_, k)| k))
    }

    fn spatial(&self, predicates: &[Predicate]) -> Result<QueryResults> {
        let mut requests = Vec::new();
        for (query, predicate) in predicates.iter().enumerate() {
            for rank in self.digest.candidates(predicate)? {
                requests.push((
                    rank,
                    Request {
                        query,
                        predicate: *predicate,
                        radius: f64::INFINITY,
                    },
                ));
            }
        }
        let mut answers = self.exchange(requests)?;
        // Stable: answers already arrive by ascending rank.
        answers.sort_by_key(|a| a.query);
        Ok(QueryResults::from_sorted(
            predicates.len(),
            answers.into_iter().map(|a| {
                (
                    a.query,
                    Hit {
                        index: a.index,
                        rank: a.rank,
                        distance: None,
                    },
                )
            }),
            false,
        ))
    }

    fn nearest_two_round(&self, targets: &[Nearest]) -> Result<QueryResults> {
        // Round 1: the closest ranks that together hold at least k primitives.
        let mut asked = Vec::with_capacity(targets.len());
        let mut requests = Vec::new();
        for (query, n) in targets.iter().enumerate() {
            let mut ranks = Vec::new();
            let mut held = 0;
            for rank in self.digest.ranks_by_distance(n.target)? {
                if held >= n.k {
                    break;
                }
                held += self.digest.rank(rank).map_or(0, |r| r.non_empty);
                ranks.push(rank);
                requests.push((rank, nearest_request(query, n, f64::INFINITY)));
            }
            asked.push(ranks);
        }
        let mut found = by_query(targets.len(), self.exchange(requests)?);
        for (hits, n) in found.iter_mut().zip(targets) {
            keep_nearest(hits, n.k);
        }

        // Round 2: everything else that could beat the k-th distance so far.
        let mut requests = Vec::new();
        for (query, n) in targets.iter().enumerate() {
            let radius = kth_distance(&found[query], n.k);
            for rank in self.digest.ranks_within(n.target, radius)? {
                if !asked[query].contains(&rank) {
                    requests.push((rank, nearest_request(query, n, radius)));
                }
            }
        }
        tracing::debug!(
            rank = self.rank(),
            requests = requests.len(),
            "nearest second round"
        );
        for answer in self.exchange(requests)? {
            found[answer.query].push(answer);
        }
        for (hits, n) in found.iter_mut().zip(targets) {
            keep_nearest(hits, n.k);
        }
        Ok(nearest_results(found))
    }

    fn nearest_conservative(&self, targets: &[Nearest]) -> Result<QueryResults> {
        let mut requests = Vec::new();
        for (query, n) in targets.iter().enumerate() {
            let radius = self
                .digest
                .enclosing_radius(n.target, n.k)
                .unwrap_or(f64::INFINITY);
            for rank in self.digest.ranks_within(n.target, radius)? {
                requests.push((rank, nearest_request(query, n, radius)));
            }
        }
        let mut found = by_query(targets.len(), self.exchange(requests)?);
        for (hits, n) in found.iter_mut().zip(targets) {
            keep_nearest(hits, n.k);
        }
        Ok(nearest_results(found))
    }

    /// Send each request to its rank, answer the requests this rank receives,
    /// and return the answers to this rank's own requests, grouped by
    /// ascending responding rank.
    fn exchange(&self, requests: Vec<(usize, Request)>) -> Result<Vec<Answer>> {
        let (destinations, outgoing): (Vec<usize>, Vec<Request>) = requests.into_iter().unzip();
        let forward = Distributor::from_sends(&self.comm, &destinations)?;
        let incoming = forward.do_posts(&self.comm, outgoing)?;
        let origins = forward.import_sources();

        let rank = self.rank();
        let local = &self.local;
        let capacity = self.options.max_neighbors;
        let replies: Vec<Vec<Answer>> = incoming
            .par_iter()
            .map_init(
                || (NeighborQueue::with_capacity(capacity), Vec::new()),
                |(queue, scratch), request| answer(local, rank, request, queue, scratch),
            )
            .collect::<core::result::Result<_, IndexError>>()?;

        let mut reply_destinations = Vec::new();
        let mut outgoing = Vec::new();
        for (origin, reply) in origins.into_iter().zip(replies) {
            reply_destinations.extend(core::iter::repeat_n(origin, reply.len()));
            outgoing.extend(reply);
        }
        let backward = Distributor::from_sends(&self.comm, &reply_destinations)?;
        let answers = backward.do_posts(&self.comm, outgoing)?;
        tracing::debug!(
            rank,
            sent = destinations.len(),
            answered = incoming.len(),
            received = answers.len(),
            "query exchange"
        );
        Ok(answers)
    }
}

impl<C: Communicator, B: Backend> Debug for DistributedTree<C, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DistributedTree")
            .field("rank", &self.comm.rank())
            .field("comm_size", &self.comm.size())
            .field("local_size", &self.local.len())
            .field("digest", &self.digest)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Answer one incoming request against the local backend.
fn answer<B: Backend>(
    local: &B,
    rank: usize,
    request: &Request,
    queue: &mut NeighborQueue,
    scratch: &mut Vec<Neighbor>,
) -> core::result::Result<Vec<Answer>, IndexError> {
    let reply = |n: &Neighbor| Answer {
        query: request.query,
        index: n.index,
        rank,
        distance: n.distance,
    };
    match &request.predicate {
        Predicate::Nearest(n) => {
            let k = n.k.min(local.len());
            if k == 0 {
                return Ok(Vec::new());
            }
            scratch.clear();
            local.query_nearest_with(n.target, k, queue, scratch)?;
            Ok(scratch
                .iter()
                .filter(|hit| hit.distance <= request.radius)
                .map(reply)
                .collect())
        }
        predicate => Ok(local.query(predicate)?.iter().map(reply).collect()),
    }
}

fn nearest_request(query: usize, n: &Nearest, radius: f64) -> Request {
    Request {
        query,
        predicate: Predicate::Nearest(*n),
        radius,
    }
}

fn by_query(queries: usize, answers: Vec<Answer>) -> Vec<Vec<Answer>> {
    let mut out = vec![Vec::new(); queries];
    for answer in answers {
        out[answer.query].push(answer);
    }
    out
}

fn keep_nearest(hits: &mut Vec<Answer>, k: usize) {
    hits.sort_by(Answer::order);
    hits.truncate(k);
}

/// Distance of the `k`-th hit, or infinity while fewer than `k` are known.
fn kth_distance(sorted: &[Answer], k: usize) -> f64 {
    k.checked_sub(1)
        .and_then(|i| sorted.get(i))
        .map_or(f64::INFINITY, |a| a.distance)
}

fn nearest_results(found: Vec<Vec<Answer>>) -> QueryResults {
    let queries = found.len();
    QueryResults::from_sorted(
        queries,
        found.into_iter().flatten().map(|a| {
            (
                a.query,
                Hit {
                    index: a.index,
                    rank: a.rank,
                    distance: Some(a.distance),
                },
            )
        }),
        true,
    )
}
