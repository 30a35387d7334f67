// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-phase any-to-any exchange.
//!
//! Receivers cannot know in advance how much will be sent to them, so an
//! exchange is split in two collective phases:
//!
//! 1. [`Distributor::from_sends`]: every rank announces to every other rank how
//!    many items it will send there. Afterwards each rank knows exactly how many
//!    items it will receive and from whom.
//! 2. [`Distributor::do_posts`]: the payloads move. Items for one destination
//!    keep their relative order; imports are grouped by ascending source rank.
//!
//! A plan only describes sizes, so the same plan can carry several payloads
//! of the same shape (one `do_posts` call per payload, same order on every rank).

use std::fmt::Debug;

use crate::communicator::{Communicator, Tag, single};
use crate::error::{CommError, Result};

/// Negotiated plan for one any-to-any exchange.
#[derive(Clone)]
pub struct Distributor {
    rank: usize,
    destinations: Vec<usize>,
    send_counts: Vec<usize>,
    recv_counts: Vec<usize>,
}

impl Distributor {
    /// Phase one: negotiate sizes for exports whose destinations are
    /// `destinations` (one entry per export, any order). Collective.
    pub fn from_sends<C: Communicator>(comm: &C, destinations: &[usize]) -> Result<Self> {
        let size = comm.size();
        let me = comm.rank();
        let mut send_counts = vec![0_usize; size];
        for &dest in destinations {
            let Some(count) = send_counts.get_mut(dest) else {
                return Err(CommError::InvalidRank { rank: dest, size });
            };
            *count += 1;
        }

        for dest in (0..size).filter(|&r| r != me) {
            comm.send(dest, Tag::SIZES, vec![send_counts[dest]])?;
        }
        let mut recv_counts = vec![0_usize; size];
        for source in 0..size {
            recv_counts[source] = if source == me {
                send_counts[me]
            } else {
                single(source, comm.recv(source, Tag::SIZES)?)?
            };
        }

        let plan = Self {
            rank: me,
            destinations: destinations.to_vec(),
            send_counts,
            recv_counts,
        };
        tracing::debug!(
            rank = me,
            sends = plan.total_sends(),
            receives = plan.total_receives(),
            "distributor plan negotiated"
        );
        Ok(plan)
    }

    /// Number of items this rank exports.
    pub fn total_sends(&self) -> usize {
        self.destinations.len()
    }

    /// Number of items this rank will import.
    pub fn total_receives(&self) -> usize {
        self.recv_counts.iter().sum()
    }

    /// Items sent to each rank.
    pub fn send_counts(&self) -> &[usize] {
        &self.send_counts
    }

    /// Items received from each rank.
    pub fn recv_counts(&self) -> &[usize] {
        &self.recv_counts
    }

    /// Source rank of every import, in import order.
    pub fn import_sources(&self) -> Vec<usize> {
        self.recv_counts
            .iter()
            .enumerate()
            .flat_map(|(source, &count)| core::iter::repeat_n(source, count))
            .collect()
    }

    /// Phase two: send `exports` (aligned with the destinations given to
    /// [`from_sends`](Self::from_sends)) and return the imports, grouped by
    /// ascending source rank. Collective.
    pub fn do_posts<C, T>(&self, comm: &C, exports: Vec<T>) -> Result<Vec<T>>
    where
        C: Communicator,
        T: Send + 'static,
    {
        if exports.len() != self.destinations.len() {
            return Err(CommError::SizeMismatch {
                peer: self.rank,
                expected: self.destinations.len(),
                found: exports.len(),
            });
        }
        let mut buckets: Vec<Vec<T>> = self
            .send_counts
            .iter()
            .map(|&count| Vec::with_capacity(count))
            .collect();
        for (item, &dest) in exports.into_iter().zip(&self.destinations) {
            buckets[dest].push(item);
        }

        let mut local = Vec::new();
        for (dest, bucket) in buckets.into_iter().enumerate() {
            if dest == self.rank {
                local = bucket;
            } else if !bucket.is_empty() {
                comm.send(dest, Tag::PAYLOAD, bucket)?;
            }
        }

        let mut imports = Vec::with_capacity(self.total_receives());
        for (source, &expected) in self.recv_counts.iter().enumerate() {
            if source == self.rank {
                imports.append(&mut local);
            } else if expected > 0 {
                let received: Vec<T> = comm.recv(source, Tag::PAYLOAD)?;
                if received.len() != expected {
                    return Err(CommError::SizeMismatch {
                        peer: source,
                        expected,
                        found: received.len(),
                    });
                }
                imports.extend(received);
            }
        }
        Ok(imports)
    }
}

impl Debug for Distributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distributor")
            .field("rank", &self.rank)
            .field("send_counts", &self.send_counts)
            .field("recv_counts", &self.recv_counts)
            .finish_non_exhaustive()
    }
}
