// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory process group: one thread per rank, one channel per ordered pair
//! of ranks.

use std::any::Any;
use std::fmt::Debug;
use std::panic;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::communicator::{Communicator, Tag};
use crate::error::{CommError, Result};

struct Envelope {
    tag: Tag,
    payload: Box<dyn Any + Send>,
}

/// One rank's handle on an in-memory group.
///
/// Sends never block (channels are unbounded); receives block until the next
/// message from that source arrives. Dropping a handle disconnects it: peers
/// waiting on it get [`CommError::Disconnected`] instead of hanging.
pub struct LocalComm {
    rank: usize,
    outboxes: Vec<Sender<Envelope>>,
    inboxes: Vec<Receiver<Envelope>>,
}

impl LocalComm {
    /// Create the handles of a group of `size` ranks; element `r` is rank `r`.
    pub fn group(size: usize) -> Vec<Self> {
        let mut outboxes: Vec<Vec<Sender<Envelope>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<Receiver<Envelope>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        for source in 0..size {
            for dest in 0..size {
                let (tx, rx) = unbounded();
                outboxes[source].push(tx);
                inboxes[dest].push(rx);
            }
        }
        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| Self {
                rank,
                outboxes,
                inboxes,
            })
            .collect()
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank >= self.outboxes.len() {
            return Err(CommError::InvalidRank {
                rank,
                size: self.outboxes.len(),
            });
        }
        Ok(())
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send<T: Send + 'static>(&self, dest: usize, tag: Tag, payload: Vec<T>) -> Result<()> {
        self.check_rank(dest)?;
        tracing::trace!(rank = self.rank, dest, tag = tag.0, len = payload.len(), "send");
        self.outboxes[dest]
            .send(Envelope {
                tag,
                payload: Box::new(payload),
            })
            .map_err(|_| CommError::Disconnected { peer: dest })
    }

    fn recv<T: Send + 'static>(&self, source: usize, tag: Tag) -> Result<Vec<T>> {
        self.check_rank(source)?;
        let envelope = self.inboxes[source]
            .recv()
            .map_err(|_| CommError::Disconnected { peer: source })?;
        if envelope.tag != tag {
            return Err(CommError::TagMismatch {
                peer: source,
                expected: tag,
                found: envelope.tag,
            });
        }
        let payload = envelope
            .payload
            .downcast::<Vec<T>>()
            .map_err(|_| CommError::PayloadType { peer: source, tag })?;
        tracing::trace!(rank = self.rank, source, tag = tag.0, len = payload.len(), "recv");
        Ok(*payload)
    }
}

impl Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.outboxes.len())
            .finish_non_exhaustive()
    }
}

/// Runs an SPMD closure on a fixed number of in-memory ranks.
///
/// ```
/// use tessera_comm::{Communicator, LocalGroup};
///
/// let sums = LocalGroup::new(3).run(|comm| {
///     let all = comm.all_gather(comm.rank() * 10).unwrap();
///     all.iter().sum::<usize>()
/// });
/// assert_eq!(sums, vec![30, 30, 30]);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct LocalGroup {
    size: usize,
}

impl LocalGroup {
    /// A group of `size` ranks.
    pub const fn new(size: usize) -> Self {
        Self { size }
    }

    /// Number of ranks.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Run `f` once per rank, each on its own thread, and return the results
    /// indexed by rank.
    ///
    /// All threads are joined before returning. If any rank panicked, the
    /// first panic (by rank) is resumed on the calling thread.
    pub fn run<R, F>(&self, f: F) -> Vec<R>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let comms = LocalComm::group(self.size);
        let joined: Vec<std::thread::Result<R>> = std::thread::scope(|s| {
            let f = &f;
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| s.spawn(move || f(comm)))
                .collect();
            handles.into_iter().map(|h| h.join()).collect()
        });
        let mut out = Vec::with_capacity(joined.len());
        for r in joined {
            match r {
                Ok(v) => out.push(v),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        out
    }
}
