// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The process-group capability consumed by the distributed search tree.

use crate::error::{CommError, Result};

/// Message tag; identifies which operation a point-to-point message belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tag(pub u32);

impl Tag {
    /// [`Communicator::all_gather`] traffic.
    pub const ALL_GATHER: Self = Self(1);
    /// Phase one of a [`Distributor`](crate::Distributor) exchange.
    pub const SIZES: Self = Self(2);
    /// Phase two of a [`Distributor`](crate::Distributor) exchange.
    pub const PAYLOAD: Self = Self(3);
    /// First tag free for callers.
    pub const USER: Self = Self(16);
}

/// A fixed set of cooperating ranks.
///
/// Point-to-point messages between one ordered pair of ranks arrive in the
/// order they were sent. Collective helpers (`all_gather`, `barrier`,
/// [`Distributor`](crate::Distributor)) require every rank to call them the
/// same number of times in the same order; a receive that finds a message
/// sent for another operation fails with
/// [`CommError::TagMismatch`](crate::CommError::TagMismatch).
pub trait Communicator {
    /// This process's rank in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Send `payload` to `dest`. Does not wait for the receiver.
    fn send<T: Send + 'static>(&self, dest: usize, tag: Tag, payload: Vec<T>) -> Result<()>;

    /// Block until the next message from `source` arrives and return it.
    fn recv<T: Send + 'static>(&self, source: usize, tag: Tag) -> Result<Vec<T>>;

    /// Gather one value from every rank; element `r` comes from rank `r`.
    fn all_gather<T: Clone + Send + 'static>(&self, value: T) -> Result<Vec<T>> {
        let me = self.rank();
        for dest in (0..self.size()).filter(|&r| r != me) {
            self.send(dest, Tag::ALL_GATHER, vec![value.clone()])?;
        }
        let mut out = Vec::with_capacity(self.size());
        for source in 0..self.size() {
            if source == me {
                out.push(value.clone());
            } else {
                out.push(single(source, self.recv(source, Tag::ALL_GATHER)?)?);
            }
        }
        Ok(out)
    }

    /// Block until every rank has reached the barrier.
    fn barrier(&self) -> Result<()> {
        self.all_gather(()).map(|_| ())
    }
}

impl<C: Communicator> Communicator for &C {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn send<T: Send + 'static>(&self, dest: usize, tag: Tag, payload: Vec<T>) -> Result<()> {
        (**self).send(dest, tag, payload)
    }

    fn recv<T: Send + 'static>(&self, source: usize, tag: Tag) -> Result<Vec<T>> {
        (**self).recv(source, tag)
    }

    fn all_gather<T: Clone + Send + 'static>(&self, value: T) -> Result<Vec<T>> {
        (**self).all_gather(value)
    }

    fn barrier(&self) -> Result<()> {
        (**self).barrier()
    }
}

/// Unwrap a message that must carry exactly one element.
pub(crate) fn single<T>(peer: usize, mut v: Vec<T>) -> Result<T> {
    match (v.pop(), v.len()) {
        (Some(x), 0) => Ok(x),
        (x, rest) => Err(CommError::SizeMismatch {
            peer,
            expected: 1,
            found: rest + usize::from(x.is_some()),
        }),
    }
}
