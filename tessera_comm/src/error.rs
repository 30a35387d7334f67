// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for process-group communication.

use thiserror::Error;

use crate::communicator::Tag;

/// Communication errors.
///
/// None of these are retried: once an exchange fails, the process group is
/// in an unknown state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// A rank outside `0..size` was addressed.
    #[error("rank {rank} out of range for a group of {size}")]
    InvalidRank {
        /// Requested rank.
        rank: usize,
        /// Group size.
        size: usize,
    },

    /// The peer left the group (its handle was dropped, for example after a panic).
    #[error("rank {peer} disconnected")]
    Disconnected {
        /// Peer rank.
        peer: usize,
    },

    /// The next message from `peer` was sent for a different operation: the
    /// ranks did not issue the same collective calls in the same order.
    #[error("collective mismatch with rank {peer}: expected tag {expected:?}, found {found:?}")]
    TagMismatch {
        /// Peer rank.
        peer: usize,
        /// Tag the receiver asked for.
        expected: Tag,
        /// Tag that arrived.
        found: Tag,
    },

    /// A message or buffer length disagrees with the negotiated size.
    #[error("size mismatch with rank {peer}: expected {expected} elements, found {found}")]
    SizeMismatch {
        /// Peer rank (this rank for local buffers).
        peer: usize,
        /// Negotiated number of elements.
        expected: usize,
        /// Actual number of elements.
        found: usize,
    },

    /// The payload from `peer` does not have the requested element type.
    #[error("unexpected payload type from rank {peer} for tag {tag:?}")]
    PayloadType {
        /// Peer rank.
        peer: usize,
        /// Message tag.
        tag: Tag,
    },
}

/// Result type for communication operations.
pub type Result<T> = std::result::Result<T, CommError>;
