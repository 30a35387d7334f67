// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for the distributed search tree.

use tessera_comm::CommError;
use tessera_index::IndexError;
use thiserror::Error;

/// Distributed search errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Malformed query batch or disagreeing ranks.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A nearest query asks for more neighbors than the scratch queues hold.
    #[error("nearest query asks for {requested} neighbors, at most {capacity} allowed")]
    CapacityExceeded {
        /// Requested `k`.
        requested: usize,
        /// [`TreeOptions::max_neighbors`](crate::TreeOptions::max_neighbors).
        capacity: usize,
    },

    /// Communication failure.
    #[error(transparent)]
    Comm(#[from] CommError),

    /// Local traversal failure.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Result type for distributed search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
