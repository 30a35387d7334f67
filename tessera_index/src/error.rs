// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for local index queries.

use thiserror::Error;

/// Local index errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    /// Malformed predicate or argument (for example `k == 0` or a negative radius).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A bounded priority queue was asked to hold more than its fixed capacity.
    #[error("priority queue capacity {capacity} exceeded")]
    CapacityExceeded {
        /// Fixed capacity of the queue.
        capacity: usize,
    },
}

/// Result type for local index operations.
pub type Result<T> = core::result::Result<T, IndexError>;
