// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Comm: the process-group layer under Tessera's distributed search tree.
//!
//! - [`Communicator`]: rank, size, tagged point-to-point messages, and the
//!   collectives built on them (`all_gather`, `barrier`).
//! - [`Distributor`]: a two-phase any-to-any exchange. Phase one negotiates how
//!   many items go where; phase two moves them.
//! - [`LocalGroup`] / [`LocalComm`]: an in-memory group running one thread per
//!   rank over `crossbeam-channel`. Used by tests, benches, and demos, and handy
//!   anywhere a real multi-process transport is not needed.
//!
//! Every collective must be called by all ranks, the same number of times and in
//! the same order. Each message carries a [`Tag`] so that a rank which skipped or
//! reordered a collective is reported as [`CommError::TagMismatch`] rather than
//! silently reading another operation's data.
//!
//! # Example
//!
//! ```rust
//! use tessera_comm::{Communicator, Distributor, LocalGroup};
//!
//! // Each rank sends its own rank number to the next rank (cyclically).
//! let got = LocalGroup::new(3).run(|comm| {
//!     let next = (comm.rank() + 1) % comm.size();
//!     let plan = Distributor::from_sends(&comm, &[next]).unwrap();
//!     plan.do_posts(&comm, vec![comm.rank()]).unwrap()
//! });
//! assert_eq!(got, vec![vec![2], vec![0], vec![1]]);
//! ```

mod communicator;
mod distributor;
mod error;
mod local;

pub use communicator::{Communicator, Tag};
pub use distributor::Distributor;
pub use error::{CommError, Result};
pub use local::{LocalComm, LocalGroup};
