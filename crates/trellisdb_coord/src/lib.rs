//! # TrellisDB Coord
//!
//! Typed client interface to the external coordination service: distributed
//! entity-group locks, transaction handles, validity resolution, and ID
//! blocks. The engine never talks to the service directly; everything goes
//! through the [`Coordinator`] trait.
//!
//! Two implementations matter:
//!
//! - a network client against the real lock service (out of tree), and
//! - [`LocalCoordinator`], a complete in-process implementation of the same
//!   contract, used by tests and single-node deployments.
//!
//! ## Contract highlights
//!
//! - `acquire_lock` fails **fast** with a distinguished concurrent
//!   transaction error; it never queues.
//! - `valid_transaction_id` resolves the version a reader should trust:
//!   the given version if its transaction committed, else the version
//!   registered before the rolled-back write (or [`VERSION_NONEXISTENT`]).
//! - ID blocks are handed out exclusively; the caller owns `[start,
//!   start+size)` until exhausted.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod local;

pub use client::{Coordinator, IdBlock, TxHandle};
pub use error::{CoordError, CoordResult};
pub use local::LocalCoordinator;

/// Version value meaning "no committed write exists for this row".
pub const VERSION_NONEXISTENT: i64 = 0;
