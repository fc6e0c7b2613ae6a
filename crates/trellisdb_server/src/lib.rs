//! # TrellisDB Server
//!
//! The datastore RPC dispatcher: one [`DatastoreService`] instance owns the
//! storage engine and the coordination client, and exposes one handler per
//! datastore method behind a `dispatch` front door that speaks the
//! `trellisdb_proto` envelope.
//!
//! The crate is transport-agnostic. Whatever carries envelopes (a socket
//! server, an in-process test harness) extracts the caller identity from
//! its transport headers into a [`CallerContext`] and hands both to
//! [`DatastoreService::dispatch`].
//!
//! # Transaction handling
//!
//! Explicit transactions are begun with `BeginTransaction` and settled with
//! `Commit` or `Rollback`. Every transactional request re-acquires the
//! entity-group lock (reentrant for the holder) so a request arriving after
//! the lock was lost fails loudly rather than writing unprotected. Batches
//! inside a transaction must stay within a single entity group, and
//! transactional queries must carry an ancestor.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod caller;
mod config;
mod error;
mod handler;

pub use caller::CallerContext;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::DatastoreService;
