//! # TrellisDB Tables
//!
//! The row-store backend abstraction the proxy writes through.
//!
//! Backends are **dumb sorted tables**: named maps from string row keys to
//! opaque values with an optional writer-version column. They provide no
//! transactions, no secondary indexes, and no interpretation of values —
//! the engine owns the journaling protocol and the value format.
//!
//! ## Design Principles
//!
//! - Row reads return a tagged [`RowFetch`], never error-code tuples
//! - A missing table behaves like an empty one for reads and scans
//! - `put_row` creates tables lazily (table mapping on first write)
//! - Backends must be `Send + Sync`; every call may be a network RPC
//!
//! ## Available Backends
//!
//! - [`MemoryTables`] — in-process, for tests and single-node use
//!
//! Network adapters (SQL/NoSQL) implement [`TableStore`] out of tree.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod store;

pub use error::{TableError, TableResult};
pub use memory::MemoryTables;
pub use store::{RowData, RowFetch, TableStore};
