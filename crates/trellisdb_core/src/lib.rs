//! # TrellisDB Core
//!
//! The journaled entity-group storage engine: the transaction coordination
//! and MVCC journaling protocol at the heart of the proxy.
//!
//! The engine is a stateless façade over two external collaborators — a
//! plain table store and a coordination service — plus one piece of
//! process-local mutable state, the ID allocator's block cache. Writes go
//! to two places: the **head row** in the entity table (current value plus
//! the writing transaction's handle) and an append-only **journal** row
//! keyed by (row key, handle). Reads consult the coordination service to
//! decide whether the head row's writer is still valid; when it is not,
//! they fall back to the journal entry of the last valid version. Nothing
//! is ever physically rolled back.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use trellisdb_codec::{Entity, EntityKey, PropertyValue};
//! use trellisdb_coord::LocalCoordinator;
//! use trellisdb_core::GroupStore;
//! use trellisdb_keys::PathElement;
//! use trellisdb_tables::MemoryTables;
//!
//! let store = GroupStore::new(
//!     Arc::new(MemoryTables::new()),
//!     Arc::new(LocalCoordinator::new()),
//! );
//!
//! let key = EntityKey::new("a1", "", vec![PathElement::new("Foo")]);
//! let mut entity = Entity::new(key);
//! entity.set_property("name", PropertyValue::Text("alpha".into()));
//!
//! let keys = store.put_entities("a1", vec![entity], None).unwrap();
//! let fetched = store.get_entities("a1", keys).unwrap();
//! assert!(fetched[0].is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod engine;
mod error;
mod idalloc;
mod query;

pub use catalog::{KindCatalog, CATALOG_TABLE};
pub use config::EngineConfig;
pub use engine::{AllocateMode, GroupStore, IdRange};
pub use error::{CoreError, CoreResult};
pub use idalloc::IdAllocator;
pub use query::QuerySpec;
