//! # TrellisDB Testkit
//!
//! Test utilities shared across the workspace:
//! - Ready-made fixtures: a [`DatastoreService`](trellisdb_server::DatastoreService)
//!   or bare engine over in-memory tables and an in-process coordinator
//! - Entity and key builders for terse test setup
//! - Property-based generators (proptest strategies) for paths, values,
//!   and entities
//!
//! ## Usage
//!
//! ```rust
//! use trellisdb_testkit::prelude::*;
//!
//! let fx = ServiceFixture::new();
//! let keys = fx
//!     .service
//!     .engine()
//!     .put_entities("a1", vec![int_entity("a1", "Foo", 1, "n", 5)], None)
//!     .unwrap();
//! assert_eq!(keys.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Convenient imports for test modules.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
