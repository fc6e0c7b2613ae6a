//! # TrellisDB Keys
//!
//! Ancestor-path types and the pure row-key derivation functions for
//! TrellisDB.
//!
//! Every entity is addressed by an ancestor path (`Grandparent:1/Parent:2/
//! Child:3`). This crate derives the sortable string keys the table layer
//! stores rows under:
//!
//! - **Row keys** identify one entity: `app/Kind:id` segments, with numeric
//!   ids zero-padded to a fixed width so lexicographic order matches numeric
//!   order.
//! - **Root keys** identify the entity group (the unit of locking): the row
//!   key of the path's first element only.
//! - **Journal keys** identify one prior version of a row:
//!   `row_key/zero-padded-version`.
//!
//! All functions here are pure; nothing in this crate touches storage or the
//! coordination service.
//!
//! ## Example
//!
//! ```rust
//! use trellisdb_keys::{row_key, root_key, PathElement};
//!
//! let path = vec![
//!     PathElement::with_id("Foo", 1),
//!     PathElement::with_name("Bar", "x"),
//! ];
//! let row = row_key("a1", &path).unwrap();
//! assert!(row.starts_with("a1/Foo:"));
//! assert!(row.ends_with("/Bar:x"));
//!
//! // The root key depends only on the first element.
//! assert_eq!(root_key("a1", &path), row_key("a1", &path[..1]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod deleted;
mod path;

pub use deleted::{deleted_value, is_deleted, root_key_from_deleted, row_key_from_deleted};
pub use path::{AncestorPath, ElementId, KeyError, KeyResult, PathElement};

/// Width every numeric id and version is zero-padded to inside keys.
///
/// Padding keeps lexicographic order on keys identical to numeric order on
/// ids, which the table store's sorted scans depend on.
pub const ID_KEY_LENGTH: usize = 64;

/// Sentinel spliced in front of entity names that consist only of digits,
/// so they can never collide with a zero-padded numeric id.
pub const DIGIT_NAME_SENTINEL: &str = "__key__";

/// Version value meaning "this row has never been written".
pub const VERSION_NONEXISTENT: i64 = 0;

/// Returns the backend table name for an app's kind in a namespace.
#[must_use]
pub fn table_name(app: &str, kind: &str, namespace: &str) -> String {
    format!("{app}___{kind}___{namespace}")
}

/// Returns the backend journal table name for an app/namespace pair.
#[must_use]
pub fn journal_table_name(app: &str, namespace: &str) -> String {
    format!("journal___{app}___{namespace}")
}

/// Zero-pads a non-negative integer to [`ID_KEY_LENGTH`] digits.
#[must_use]
pub fn zero_pad(value: i64) -> String {
    format!("{value:0width$}", width = ID_KEY_LENGTH)
}

fn push_element(key: &mut String, element: &PathElement) -> bool {
    key.push('/');
    key.push_str(&element.kind);
    match &element.id {
        ElementId::Id(id) => {
            key.push(':');
            key.push_str(&zero_pad(*id));
            true
        }
        ElementId::Name(name) => {
            key.push(':');
            if name.chars().all(|c| c.is_ascii_digit()) && !name.is_empty() {
                key.push_str(DIGIT_NAME_SENTINEL);
            }
            key.push_str(name);
            true
        }
        ElementId::Unassigned => false,
    }
}

/// Derives the row key for an entity's full ancestor path.
///
/// Returns `None` when the path is empty or any element has neither an id
/// nor a name yet; callers must treat that as a malformed request.
#[must_use]
pub fn row_key(app: &str, path: &[PathElement]) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let mut key = String::from(app);
    for element in path {
        if !push_element(&mut key, element) {
            return None;
        }
    }
    Some(key)
}

/// Derives the entity-group (root) key: the row key of the first path
/// element only.
///
/// Returns `None` when the root element has not been assigned an id or name
/// yet. During a Put that is a normal transient state, not an error.
#[must_use]
pub fn root_key(app: &str, path: &[PathElement]) -> Option<String> {
    let first = path.first()?;
    let mut key = String::from(app);
    if push_element(&mut key, first) {
        Some(key)
    } else {
        None
    }
}

/// Derives the journal key for one prior version of a row.
#[must_use]
pub fn journal_key(row_key: &str, version: i64) -> String {
    format!("{row_key}/{}", zero_pad(version))
}
