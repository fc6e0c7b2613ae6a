//! Ancestor-path element types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for key operations.
pub type KeyResult<T> = Result<T, KeyError>;

/// Errors raised while working with ancestor paths.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The path contains no elements.
    #[error("ancestor path is empty")]
    EmptyPath,

    /// An element that must carry an id or name does not.
    #[error("path element '{kind}' has neither an id nor a name")]
    UnassignedElement {
        /// Kind of the offending element.
        kind: String,
    },

    /// A stored key could not be parsed back into its parts.
    #[error("malformed stored key: {0}")]
    Malformed(String),
}

/// The identifier half of a path element.
///
/// Exactly one of a numeric id or a string name identifies a stored element.
/// `Unassigned` only appears on the last element of an incoming Put, before
/// the server assigns an id from the coordination service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementId {
    /// No identifier yet; the server will allocate one.
    Unassigned,
    /// Server- or client-assigned numeric id.
    Id(i64),
    /// Client-chosen string name.
    Name(String),
}

impl ElementId {
    /// Returns true when an id or name has been assigned.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        !matches!(self, ElementId::Unassigned)
    }
}

/// One `{kind, id-or-name}` step of an ancestor path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathElement {
    /// Entity kind, e.g. `"Employee"`.
    pub kind: String,
    /// Numeric id or string name.
    pub id: ElementId,
}

impl PathElement {
    /// Creates an element with no identifier assigned yet.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: ElementId::Unassigned,
        }
    }

    /// Creates an element with a numeric id.
    #[must_use]
    pub fn with_id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id: ElementId::Id(id),
        }
    }

    /// Creates an element with a string name.
    #[must_use]
    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: ElementId::Name(name.into()),
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            ElementId::Unassigned => write!(f, "{}:?", self.kind),
            ElementId::Id(id) => write!(f, "{}:{id}", self.kind),
            ElementId::Name(name) => write!(f, "{}:{name}", self.kind),
        }
    }
}

/// An ordered sequence of path elements, root first.
pub type AncestorPath = Vec<PathElement>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_states() {
        assert!(!PathElement::new("Foo").id.is_assigned());
        assert!(PathElement::with_id("Foo", 3).id.is_assigned());
        assert!(PathElement::with_name("Foo", "x").id.is_assigned());
    }

    #[test]
    fn display_forms() {
        assert_eq!(PathElement::with_id("Foo", 3).to_string(), "Foo:3");
        assert_eq!(PathElement::with_name("Foo", "x").to_string(), "Foo:x");
        assert_eq!(PathElement::new("Foo").to_string(), "Foo:?");
    }
}
