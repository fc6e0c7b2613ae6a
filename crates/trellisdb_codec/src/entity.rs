//! Entities and entity keys.

use crate::value::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trellisdb_keys::{root_key, row_key, PathElement};

/// Fully qualified entity key: tenant, namespace, and ancestor path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKey {
    /// Owning application (tenant) id.
    pub app: String,
    /// Namespace; empty string is the default namespace.
    pub namespace: String,
    /// Ancestor path, root first.
    pub path: Vec<PathElement>,
}

impl EntityKey {
    /// Creates a key from its parts.
    #[must_use]
    pub fn new(
        app: impl Into<String>,
        namespace: impl Into<String>,
        path: Vec<PathElement>,
    ) -> Self {
        Self {
            app: app.into(),
            namespace: namespace.into(),
            path,
        }
    }

    /// Kind of the entity itself (the last path element).
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.path.last().map(|e| e.kind.as_str())
    }

    /// Derives the storage row key; `None` while any element is unassigned.
    #[must_use]
    pub fn row_key(&self) -> Option<String> {
        row_key(&self.app, &self.path)
    }

    /// Derives the entity-group key; `None` while the root is unassigned.
    #[must_use]
    pub fn root_key(&self) -> Option<String> {
        root_key(&self.app, &self.path)
    }

    /// Returns true when `ancestor` is a path prefix of this key's path.
    #[must_use]
    pub fn has_ancestor(&self, ancestor: &[PathElement]) -> bool {
        self.path.len() >= ancestor.len() && self.path[..ancestor.len()] == *ancestor
    }
}

/// A decoded entity: key, entity-group reference, and typed properties.
///
/// Multi-valued properties are lists; a single value is a one-element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// The entity's key.
    pub key: EntityKey,
    /// Root element of the owning entity group, set once the key is final.
    pub group: Option<PathElement>,
    /// Property name to values.
    pub properties: BTreeMap<String, Vec<PropertyValue>>,
}

impl Entity {
    /// Creates an empty entity for a key.
    #[must_use]
    pub fn new(key: EntityKey) -> Self {
        Self {
            key,
            group: None,
            properties: BTreeMap::new(),
        }
    }

    /// Replaces a property with a single value.
    pub fn set_property(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.insert(name.into(), vec![value]);
    }

    /// Appends one value to a (possibly multi-valued) property.
    pub fn push_property(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.entry(name.into()).or_default().push(value);
    }

    /// Values of a property; empty slice when absent.
    #[must_use]
    pub fn property(&self, name: &str) -> &[PropertyValue] {
        self.properties.get(name).map_or(&[], Vec::as_slice)
    }

    /// Points the entity-group reference at the path's root element.
    pub fn assign_group(&mut self) {
        if self.group.is_none() {
            self.group = self.key.path.first().cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: Vec<PathElement>) -> EntityKey {
        EntityKey::new("a1", "", path)
    }

    #[test]
    fn kind_is_the_last_element() {
        let k = key(vec![
            PathElement::with_id("Foo", 1),
            PathElement::with_name("Bar", "x"),
        ]);
        assert_eq!(k.kind(), Some("Bar"));
    }

    #[test]
    fn ancestor_prefix_matching() {
        let ancestor = vec![PathElement::with_id("Foo", 1)];
        let child = key(vec![
            PathElement::with_id("Foo", 1),
            PathElement::with_name("Bar", "x"),
        ]);
        let stranger = key(vec![PathElement::with_id("Foo", 2)]);
        assert!(child.has_ancestor(&ancestor));
        assert!(key(ancestor.clone()).has_ancestor(&ancestor));
        assert!(!stranger.has_ancestor(&ancestor));
    }

    #[test]
    fn group_assignment_is_idempotent() {
        let mut entity = Entity::new(key(vec![
            PathElement::with_id("Foo", 1),
            PathElement::with_name("Bar", "x"),
        ]));
        entity.assign_group();
        assert_eq!(entity.group, Some(PathElement::with_id("Foo", 1)));
        entity.assign_group();
        assert_eq!(entity.group, Some(PathElement::with_id("Foo", 1)));
    }

    #[test]
    fn multi_valued_properties() {
        let mut entity = Entity::new(key(vec![PathElement::with_id("Foo", 1)]));
        entity.push_property("tags", PropertyValue::Text("a".into()));
        entity.push_property("tags", PropertyValue::Text("b".into()));
        assert_eq!(entity.property("tags").len(), 2);
        entity.set_property("tags", PropertyValue::Text("only".into()));
        assert_eq!(entity.property("tags").len(), 1);
        assert!(entity.property("missing").is_empty());
    }
}
