//! Test fixtures and entity builders.

use std::sync::Arc;
use trellisdb_codec::{Entity, EntityKey, PropertyValue};
use trellisdb_coord::LocalCoordinator;
use trellisdb_core::GroupStore;
use trellisdb_keys::PathElement;
use trellisdb_server::{CallerContext, DatastoreService, ServerConfig};
use trellisdb_tables::MemoryTables;

/// A full datastore service over in-memory tables and an in-process
/// coordinator, with the collaborators kept reachable for inspection.
pub struct ServiceFixture {
    /// The service under test.
    pub service: DatastoreService,
    /// The backing table store.
    pub tables: Arc<MemoryTables>,
    /// The coordination service.
    pub coord: Arc<LocalCoordinator>,
}

impl ServiceFixture {
    /// Creates a fixture with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ServerConfig::new())
    }

    /// Creates a fixture with explicit configuration.
    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        let tables = Arc::new(MemoryTables::new());
        let coord = Arc::new(LocalCoordinator::new());
        let service = DatastoreService::with_config(tables.clone(), coord.clone(), config);
        Self {
            service,
            tables,
            coord,
        }
    }

    /// A caller context for an app.
    #[must_use]
    pub fn caller(&self, app: &str) -> CallerContext {
        CallerContext::new(app)
    }
}

impl Default for ServiceFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A bare storage engine over in-memory collaborators.
pub struct EngineFixture {
    /// The engine under test.
    pub engine: GroupStore,
    /// The backing table store.
    pub tables: Arc<MemoryTables>,
    /// The coordination service.
    pub coord: Arc<LocalCoordinator>,
}

impl EngineFixture {
    /// Creates a fixture with default configuration.
    #[must_use]
    pub fn new() -> Self {
        let tables = Arc::new(MemoryTables::new());
        let coord = Arc::new(LocalCoordinator::new());
        let engine = GroupStore::new(tables.clone(), coord.clone());
        Self {
            engine,
            tables,
            coord,
        }
    }
}

impl Default for EngineFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A root entity with a numeric id and no properties.
#[must_use]
pub fn root_entity(app: &str, kind: &str, id: i64) -> Entity {
    Entity::new(EntityKey::new(app, "", vec![PathElement::with_id(kind, id)]))
}

/// A root entity with an unassigned id, for exercising id assignment.
#[must_use]
pub fn incomplete_entity(app: &str, kind: &str) -> Entity {
    Entity::new(EntityKey::new(app, "", vec![PathElement::new(kind)]))
}

/// A named child under a numeric root.
#[must_use]
pub fn child_entity(app: &str, root_kind: &str, root_id: i64, kind: &str, name: &str) -> Entity {
    Entity::new(EntityKey::new(
        app,
        "",
        vec![
            PathElement::with_id(root_kind, root_id),
            PathElement::with_name(kind, name),
        ],
    ))
}

/// A root entity carrying one integer property.
#[must_use]
pub fn int_entity(app: &str, kind: &str, id: i64, property: &str, value: i64) -> Entity {
    let mut entity = root_entity(app, kind, id);
    entity.set_property(property, PropertyValue::Int(value));
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_wires_shared_collaborators() {
        let fx = ServiceFixture::new();
        fx.service
            .engine()
            .put_entities("a1", vec![int_entity("a1", "Foo", 1, "n", 5)], None)
            .unwrap();
        // The fixture's handle sees the service's writes.
        assert!(fx.tables.table_count() > 0);
    }

    #[test]
    fn builders_produce_resolvable_keys() {
        assert!(root_entity("a1", "Foo", 1).key.row_key().is_some());
        assert!(incomplete_entity("a1", "Foo").key.row_key().is_none());
        let child = child_entity("a1", "Foo", 1, "Bar", "x");
        assert_eq!(child.key.root_key(), root_entity("a1", "Foo", 1).key.row_key());
    }
}
