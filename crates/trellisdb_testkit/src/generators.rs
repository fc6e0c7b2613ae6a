//! Property-based generators using proptest.

use proptest::prelude::*;
use trellisdb_codec::{Entity, EntityKey, PropertyValue};
use trellisdb_keys::PathElement;

/// Strategy for entity kinds.
pub fn kind_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{0,7}").expect("valid regex")
}

/// Strategy for key names, including all-digit names that must survive the
/// digit-name sentinel encoding.
pub fn key_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("valid regex"),
        prop::string::string_regex("[0-9]{1,12}").expect("valid regex"),
    ]
}

/// Strategy for assigned path elements.
pub fn path_element_strategy() -> impl Strategy<Value = PathElement> {
    (kind_strategy(), id_or_name()).prop_map(|(kind, id)| match id {
        IdOrName::Id(id) => PathElement::with_id(kind, id),
        IdOrName::Name(name) => PathElement::with_name(kind, name),
    })
}

#[derive(Debug, Clone)]
enum IdOrName {
    Id(i64),
    Name(String),
}

fn id_or_name() -> impl Strategy<Value = IdOrName> {
    prop_oneof![
        (1i64..1_000_000_000).prop_map(IdOrName::Id),
        key_name_strategy().prop_map(IdOrName::Name),
    ]
}

/// Strategy for ancestor paths of one to three assigned elements.
pub fn path_strategy() -> impl Strategy<Value = Vec<PathElement>> {
    prop::collection::vec(path_element_strategy(), 1..=3)
}

/// Strategy for property values across every type tag.
pub fn property_value_strategy() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        Just(PropertyValue::Null),
        any::<i64>().prop_map(PropertyValue::Int),
        any::<bool>().prop_map(PropertyValue::Bool),
        "[ -~]{0,24}".prop_map(PropertyValue::Text),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(PropertyValue::Bytes),
        (-1.0e9f64..1.0e9).prop_map(PropertyValue::Double),
        (-90.0f64..90.0, -180.0f64..180.0)
            .prop_map(|(lat, lng)| PropertyValue::Point { lat, lng }),
        path_strategy().prop_map(PropertyValue::Reference),
    ]
}

/// Strategy for complete entities under one app.
pub fn entity_strategy(app: &'static str) -> impl Strategy<Value = Entity> {
    (
        path_strategy(),
        prop::collection::btree_map(
            prop::string::string_regex("[a-z]{1,8}").expect("valid regex"),
            prop::collection::vec(property_value_strategy(), 1..=3),
            0..4,
        ),
    )
        .prop_map(move |(path, properties)| {
            let mut entity = Entity::new(EntityKey::new(app, "", path));
            entity.properties = properties;
            entity
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;
    use trellisdb_codec::{decode_entity, encode_entity};

    proptest! {
        #[test]
        fn generated_paths_resolve_to_row_keys(path in path_strategy()) {
            let key = EntityKey::new("a1", "", path);
            prop_assert!(key.row_key().is_some());
            prop_assert!(key.root_key().is_some());
        }

        #[test]
        fn generated_entities_survive_the_codec(entity in entity_strategy("a1")) {
            let decoded = decode_entity(&encode_entity(&entity).unwrap()).unwrap();
            prop_assert_eq!(decoded.key, entity.key);
            prop_assert_eq!(decoded.properties.len(), entity.properties.len());
        }

        #[test]
        fn value_ordering_is_antisymmetric(
            a in property_value_strategy(),
            b in property_value_strategy(),
        ) {
            match a.cmp_typed(&b) {
                Ordering::Less => prop_assert_eq!(b.cmp_typed(&a), Ordering::Greater),
                Ordering::Greater => prop_assert_eq!(b.cmp_typed(&a), Ordering::Less),
                Ordering::Equal => prop_assert_eq!(b.cmp_typed(&a), Ordering::Equal),
            }
        }
    }
}
