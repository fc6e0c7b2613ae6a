//! In-memory query evaluation: scan, filter, sort.
//!
//! Queries are never pushed down to the backend. The engine fetches every
//! row of the candidate kind tables, resolves each through the same
//! validity/journal logic as Get, and this module filters and orders the
//! decoded survivors.

use std::cmp::Ordering;
use trellisdb_codec::{
    Entity, OrderDirection, PropertyFilter, PropertyOrder, PropertyValue, KEY_PROPERTY,
};
use trellisdb_keys::PathElement;

/// A decoded query: candidate kind, ancestor constraint, predicates,
/// orderings.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Namespace scanned; empty string is the default namespace.
    pub namespace: String,
    /// Kind to scan, or `None` for a kindless query over every catalogued
    /// kind.
    pub kind: Option<String>,
    /// Ancestor path prefix results must sit under.
    pub ancestor: Option<Vec<PathElement>>,
    /// Property predicates, all of which must pass.
    pub filters: Vec<PropertyFilter>,
    /// Sort keys, applied in order with a final tie-break by entity key.
    pub orders: Vec<PropertyOrder>,
}

impl QuerySpec {
    /// Creates a query over one kind in the default namespace.
    #[must_use]
    pub fn for_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Returns true when the entity survives ancestor and property
    /// predicates and carries every ordered property.
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        if let Some(ancestor) = &self.ancestor {
            if !entity.key.has_ancestor(ancestor) {
                return false;
            }
        }
        if !self
            .filters
            .iter()
            .all(|f| f.passes(entity.property(&f.name)))
        {
            return false;
        }
        // Entities missing an ordered property drop out of the result set.
        self.orders
            .iter()
            .filter(|o| o.name != KEY_PROPERTY)
            .all(|o| !entity.property(&o.name).is_empty())
    }

    /// Sorts matched entities by the query's orderings.
    pub fn sort(&self, results: &mut [Entity]) {
        results.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        for order in &self.orders {
            if order.name == KEY_PROPERTY {
                continue;
            }
            let (Some(va), Some(vb)) = (order_value(a, order), order_value(b, order)) else {
                continue;
            };
            let mut ord = va.cmp_typed(vb);
            if order.direction == OrderDirection::Descending {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.key.row_key().cmp(&b.key.row_key())
    }
}

/// Representative value of a multi-valued property under one ordering:
/// the smallest value for ascending sorts, the largest for descending.
fn order_value<'a>(entity: &'a Entity, order: &PropertyOrder) -> Option<&'a PropertyValue> {
    let values = entity.property(&order.name);
    match order.direction {
        OrderDirection::Ascending => values.iter().min_by(|a, b| a.cmp_typed(b)),
        OrderDirection::Descending => values.iter().max_by(|a, b| a.cmp_typed(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellisdb_codec::{EntityKey, FilterOp};

    fn entity(id: i64, props: &[(&str, PropertyValue)]) -> Entity {
        let key = EntityKey::new("a1", "", vec![PathElement::with_id("Foo", id)]);
        let mut e = Entity::new(key);
        for (name, value) in props {
            e.push_property(*name, value.clone());
        }
        e
    }

    #[test]
    fn filters_are_conjunctive() {
        let mut spec = QuerySpec::for_kind("Foo");
        spec.filters = vec![
            PropertyFilter::new("n", FilterOp::GreaterThan, PropertyValue::Int(1)),
            PropertyFilter::new("n", FilterOp::LessThan, PropertyValue::Int(5)),
        ];
        assert!(spec.matches(&entity(1, &[("n", PropertyValue::Int(3))])));
        assert!(!spec.matches(&entity(2, &[("n", PropertyValue::Int(7))])));
    }

    #[test]
    fn ancestor_prefix_filters() {
        let mut spec = QuerySpec::for_kind("Bar");
        spec.ancestor = Some(vec![PathElement::with_id("Foo", 1)]);
        let child = Entity::new(EntityKey::new(
            "a1",
            "",
            vec![
                PathElement::with_id("Foo", 1),
                PathElement::with_name("Bar", "x"),
            ],
        ));
        let stranger = entity(2, &[]);
        assert!(spec.matches(&child));
        assert!(!spec.matches(&stranger));
    }

    #[test]
    fn entities_missing_an_ordered_property_drop_out() {
        let mut spec = QuerySpec::for_kind("Foo");
        spec.orders = vec![PropertyOrder::ascending("n")];
        assert!(spec.matches(&entity(1, &[("n", PropertyValue::Int(1))])));
        assert!(!spec.matches(&entity(2, &[])));
    }

    #[test]
    fn key_order_applies_as_final_tie_break() {
        let mut spec = QuerySpec::for_kind("Foo");
        spec.orders = vec![PropertyOrder::ascending("n")];
        let mut results = vec![
            entity(2, &[("n", PropertyValue::Int(1))]),
            entity(1, &[("n", PropertyValue::Int(1))]),
        ];
        spec.sort(&mut results);
        let ids: Vec<String> = results.iter().map(|e| e.key.path[0].to_string()).collect();
        assert_eq!(ids, ["Foo:1", "Foo:2"]);
    }

    #[test]
    fn descending_order_reverses() {
        let mut spec = QuerySpec::for_kind("Foo");
        spec.orders = vec![PropertyOrder::descending("n")];
        let mut results = vec![
            entity(1, &[("n", PropertyValue::Int(1))]),
            entity(2, &[("n", PropertyValue::Int(9))]),
        ];
        spec.sort(&mut results);
        assert_eq!(results[0].property("n"), &[PropertyValue::Int(9)]);
    }

    #[test]
    fn multi_valued_sorts_use_direction_extreme() {
        let mut spec = QuerySpec::for_kind("Foo");
        spec.orders = vec![PropertyOrder::ascending("n")];
        // [1, 9] sorts by 1 ascending, so it lands before [5].
        let mut results = vec![
            entity(1, &[("n", PropertyValue::Int(5))]),
            entity(
                2,
                &[("n", PropertyValue::Int(9)), ("n", PropertyValue::Int(1))],
            ),
        ];
        spec.sort(&mut results);
        assert_eq!(results[0].key.path[0].to_string(), "Foo:2");
    }

    #[test]
    fn mixed_type_ordering_uses_type_tags() {
        let mut spec = QuerySpec::for_kind("Foo");
        spec.orders = vec![PropertyOrder::ascending("n")];
        let mut results = vec![
            entity(1, &[("n", PropertyValue::Text("a".into()))]),
            entity(2, &[("n", PropertyValue::Int(1_000_000))]),
        ];
        spec.sort(&mut results);
        // Ints carry a lower type tag than text, whatever the values.
        assert_eq!(results[0].key.path[0].to_string(), "Foo:2");
    }
}
