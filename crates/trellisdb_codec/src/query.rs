//! Query predicate model: property filters and orderings.
//!
//! These are pure data types shared by the RPC messages and the engine's
//! in-memory query execution. Comparison semantics live on
//! [`PropertyValue`](crate::PropertyValue) (`cmp_typed`).

use crate::value::PropertyValue;
use serde::{Deserialize, Serialize};

/// Comparison operator of a property filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    /// Property value strictly less than the filter value.
    LessThan,
    /// Property value less than or equal to the filter value.
    LessThanOrEqual,
    /// Property value strictly greater than the filter value.
    GreaterThan,
    /// Property value greater than or equal to the filter value.
    GreaterThanOrEqual,
    /// Property value equal to the filter value.
    Equal,
}

/// One property filter. A multi-valued property passes when any of its
/// values satisfies the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// Property name.
    pub name: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Value compared against.
    pub value: PropertyValue,
}

impl PropertyFilter {
    /// Creates a filter.
    #[must_use]
    pub fn new(name: impl Into<String>, op: FilterOp, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            op,
            value,
        }
    }

    /// Returns true when `values` (one property's values) pass the filter.
    #[must_use]
    pub fn passes(&self, values: &[PropertyValue]) -> bool {
        values.iter().any(|v| {
            let ord = v.cmp_typed(&self.value);
            match self.op {
                FilterOp::LessThan => ord.is_lt(),
                FilterOp::LessThanOrEqual => ord.is_le(),
                FilterOp::GreaterThan => ord.is_gt(),
                FilterOp::GreaterThanOrEqual => ord.is_ge(),
                FilterOp::Equal => ord.is_eq(),
            }
        })
    }
}

/// Sort direction of a query ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending.
    Ascending,
    /// Descending.
    Descending,
}

/// One sort key of a query. The reserved name `__key__` orders by entity
/// key and is handled by the final key tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOrder {
    /// Property name, or `__key__`.
    pub name: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl PropertyOrder {
    /// Creates an ascending order on a property.
    #[must_use]
    pub fn ascending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: OrderDirection::Ascending,
        }
    }

    /// Creates a descending order on a property.
    #[must_use]
    pub fn descending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: OrderDirection::Descending,
        }
    }
}

/// Reserved order property meaning "the entity key itself".
pub const KEY_PROPERTY: &str = "__key__";
