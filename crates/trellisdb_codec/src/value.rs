//! Typed property values and their query ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use trellisdb_keys::PathElement;

/// A single typed property value.
///
/// Ordering across types follows the fixed type-tag order of the upstream
/// datastore contract: values of different types compare by tag, values of
/// the same tag compare natively. Timestamps travel as `Int` microseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Absent / null value.
    Null,
    /// 64-bit integer (also timestamps and ratings).
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 text (also links, emails, categories).
    Text(String),
    /// Raw bytes (blobs, byte strings).
    Bytes(Vec<u8>),
    /// Double-precision float.
    Double(f64),
    /// Geographic point.
    Point {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lng: f64,
    },
    /// Reference to another entity by ancestor path.
    Reference(Vec<PathElement>),
}

impl PropertyValue {
    /// Returns the fixed cross-type ordering tag.
    #[must_use]
    pub fn type_tag(&self) -> u8 {
        match self {
            PropertyValue::Null => 0,
            PropertyValue::Int(_) => 1,
            PropertyValue::Bool(_) => 2,
            PropertyValue::Text(_) | PropertyValue::Bytes(_) => 3,
            PropertyValue::Double(_) => 4,
            PropertyValue::Point { .. } => 5,
            PropertyValue::Reference(_) => 7,
        }
    }

    /// Compares two values: same tag natively, different tags by tag.
    #[must_use]
    pub fn cmp_typed(&self, other: &Self) -> Ordering {
        let (ta, tb) = (self.type_tag(), other.type_tag());
        if ta != tb {
            return ta.cmp(&tb);
        }
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => Ordering::Equal,
            (PropertyValue::Int(a), PropertyValue::Int(b)) => a.cmp(b),
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a.cmp(b),
            (a, b) if ta == 3 => a.tag3_bytes().cmp(b.tag3_bytes()),
            (PropertyValue::Double(a), PropertyValue::Double(b)) => a.total_cmp(b),
            (
                PropertyValue::Point { lat: a1, lng: b1 },
                PropertyValue::Point { lat: a2, lng: b2 },
            ) => a1.total_cmp(a2).then_with(|| b1.total_cmp(b2)),
            (PropertyValue::Reference(a), PropertyValue::Reference(b)) => {
                let ka = a.iter().map(ToString::to_string).collect::<Vec<_>>();
                let kb = b.iter().map(ToString::to_string).collect::<Vec<_>>();
                ka.cmp(&kb)
            }
            // Unreachable: tags matched above.
            _ => Ordering::Equal,
        }
    }

    fn tag3_bytes(&self) -> &[u8] {
        match self {
            PropertyValue::Text(s) => s.as_bytes(),
            PropertyValue::Bytes(b) => b.as_slice(),
            _ => &[],
        }
    }
}
