//! # TrellisDB Codec
//!
//! The decoded entity model and its CBOR wire/storage encoding.
//!
//! The proxy stores entities as opaque byte values in backend tables; this
//! crate owns that byte format. It also defines the typed property values
//! queries compare and sort by: values of different types order by a fixed
//! type tag, values of the same type compare natively.
//!
//! ## Example
//!
//! ```rust
//! use trellisdb_codec::{decode_entity, encode_entity, Entity, EntityKey, PropertyValue};
//! use trellisdb_keys::PathElement;
//!
//! let key = EntityKey::new("a1", "", vec![PathElement::with_id("Foo", 1)]);
//! let mut entity = Entity::new(key);
//! entity.set_property("name", PropertyValue::Text("alpha".into()));
//!
//! let bytes = encode_entity(&entity).unwrap();
//! assert_eq!(decode_entity(&bytes).unwrap(), entity);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod query;
mod value;

pub use entity::{Entity, EntityKey};
pub use error::{CodecError, CodecResult};
pub use query::{
    FilterOp, OrderDirection, PropertyFilter, PropertyOrder, KEY_PROPERTY,
};
pub use value::PropertyValue;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes any serde value to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::into_writer(value, &mut out).map_err(|e| CodecError::encode(e.to_string()))?;
    Ok(out)
}

/// Decodes any serde value from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::decode(e.to_string()))
}

/// Encodes an entity into its stored byte form.
pub fn encode_entity(entity: &Entity) -> CodecResult<Vec<u8>> {
    to_cbor(entity)
}

/// Decodes an entity from its stored byte form.
///
/// Failure here means the stored row is corrupt; callers surface it as an
/// internal error, never as not-found.
pub fn decode_entity(bytes: &[u8]) -> CodecResult<Entity> {
    from_cbor(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellisdb_keys::PathElement;

    #[test]
    fn entity_round_trip() {
        let key = EntityKey::new("a1", "ns", vec![PathElement::with_name("Foo", "x")]);
        let mut entity = Entity::new(key);
        entity.set_property("n", PropertyValue::Int(3));
        entity.push_property("tags", PropertyValue::Text("a".into()));
        entity.push_property("tags", PropertyValue::Text("b".into()));

        let bytes = encode_entity(&entity).unwrap();
        assert_eq!(decode_entity(&bytes).unwrap(), entity);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(decode_entity(b"definitely not cbor").is_err());
    }
}
