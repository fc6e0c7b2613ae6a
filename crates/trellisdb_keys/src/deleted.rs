//! The deleted-row sentinel encoding.
//!
//! Deletes are writes: the journal and head rows receive the sentinel value
//! `DELETED___/<row_key>` instead of an encoded entity. Embedding the row
//! key in the value lets a reader that only has the stored bytes recover
//! which row, and therefore which entity group, the tombstone belongs to.

use crate::path::{KeyError, KeyResult};

/// Prefix marking a stored value as a tombstone.
pub const DELETED_PREFIX: &str = "DELETED___";

/// Encodes the tombstone value written at both journal and head locations.
#[must_use]
pub fn deleted_value(row_key: &str) -> Vec<u8> {
    format!("{DELETED_PREFIX}/{row_key}").into_bytes()
}

/// Returns true when stored bytes carry the tombstone prefix.
#[must_use]
pub fn is_deleted(value: &[u8]) -> bool {
    value.starts_with(DELETED_PREFIX.as_bytes())
}

fn deleted_str(value: &[u8]) -> KeyResult<&str> {
    let text = std::str::from_utf8(value)
        .map_err(|_| KeyError::Malformed("tombstone is not utf-8".into()))?;
    if !text.starts_with(DELETED_PREFIX) {
        return Err(KeyError::Malformed("missing tombstone prefix".into()));
    }
    Ok(text)
}

/// Recovers the row key embedded in a tombstone value.
pub fn row_key_from_deleted(value: &[u8]) -> KeyResult<String> {
    let text = deleted_str(value)?;
    text.split_once('/')
        .map(|(_, rest)| rest.to_string())
        .ok_or_else(|| KeyError::Malformed("tombstone carries no row key".into()))
}

/// Recovers the entity-group (root) key embedded in a tombstone value.
///
/// Tombstone layout is `DELETED___/app/Kind:id[/...]`; the root key is the
/// `app/Kind:id` prefix.
pub fn root_key_from_deleted(value: &[u8]) -> KeyResult<String> {
    let text = deleted_str(value)?;
    let mut parts = text.split('/');
    let _prefix = parts.next();
    match (parts.next(), parts.next()) {
        (Some(app), Some(root)) if !app.is_empty() && !root.is_empty() => {
            Ok(format!("{app}/{root}"))
        }
        _ => Err(KeyError::Malformed("tombstone carries no root key".into())),
    }
}
