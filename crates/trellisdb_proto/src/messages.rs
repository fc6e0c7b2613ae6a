//! RPC request and response messages.

use crate::error::{ErrorCode, RpcError};
use serde::{Deserialize, Serialize};
use trellisdb_codec::{
    from_cbor, to_cbor, CodecResult, Entity, EntityKey, PropertyFilter, PropertyOrder,
};
use trellisdb_keys::PathElement;

/// Implements the CBOR wire codec for a message type.
macro_rules! wire_codec {
    ($($message:ty),+ $(,)?) => {
        $(impl $message {
            /// Encodes to CBOR.
            pub fn encode(&self) -> CodecResult<Vec<u8>> {
                to_cbor(self)
            }

            /// Decodes from CBOR.
            pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
                from_cbor(bytes)
            }
        })+
    };
}

/// The transport envelope: a method name and an opaque message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Method name (`"Put"`, `"RunQuery"`, ...).
    pub method: String,
    /// CBOR-encoded request message.
    pub body: Vec<u8>,
}

impl RpcRequest {
    /// Wraps an encoded body under a method name.
    pub fn new(method: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: method.into(),
            body,
        }
    }
}

/// The response envelope: a body on success, an error otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// CBOR-encoded response message; empty when `error` is set.
    pub body: Vec<u8>,
    /// Error, when the request failed.
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Creates a success envelope.
    #[must_use]
    pub fn ok(body: Vec<u8>) -> Self {
        Self { body, error: None }
    }

    /// Creates a failure envelope.
    pub fn failure(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            body: Vec::new(),
            error: Some(RpcError::new(code, detail)),
        }
    }
}

/// An open transaction, as callers refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRef {
    /// Owning application id.
    pub app: String,
    /// Coordinator-issued handle.
    pub handle: i64,
}

impl TransactionRef {
    /// Creates a transaction reference.
    pub fn new(app: impl Into<String>, handle: i64) -> Self {
        Self {
            app: app.into(),
            handle,
        }
    }
}

/// An empty message, for methods with nothing to say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoidResponse {}

/// Write a batch of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutRequest {
    /// Entities to write; incomplete keys get ids assigned.
    pub entities: Vec<Entity>,
    /// Explicit transaction handle, if the write is transactional.
    pub transaction: Option<i64>,
}

impl PutRequest {
    /// Creates a non-transactional put.
    #[must_use]
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            transaction: None,
        }
    }

    /// Creates a put inside an open transaction.
    #[must_use]
    pub fn in_transaction(entities: Vec<Entity>, handle: i64) -> Self {
        Self {
            entities,
            transaction: Some(handle),
        }
    }
}

/// Finalized keys of a put, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutResponse {
    /// Written keys with every id assigned.
    pub keys: Vec<EntityKey>,
}

/// Read entities by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRequest {
    /// Keys to read.
    pub keys: Vec<EntityKey>,
    /// Explicit transaction handle, if the read is transactional.
    pub transaction: Option<i64>,
}

impl GetRequest {
    /// Creates a non-transactional get.
    #[must_use]
    pub fn new(keys: Vec<EntityKey>) -> Self {
        Self {
            keys,
            transaction: None,
        }
    }

    /// Creates a get inside an open transaction.
    #[must_use]
    pub fn in_transaction(keys: Vec<EntityKey>, handle: i64) -> Self {
        Self {
            keys,
            transaction: Some(handle),
        }
    }
}

/// Entities for a get, in key order; `None` for absent keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    /// One slot per requested key.
    pub entities: Vec<Option<Entity>>,
}

/// Delete entities by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Keys to delete.
    pub keys: Vec<EntityKey>,
    /// Explicit transaction handle, if the delete is transactional.
    pub transaction: Option<i64>,
}

impl DeleteRequest {
    /// Creates a non-transactional delete.
    #[must_use]
    pub fn new(keys: Vec<EntityKey>) -> Self {
        Self {
            keys,
            transaction: None,
        }
    }

    /// Creates a delete inside an open transaction.
    #[must_use]
    pub fn in_transaction(keys: Vec<EntityKey>, handle: i64) -> Self {
        Self {
            keys,
            transaction: Some(handle),
        }
    }
}

/// A datastore query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    /// Namespace to search; empty string is the default namespace.
    pub namespace: String,
    /// Kind to search, or `None` for a kindless query.
    pub kind: Option<String>,
    /// Ancestor path results must sit under.
    pub ancestor: Option<Vec<PathElement>>,
    /// Property predicates.
    pub filters: Vec<PropertyFilter>,
    /// Sort orders.
    pub orders: Vec<PropertyOrder>,
    /// Explicit transaction handle. Transactional queries must carry an
    /// ancestor.
    pub transaction: Option<i64>,
}

impl Query {
    /// Creates a query over one kind in the default namespace.
    #[must_use]
    pub fn for_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }
}

/// Query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Matched entities in query order.
    pub results: Vec<Entity>,
    /// Whether the result set was truncated. Always false; queries run to
    /// completion, the field exists for callers that page.
    pub more_results: bool,
}

/// How an id reservation is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocateSpan {
    /// Reserve at least this many contiguous ids.
    Size(u64),
    /// Advance the sequence past this value.
    Max(i64),
}

/// Reserve a block of ids for a key's sequence scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocateIdsRequest {
    /// Key selecting the sequence: an assigned root element scopes the
    /// reservation to that entity group, otherwise the app-wide sequence
    /// is used.
    pub model_key: EntityKey,
    /// Reservation sizing.
    pub span: AllocateSpan,
}

/// A reserved id range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocateIdsResponse {
    /// First reserved id.
    pub start: i64,
    /// Last reserved id.
    pub end: i64,
}

/// An index-management call. Secondary indexes are not maintained, so the
/// definition is carried opaquely and acknowledged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexRequest {
    /// Index id, for update/delete calls.
    pub id: Option<i64>,
    /// Encoded index definition, for create/update calls.
    pub definition: Option<Vec<u8>>,
}

/// Acknowledgment of an index-management call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexResponse {
    /// Assigned index id (always 0).
    pub id: i64,
    /// Known index definitions (always empty).
    pub definitions: Vec<Vec<u8>>,
}

wire_codec!(
    RpcRequest,
    RpcResponse,
    TransactionRef,
    VoidResponse,
    PutRequest,
    PutResponse,
    GetRequest,
    GetResponse,
    DeleteRequest,
    Query,
    QueryResult,
    AllocateIdsRequest,
    AllocateIdsResponse,
    IndexRequest,
    IndexResponse,
);
