//! # TrellisDB Protocol
//!
//! RPC message types for the datastore service: one request/response pair
//! per method, an opaque `(method, body)` envelope, and the wire error
//! taxonomy. Everything serializes as CBOR through `trellisdb_codec`.
//!
//! The envelope is transport-agnostic; whatever carries it (a socket
//! framing layer, a test harness calling the dispatcher directly) only
//! needs to move bytes and the caller identity.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;

pub use error::{ErrorCode, RpcError};
pub use messages::{
    AllocateIdsRequest, AllocateIdsResponse, AllocateSpan, DeleteRequest, GetRequest, GetResponse,
    IndexRequest, IndexResponse, PutRequest, PutResponse, Query, QueryResult, RpcRequest,
    RpcResponse, TransactionRef, VoidResponse,
};
