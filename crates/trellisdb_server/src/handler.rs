//! Request handlers for the datastore methods.

use crate::caller::CallerContext;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use trellisdb_codec::{from_cbor, to_cbor, EntityKey};
use trellisdb_coord::Coordinator;
use trellisdb_core::{AllocateMode, GroupStore, QuerySpec};
use trellisdb_proto::{
    AllocateIdsRequest, AllocateIdsResponse, AllocateSpan, DeleteRequest, ErrorCode, GetRequest,
    GetResponse, IndexRequest, IndexResponse, PutRequest, PutResponse, Query, QueryResult,
    RpcRequest, RpcResponse, TransactionRef, VoidResponse,
};

/// The datastore service: the storage engine, the coordination client, and
/// the configuration, built once and shared across every request.
pub struct DatastoreService {
    engine: GroupStore,
    coord: Arc<dyn Coordinator>,
    config: ServerConfig,
}

impl DatastoreService {
    /// Creates a service with default configuration.
    #[must_use]
    pub fn new(
        tables: Arc<dyn trellisdb_tables::TableStore>,
        coord: Arc<dyn Coordinator>,
    ) -> Self {
        Self::with_config(tables, coord, ServerConfig::new())
    }

    /// Creates a service with explicit configuration.
    #[must_use]
    pub fn with_config(
        tables: Arc<dyn trellisdb_tables::TableStore>,
        coord: Arc<dyn Coordinator>,
        config: ServerConfig,
    ) -> Self {
        Self {
            engine: GroupStore::with_config(tables, coord.clone(), config.engine.clone()),
            coord,
            config,
        }
    }

    /// The underlying storage engine.
    #[must_use]
    pub fn engine(&self) -> &GroupStore {
        &self.engine
    }

    /// Decodes an envelope, routes it to its handler, and encodes the
    /// outcome. Never fails; every error becomes a response envelope.
    pub fn dispatch(&self, ctx: &CallerContext, request: &RpcRequest) -> RpcResponse {
        debug!(app = %ctx.app_id, method = %request.method, "dispatching request");
        let body = &request.body;
        match request.method.as_str() {
            "Put" => respond(parse(body).and_then(|req| self.put(ctx, req))),
            "Get" => respond(parse(body).and_then(|req| self.get(ctx, req))),
            "Delete" => respond(parse(body).and_then(|req| self.delete(ctx, req))),
            "RunQuery" => respond(parse(body).and_then(|req| self.run_query(ctx, req))),
            "BeginTransaction" => respond(self.begin_transaction(ctx)),
            "Commit" => respond(parse(body).and_then(|req| self.commit(ctx, req))),
            "Rollback" => respond(parse(body).and_then(|req| self.rollback(ctx, req))),
            "AllocateIds" => respond(parse(body).and_then(|req| self.allocate_ids(ctx, req))),
            "CreateIndex" => respond(parse(body).and_then(|req| self.create_index(ctx, req))),
            "UpdateIndex" => respond(parse(body).and_then(|req| self.update_index(ctx, req))),
            "DeleteIndex" => respond(parse(body).and_then(|req| self.delete_index(ctx, req))),
            "GetIndices" => respond(self.get_indices(ctx)),
            other => respond::<VoidResponse>(Err(ServerError::UnknownMethod(other.to_string()))),
        }
    }

    /// Handles a put.
    pub fn put(&self, ctx: &CallerContext, mut request: PutRequest) -> ServerResult<PutResponse> {
        self.check_batch(request.entities.len())?;
        if let Some(handle) = request.transaction {
            if !request.entities.is_empty() {
                // Incomplete keys get their ids before the group root is
                // derived, so transactional auto-id puts work.
                self.engine.assign_keys(&ctx.app_id, &mut request.entities)?;
                let root = shared_root(&ctx.app_id, request.entities.iter().map(|e| &e.key))?;
                self.coord.acquire_lock(&ctx.app_id, handle, &root)?;
            }
        }
        let keys = self
            .engine
            .put_entities(&ctx.app_id, request.entities, request.transaction)?;
        Ok(PutResponse { keys })
    }

    /// Handles a get.
    pub fn get(&self, ctx: &CallerContext, request: GetRequest) -> ServerResult<GetResponse> {
        self.check_batch(request.keys.len())?;
        if let Some(handle) = request.transaction {
            if !request.keys.is_empty() {
                let root = shared_root(&ctx.app_id, request.keys.iter())?;
                self.coord.acquire_lock(&ctx.app_id, handle, &root)?;
            }
        }
        let entities = self.engine.get_entities(&ctx.app_id, request.keys)?;
        Ok(GetResponse { entities })
    }

    /// Handles a delete.
    pub fn delete(&self, ctx: &CallerContext, request: DeleteRequest) -> ServerResult<VoidResponse> {
        self.check_batch(request.keys.len())?;
        if let Some(handle) = request.transaction {
            if !request.keys.is_empty() {
                let root = shared_root(&ctx.app_id, request.keys.iter())?;
                self.coord.acquire_lock(&ctx.app_id, handle, &root)?;
            }
        }
        self.engine
            .delete_entities(&ctx.app_id, request.keys, request.transaction)?;
        Ok(VoidResponse::default())
    }

    /// Handles a query.
    pub fn run_query(&self, ctx: &CallerContext, query: Query) -> ServerResult<QueryResult> {
        if let Some(handle) = query.transaction {
            let ancestor = query.ancestor.as_ref().ok_or_else(|| {
                ServerError::InvalidRequest("transactional queries require an ancestor".to_string())
            })?;
            let root = trellisdb_keys::root_key(&ctx.app_id, ancestor).ok_or_else(|| {
                ServerError::InvalidRequest("query ancestor root has no assigned id".to_string())
            })?;
            self.coord.acquire_lock(&ctx.app_id, handle, &root)?;
        }
        let spec = QuerySpec {
            namespace: query.namespace,
            kind: query.kind,
            ancestor: query.ancestor,
            filters: query.filters,
            orders: query.orders,
        };
        let results = self.engine.run_query(&ctx.app_id, &spec)?;
        Ok(QueryResult {
            results,
            more_results: false,
        })
    }

    /// Opens a transaction.
    pub fn begin_transaction(&self, ctx: &CallerContext) -> ServerResult<TransactionRef> {
        let handle = self.coord.begin_transaction(&ctx.app_id)?;
        Ok(TransactionRef::new(&ctx.app_id, handle))
    }

    /// Commits a transaction. The writes themselves are already durable,
    /// so a failure here is internal, not retriable by the caller.
    pub fn commit(&self, ctx: &CallerContext, txn: TransactionRef) -> ServerResult<VoidResponse> {
        self.check_app(ctx, &txn)?;
        self.coord
            .release_lock(&ctx.app_id, txn.handle)
            .map_err(ServerError::CommitFailed)?;
        Ok(VoidResponse::default())
    }

    /// Rolls a transaction back. A failure means the transaction's writes
    /// may still become visible, which the caller must hear about.
    pub fn rollback(&self, ctx: &CallerContext, txn: TransactionRef) -> ServerResult<VoidResponse> {
        self.check_app(ctx, &txn)?;
        self.coord
            .notify_failed_transaction(&ctx.app_id, txn.handle)
            .map_err(ServerError::RollbackFailed)?;
        Ok(VoidResponse::default())
    }

    /// Reserves an id range for the model key's sequence scope.
    pub fn allocate_ids(
        &self,
        ctx: &CallerContext,
        request: AllocateIdsRequest,
    ) -> ServerResult<AllocateIdsResponse> {
        // An assigned root element scopes the reservation to that entity
        // group, an incomplete one to the app-wide sequence.
        let root = trellisdb_keys::root_key(&ctx.app_id, &request.model_key.path);
        let mode = match request.span {
            AllocateSpan::Size(size) => AllocateMode::Size(size),
            AllocateSpan::Max(ceiling) => AllocateMode::Max(ceiling),
        };
        let range = self
            .engine
            .allocate_id_range(&ctx.app_id, root.as_deref(), mode)?;
        Ok(AllocateIdsResponse {
            start: range.start,
            end: range.end,
        })
    }

    /// Acknowledges an index creation without maintaining one.
    pub fn create_index(
        &self,
        ctx: &CallerContext,
        _request: IndexRequest,
    ) -> ServerResult<IndexResponse> {
        debug!(app = %ctx.app_id, "index creation acknowledged, not maintained");
        Ok(IndexResponse::default())
    }

    /// Acknowledges an index update without maintaining one.
    pub fn update_index(
        &self,
        _ctx: &CallerContext,
        _request: IndexRequest,
    ) -> ServerResult<VoidResponse> {
        Ok(VoidResponse::default())
    }

    /// Acknowledges an index deletion without maintaining one.
    pub fn delete_index(
        &self,
        _ctx: &CallerContext,
        _request: IndexRequest,
    ) -> ServerResult<VoidResponse> {
        Ok(VoidResponse::default())
    }

    /// Reports the (empty) set of maintained indexes.
    pub fn get_indices(&self, _ctx: &CallerContext) -> ServerResult<IndexResponse> {
        Ok(IndexResponse::default())
    }

    fn check_batch(&self, len: usize) -> ServerResult<()> {
        if len > self.config.max_batch_size {
            return Err(ServerError::InvalidRequest(format!(
                "batch of {len} exceeds limit {}",
                self.config.max_batch_size
            )));
        }
        Ok(())
    }

    fn check_app(&self, ctx: &CallerContext, txn: &TransactionRef) -> ServerResult<()> {
        if txn.app != ctx.app_id {
            return Err(ServerError::InvalidRequest(format!(
                "transaction belongs to app '{}', caller is '{}'",
                txn.app, ctx.app_id
            )));
        }
        Ok(())
    }
}

/// The single entity-group root a transactional batch operates on.
fn shared_root<'a>(
    app: &str,
    keys: impl Iterator<Item = &'a EntityKey>,
) -> ServerResult<String> {
    let mut shared: Option<String> = None;
    for key in keys {
        let root = trellisdb_keys::root_key(app, &key.path).ok_or_else(|| {
            ServerError::InvalidRequest(
                "entity group root must be assigned inside a transaction".to_string(),
            )
        })?;
        match &shared {
            None => shared = Some(root),
            Some(existing) if *existing == root => {}
            Some(existing) => {
                return Err(ServerError::InvalidRequest(format!(
                    "transaction spans entity groups '{existing}' and '{root}'"
                )))
            }
        }
    }
    shared.ok_or_else(|| ServerError::InvalidRequest("empty transactional batch".to_string()))
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> ServerResult<T> {
    from_cbor(body).map_err(|err| ServerError::InvalidRequest(format!("malformed body: {err}")))
}

fn respond<T: Serialize>(result: ServerResult<T>) -> RpcResponse {
    match result {
        Ok(message) => match to_cbor(&message) {
            Ok(body) => RpcResponse::ok(body),
            Err(err) => RpcResponse::failure(ErrorCode::InternalError, err.to_string()),
        },
        Err(err) => RpcResponse::failure(err.error_code(), err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellisdb_codec::{Entity, PropertyValue};
    use trellisdb_coord::LocalCoordinator;
    use trellisdb_keys::PathElement;
    use trellisdb_tables::MemoryTables;

    const APP: &str = "a1";

    fn service() -> DatastoreService {
        DatastoreService::new(
            Arc::new(MemoryTables::new()),
            Arc::new(LocalCoordinator::new()),
        )
    }

    fn ctx() -> CallerContext {
        CallerContext::new(APP)
    }

    fn foo(id: i64, n: i64) -> Entity {
        let key = EntityKey::new(APP, "", vec![PathElement::with_id("Foo", id)]);
        let mut entity = Entity::new(key);
        entity.set_property("n", PropertyValue::Int(n));
        entity
    }

    fn call(service: &DatastoreService, method: &str, body: Vec<u8>) -> RpcResponse {
        service.dispatch(&ctx(), &RpcRequest::new(method, body))
    }

    #[test]
    fn put_and_get_through_the_envelope() {
        let service = service();
        let put = PutRequest::new(vec![foo(1, 7)]);
        let response = call(&service, "Put", put.encode().unwrap());
        assert!(response.error.is_none());
        let keys = PutResponse::decode(&response.body).unwrap().keys;

        let get = GetRequest::new(keys);
        let response = call(&service, "Get", get.encode().unwrap());
        let entities = GetResponse::decode(&response.body).unwrap().entities;
        assert_eq!(
            entities[0].as_ref().unwrap().property("n"),
            &[PropertyValue::Int(7)]
        );
    }

    #[test]
    fn unknown_method_is_bad_request() {
        let response = call(&service(), "Frobnicate", vec![]);
        assert_eq!(response.error.unwrap().code, ErrorCode::BadRequest);
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let response = call(&service(), "Put", vec![0xff, 0x00]);
        assert_eq!(response.error.unwrap().code, ErrorCode::BadRequest);
    }

    #[test]
    fn transaction_lifecycle_commit() {
        let service = service();
        let txn = service.begin_transaction(&ctx()).unwrap();
        service
            .put(&ctx(), PutRequest::in_transaction(vec![foo(1, 1)], txn.handle))
            .unwrap();
        service.commit(&ctx(), txn).unwrap();

        let fetched = service
            .get(&ctx(), GetRequest::new(vec![foo(1, 1).key]))
            .unwrap();
        assert!(fetched.entities[0].is_some());
    }

    #[test]
    fn transactional_put_assigns_incomplete_root_keys() {
        let service = service();
        let entity = Entity::new(EntityKey::new(APP, "", vec![PathElement::new("Foo")]));

        let txn = service.begin_transaction(&ctx()).unwrap();
        let put = service
            .put(&ctx(), PutRequest::in_transaction(vec![entity], txn.handle))
            .unwrap();
        assert_eq!(put.keys[0].path[0], PathElement::with_id("Foo", 1));
        service.commit(&ctx(), txn).unwrap();

        let fetched = service
            .get(&ctx(), GetRequest::new(vec![put.keys[0].clone()]))
            .unwrap();
        assert!(fetched.entities[0].is_some());
    }

    #[test]
    fn transaction_lifecycle_rollback() {
        let service = service();
        service.put(&ctx(), PutRequest::new(vec![foo(1, 1)])).unwrap();

        let txn = service.begin_transaction(&ctx()).unwrap();
        service
            .put(&ctx(), PutRequest::in_transaction(vec![foo(1, 2)], txn.handle))
            .unwrap();
        service.rollback(&ctx(), txn).unwrap();

        let fetched = service
            .get(&ctx(), GetRequest::new(vec![foo(1, 1).key]))
            .unwrap();
        assert_eq!(
            fetched.entities[0].as_ref().unwrap().property("n"),
            &[PropertyValue::Int(1)]
        );
    }

    #[test]
    fn cross_group_transactional_batch_is_rejected() {
        let service = service();
        let txn = service.begin_transaction(&ctx()).unwrap();
        let err = service
            .put(
                &ctx(),
                PutRequest::in_transaction(vec![foo(1, 1), foo(2, 2)], txn.handle),
            )
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::BadRequest);
    }

    #[test]
    fn contended_group_reports_concurrent_transaction() {
        let service = service();
        let holder = service.begin_transaction(&ctx()).unwrap();
        service
            .put(&ctx(), PutRequest::in_transaction(vec![foo(1, 1)], holder.handle))
            .unwrap();

        let rival = service.begin_transaction(&ctx()).unwrap();
        let err = service
            .put(&ctx(), PutRequest::in_transaction(vec![foo(1, 2)], rival.handle))
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::ConcurrentTransaction);
    }

    #[test]
    fn transactional_query_requires_ancestor() {
        let service = service();
        let txn = service.begin_transaction(&ctx()).unwrap();
        let mut query = Query::for_kind("Foo");
        query.transaction = Some(txn.handle);
        let err = service.run_query(&ctx(), query).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::BadRequest);
    }

    #[test]
    fn transactional_ancestor_query_runs_under_the_lock() {
        let service = service();
        service.put(&ctx(), PutRequest::new(vec![foo(1, 1)])).unwrap();

        let txn = service.begin_transaction(&ctx()).unwrap();
        let mut query = Query::for_kind("Foo");
        query.ancestor = Some(vec![PathElement::with_id("Foo", 1)]);
        query.transaction = Some(txn.handle);
        let result = service.run_query(&ctx(), query).unwrap();
        assert_eq!(result.results.len(), 1);

        // The query took the group lock for the transaction.
        let rival = service.begin_transaction(&ctx()).unwrap();
        let err = service
            .put(&ctx(), PutRequest::in_transaction(vec![foo(1, 2)], rival.handle))
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::ConcurrentTransaction);
    }

    #[test]
    fn allocate_ids_size_and_max() {
        let service = service();
        let model_key = EntityKey::new(APP, "", vec![PathElement::new("Foo")]);

        let sized = service
            .allocate_ids(
                &ctx(),
                AllocateIdsRequest {
                    model_key: model_key.clone(),
                    span: AllocateSpan::Size(120),
                },
            )
            .unwrap();
        assert_eq!(sized.end - sized.start + 1, 120);

        let advanced = service
            .allocate_ids(
                &ctx(),
                AllocateIdsRequest {
                    model_key,
                    span: AllocateSpan::Max(sized.end + 10),
                },
            )
            .unwrap();
        assert!(advanced.end > sized.end + 10);
    }

    #[test]
    fn batch_limit_is_enforced() {
        let service = DatastoreService::with_config(
            Arc::new(MemoryTables::new()),
            Arc::new(LocalCoordinator::new()),
            ServerConfig::new().with_max_batch_size(1),
        );
        let err = service
            .put(&ctx(), PutRequest::new(vec![foo(1, 1), foo(2, 2)]))
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::BadRequest);
    }

    #[test]
    fn commit_for_another_app_is_rejected() {
        let service = service();
        let txn = service.begin_transaction(&ctx()).unwrap();
        let foreign = CallerContext::new("a2");
        let err = service.commit(&foreign, txn).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::BadRequest);
    }

    #[test]
    fn index_methods_are_acknowledged_no_ops() {
        let service = service();
        let created = service
            .create_index(&ctx(), IndexRequest::default())
            .unwrap();
        assert_eq!(created.id, 0);

        let listed = service.get_indices(&ctx()).unwrap();
        assert!(listed.definitions.is_empty());

        service
            .update_index(&ctx(), IndexRequest::default())
            .unwrap();
        service
            .delete_index(&ctx(), IndexRequest::default())
            .unwrap();
    }
}
