//! Single-entity sync workflow
//!
//! One retryable orchestration unit per entity change, triggered by a
//! webhook or an internal mutation. Composes the adapter registry, the
//! link store, and the mutation sink into create/update/delete/merge
//! flows, releasing the advisory syncing flag on every exit path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use steeple_adapter::crud::CrudOp;
use steeple_adapter::envelope::flatten_record;
use steeple_adapter::error::AdapterError;
use steeple_adapter::registry::AdapterRegistry;
use steeple_adapter::traits::AdapterOperations;
use steeple_adapter::types::AdapterKind;

use crate::idempotency;
use crate::link::ExternalLink;
use crate::mutation::{Mutation, MutationSink};
use crate::retry;
use crate::store::ExternalLinkStore;

/// The operation a sync request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
    Merge,
}

impl SyncOperation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
            SyncOperation::Merge => "merge",
        }
    }
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A webhook- or mutation-driven request to sync one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Credential key identifying the org's adapter connection.
    pub token_key: String,

    /// Organization the entity belongs to.
    pub org_id: Uuid,

    /// Which adapter raised the change.
    pub adapter: AdapterKind,

    /// Canonical entity type, e.g. "Person".
    pub entity_type: String,

    /// The entity's id in the external system.
    pub entity_id: String,

    /// What to do.
    pub operation: SyncOperation,

    /// For merges: external ids of the records folded into this one.
    #[serde(default)]
    pub related_ids: Vec<String>,

    /// Payload supplied by the webhook, used when a fresh fetch fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_data: Option<Value>,

    /// Caller-supplied request id; part of the idempotency key.
    pub request_id: String,
}

impl SyncRequest {
    /// Deterministic dedup key for the durable executor.
    ///
    /// Derived purely from caller-supplied identifiers, never from the
    /// clock, so a retried request keys the same as the original.
    #[must_use]
    pub fn idempotency_key(&self) -> String {
        idempotency::derive_key(&[
            &self.token_key,
            self.adapter.as_str(),
            &self.entity_type,
            &self.entity_id,
            self.operation.as_str(),
            &self.request_id,
        ])
    }
}

/// Terminal workflow failure, after retries.
#[derive(Debug, Error)]
#[error("sync of {entity_type} '{entity_id}' failed (token {token_key}): {source}")]
pub struct WorkflowError {
    pub entity_type: String,
    pub entity_id: String,
    pub token_key: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// How a workflow run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Mutations were pushed downstream.
    Completed { ops_pushed: usize },

    /// Another run holds the syncing flag for this entity; nothing done.
    AlreadySyncing,
}

/// Orchestrator for single-entity sync runs.
pub struct EntitySyncWorkflow {
    registry: Arc<AdapterRegistry>,
    links: Arc<dyn ExternalLinkStore>,
    sink: Arc<dyn MutationSink>,
    max_attempts: u32,
    client_id: String,
}

impl EntitySyncWorkflow {
    /// Create a workflow over the given collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<AdapterRegistry>,
        links: Arc<dyn ExternalLinkStore>,
        sink: Arc<dyn MutationSink>,
    ) -> Self {
        Self {
            registry,
            links,
            sink,
            max_attempts: 3,
            client_id: "steeple-sync".to_string(),
        }
    }

    /// Override how many source-fetch attempts are made.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Override the client id stamped on outbound mutations.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Run one sync request to completion.
    #[instrument(
        skip(self, request),
        fields(
            adapter = %request.adapter,
            entity_type = %request.entity_type,
            entity_id = %request.entity_id,
            operation = %request.operation,
        )
    )]
    pub async fn run(&self, request: &SyncRequest) -> Result<WorkflowOutcome, WorkflowError> {
        info!(key = %request.idempotency_key(), "sync started");

        let linked = self
            .links
            .find_entity_by_external_id(request.org_id, request.adapter, &request.entity_id)
            .await
            .map_err(|e| self.fail(request, e))?
            .is_some();

        // Only linked entities carry the flag; first-time syncs create the
        // link further down.
        let locked = if linked {
            let acquired = self
                .links
                .begin_sync(request.org_id, request.adapter, &request.entity_id)
                .await
                .map_err(|e| self.fail(request, e))?;
            if !acquired {
                info!("entity already syncing, skipping");
                return Ok(WorkflowOutcome::AlreadySyncing);
            }
            true
        } else {
            false
        };

        let result = self.execute(request).await;

        // The flag must drop on every exit path, success or failure.
        if locked {
            if let Err(e) = self
                .links
                .finish_sync(request.org_id, request.adapter, &request.entity_id)
                .await
            {
                error!(error = %e, "failed to release syncing flag");
            }
        }

        match &result {
            Ok(WorkflowOutcome::Completed { ops_pushed }) => {
                info!(ops_pushed = *ops_pushed, "sync completed");
            }
            Ok(WorkflowOutcome::AlreadySyncing) => {}
            Err(e) => warn!(error = %e, "sync failed"),
        }
        result
    }

    async fn execute(&self, request: &SyncRequest) -> Result<WorkflowOutcome, WorkflowError> {
        match request.operation {
            SyncOperation::Create | SyncOperation::Update => self.push_upsert(request).await,
            SyncOperation::Delete => self.push_delete(request).await,
            SyncOperation::Merge => self.push_merge(request).await,
        }
    }

    async fn push_upsert(&self, request: &SyncRequest) -> Result<WorkflowOutcome, WorkflowError> {
        let adapter = self
            .registry
            .get(request.adapter)
            .map_err(|e| self.fail(request, e))?;

        let value = self
            .fetch_source(request, adapter.as_ref(), &request.entity_id)
            .await?;
        let table = self.table_for(adapter.as_ref(), request)?;
        let entity_id = self.resolve_entity_id(request, &request.entity_id).await?;

        debug!(%entity_id, "pushing upsert mutation");
        let mutation = Mutation::crud(
            &self.client_id,
            vec![CrudOp::upsert(table, entity_id, value)],
            Some(request.adapter),
        );
        self.sink
            .push(mutation)
            .await
            .map_err(|e| self.fail(request, e))?;

        Ok(WorkflowOutcome::Completed { ops_pushed: 1 })
    }

    async fn push_delete(&self, request: &SyncRequest) -> Result<WorkflowOutcome, WorkflowError> {
        let adapter = self
            .registry
            .get(request.adapter)
            .map_err(|e| self.fail(request, e))?;
        let table = self.table_for(adapter.as_ref(), request)?;

        // Deletes need no source fetch. Key by the linked canonical id,
        // or by the external id when the entity was never ingested.
        let target = self
            .links
            .find_entity_by_external_id(request.org_id, request.adapter, &request.entity_id)
            .await
            .map_err(|e| self.fail(request, e))?
            .unwrap_or_else(|| request.entity_id.clone());

        debug!(%target, "pushing delete mutation");
        let mutation = Mutation::crud(
            &self.client_id,
            vec![CrudOp::delete(table, target)],
            Some(request.adapter),
        );
        self.sink
            .push(mutation)
            .await
            .map_err(|e| self.fail(request, e))?;

        self.links
            .delete_link(
                request.org_id,
                request.adapter,
                &request.entity_id,
                Some(&self.client_id),
            )
            .await
            .map_err(|e| self.fail(request, e))?;

        Ok(WorkflowOutcome::Completed { ops_pushed: 1 })
    }

    async fn push_merge(&self, request: &SyncRequest) -> Result<WorkflowOutcome, WorkflowError> {
        let adapter = self
            .registry
            .get(request.adapter)
            .map_err(|e| self.fail(request, e))?;
        let removed_external = request.related_ids.first().ok_or_else(|| {
            self.fail(
                request,
                AdapterError::validation("merge requires a related id"),
            )
        })?;

        let value = self
            .fetch_source(request, adapter.as_ref(), &request.entity_id)
            .await?;
        let table = self.table_for(adapter.as_ref(), request)?;
        let kept_id = self.resolve_entity_id(request, &request.entity_id).await?;
        let removed_id = self
            .links
            .find_entity_by_external_id(request.org_id, request.adapter, removed_external)
            .await
            .map_err(|e| self.fail(request, e))?
            .unwrap_or_else(|| removed_external.clone());

        debug!(%kept_id, %removed_id, "pushing merge mutations");
        let mutation = Mutation::crud(
            &self.client_id,
            vec![
                CrudOp::upsert(table.clone(), kept_id, value),
                CrudOp::delete(table, removed_id),
            ],
            Some(request.adapter),
        );
        self.sink
            .push(mutation)
            .await
            .map_err(|e| self.fail(request, e))?;

        self.links
            .delete_link(
                request.org_id,
                request.adapter,
                removed_external,
                Some(&self.client_id),
            )
            .await
            .map_err(|e| self.fail(request, e))?;

        Ok(WorkflowOutcome::Completed { ops_pushed: 2 })
    }

    /// Fetch fresh data from the adapter, falling back to the webhook
    /// payload when the fetch fails after retries.
    async fn fetch_source(
        &self,
        request: &SyncRequest,
        adapter: &dyn AdapterOperations,
        external_id: &str,
    ) -> Result<Value, WorkflowError> {
        debug!(external_id, "fetching source data");
        let client = adapter
            .entity_client(&request.entity_type)
            .map_err(|e| self.fail(request, e))?;

        let fetched = retry::run_with_retries("fetch_source", self.max_attempts, || {
            let client = Arc::clone(&client);
            let id = external_id.to_string();
            async move { client.get(&id).await }
        })
        .await;

        match fetched {
            Ok(envelope) => {
                let entry = adapter.manifest().get(&request.entity_type).ok_or_else(|| {
                    self.fail(
                        request,
                        AdapterError::sync(
                            "transform",
                            format!("unknown entity '{}'", request.entity_type),
                        ),
                    )
                })?;
                let record = flatten_record(&envelope.data);
                entry
                    .transformer
                    .to_canonical(&record)
                    .map_err(|e| self.fail(request, e))
            }
            Err(e) => match &request.webhook_data {
                Some(data) => {
                    warn!(error = %e, "source fetch failed, using webhook payload");
                    Ok(data.clone())
                }
                None => Err(self.fail(request, e)),
            },
        }
    }

    /// Resolve the canonical id mapped to an external id, minting one and
    /// recording the link on first contact.
    async fn resolve_entity_id(
        &self,
        request: &SyncRequest,
        external_id: &str,
    ) -> Result<String, WorkflowError> {
        if let Some(entity_id) = self
            .links
            .find_entity_by_external_id(request.org_id, request.adapter, external_id)
            .await
            .map_err(|e| self.fail(request, e))?
        {
            return Ok(entity_id);
        }

        let minted = Uuid::new_v4().to_string();
        let link = ExternalLink::new(
            request.org_id,
            request.adapter,
            external_id,
            &request.entity_type,
            &minted,
        );
        self.links
            .create_links(&[link])
            .await
            .map_err(|e| self.fail(request, e))?;

        // A concurrent writer may have won the insert; the stored mapping
        // is authoritative either way.
        let entity_id = self
            .links
            .find_entity_by_external_id(request.org_id, request.adapter, external_id)
            .await
            .map_err(|e| self.fail(request, e))?
            .unwrap_or(minted);
        Ok(entity_id)
    }

    fn table_for(
        &self,
        adapter: &dyn AdapterOperations,
        request: &SyncRequest,
    ) -> Result<String, WorkflowError> {
        adapter
            .manifest()
            .get(&request.entity_type)
            .map(|entry| entry.table_name().to_string())
            .ok_or_else(|| {
                self.fail(
                    request,
                    AdapterError::sync(
                        "resolve",
                        format!("unknown entity '{}'", request.entity_type),
                    ),
                )
            })
    }

    fn fail<E>(&self, request: &SyncRequest, source: E) -> WorkflowError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        WorkflowError {
            entity_type: request.entity_type.clone(),
            entity_id: request.entity_id.clone(),
            token_key: request.token_key.clone(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryExternalLinkStore;
    use crate::mutation::{RecordingSink, SinkError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use steeple_adapter::endpoint::{EndpointDefinition, EndpointDescriptor, HttpMethod};
    use steeple_adapter::envelope::SingleEnvelope;
    use steeple_adapter::error::AdapterResult;
    use steeple_adapter::manifest::EntityManifest;
    use steeple_adapter::stream::PageStream;
    use steeple_adapter::traits::{EntityClient, ListParams};
    use steeple_adapter::transform::FieldMap;
    use steeple_adapter::types::{AdapterKind, CrudKind, RemoteOperation};

    struct StubClient {
        fail_get: bool,
        get_calls: AtomicU32,
    }

    #[async_trait]
    impl EntityClient for StubClient {
        fn entity(&self) -> &str {
            "Person"
        }

        fn supports(&self, _op: RemoteOperation) -> bool {
            true
        }

        async fn get(&self, external_id: &str) -> AdapterResult<SingleEnvelope> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_get {
                return Err(AdapterError::connection("adapter unreachable"));
            }
            Ok(SingleEnvelope {
                data: json!({
                    "type": "Person",
                    "id": external_id,
                    "attributes": {"first_name": "Ada", "last_name": "Lovelace"}
                }),
                included: Vec::new(),
            })
        }

        async fn create(&self, _attributes: Value) -> AdapterResult<SingleEnvelope> {
            unreachable!("workflow never creates remotely")
        }

        async fn update(&self, _external_id: &str, _attributes: Value) -> AdapterResult<SingleEnvelope> {
            unreachable!("workflow never updates remotely")
        }

        async fn delete(&self, _external_id: &str) -> AdapterResult<()> {
            unreachable!("workflow never deletes remotely")
        }
    }

    struct StubAdapter {
        manifest: EntityManifest,
        client: Arc<StubClient>,
    }

    impl StubAdapter {
        fn new(fail_get: bool) -> Self {
            let manifest = EntityManifest::from_definitions(vec![EndpointDefinition {
                entity: "Person".to_string(),
                module: "people".to_string(),
                external_type: "Person".to_string(),
                operation: RemoteOperation::Get,
                descriptor: EndpointDescriptor::new(HttpMethod::Get, "/people/:person_id"),
                fields: FieldMap::new()
                    .map("id", "id")
                    .map("first_name", "firstName")
                    .map("last_name", "lastName"),
            }]);
            Self {
                manifest,
                client: Arc::new(StubClient {
                    fail_get,
                    get_calls: AtomicU32::new(0),
                }),
            }
        }
    }

    #[async_trait]
    impl AdapterOperations for StubAdapter {
        fn kind(&self) -> AdapterKind {
            AdapterKind::Pco
        }

        fn manifest(&self) -> &EntityManifest {
            &self.manifest
        }

        fn entity_client(&self, entity: &str) -> AdapterResult<Arc<dyn EntityClient>> {
            if entity == "Person" {
                Ok(Arc::clone(&self.client) as Arc<dyn EntityClient>)
            } else {
                Err(AdapterError::sync(
                    "resolve",
                    format!("unknown entity '{entity}'"),
                ))
            }
        }

        async fn list_entity_data(
            &self,
            _entity: &str,
            _params: ListParams,
        ) -> AdapterResult<PageStream> {
            Err(AdapterError::sync("list", "not used in these tests"))
        }
    }

    struct FailingSink;

    #[async_trait]
    impl MutationSink for FailingSink {
        async fn push(&self, _mutation: Mutation) -> Result<(), SinkError> {
            Err(SinkError::push("log unavailable"))
        }
    }

    struct Fixture {
        workflow: EntitySyncWorkflow,
        adapter: Arc<StubAdapter>,
        links: Arc<MemoryExternalLinkStore>,
        sink: Arc<RecordingSink>,
    }

    fn fixture(fail_get: bool) -> Fixture {
        let adapter = Arc::new(StubAdapter::new(fail_get));
        let registry = Arc::new(
            AdapterRegistry::builder()
                .register(Arc::clone(&adapter) as Arc<dyn AdapterOperations>)
                .build(),
        );
        let links = Arc::new(MemoryExternalLinkStore::new());
        let sink = Arc::new(RecordingSink::new());
        let workflow = EntitySyncWorkflow::new(
            registry,
            Arc::clone(&links) as Arc<dyn ExternalLinkStore>,
            Arc::clone(&sink) as Arc<dyn MutationSink>,
        );
        Fixture {
            workflow,
            adapter,
            links,
            sink,
        }
    }

    fn request(operation: SyncOperation, entity_id: &str, org_id: Uuid) -> SyncRequest {
        SyncRequest {
            token_key: "org-token".to_string(),
            org_id,
            adapter: AdapterKind::Pco,
            entity_type: "Person".to_string(),
            entity_id: entity_id.to_string(),
            operation,
            related_ids: Vec::new(),
            webhook_data: None,
            request_id: "req-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_mints_canonical_id_and_links() {
        let f = fixture(false);
        let org = Uuid::new_v4();

        let outcome = f
            .workflow
            .run(&request(SyncOperation::Create, "per_1", org))
            .await
            .unwrap();

        assert_eq!(outcome, WorkflowOutcome::Completed { ops_pushed: 1 });

        let pushed = f.sink.pushed();
        assert_eq!(pushed.len(), 1);
        let op = pushed[0].ops().next().unwrap();
        assert_eq!(op.op, CrudKind::Upsert);
        assert_eq!(op.table_name, "people");
        assert_eq!(op.value["firstName"], "Ada");
        assert_eq!(pushed[0].source.as_deref(), Some("pco"));

        // the pushed canonical id matches the recorded link
        let linked = f
            .links
            .find_entity_by_external_id(org, AdapterKind::Pco, "per_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(op.primary_key["id"], linked);
    }

    #[tokio::test]
    async fn test_update_reuses_existing_link() {
        let f = fixture(false);
        let org = Uuid::new_v4();
        f.links
            .create_links(&[ExternalLink::new(
                org,
                AdapterKind::Pco,
                "per_1",
                "Person",
                "canon-1",
            )])
            .await
            .unwrap();

        f.workflow
            .run(&request(SyncOperation::Update, "per_1", org))
            .await
            .unwrap();

        let pushed = f.sink.pushed();
        assert_eq!(pushed[0].ops().next().unwrap().primary_key["id"], "canon-1");
        assert_eq!(f.links.len().await, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_webhook_payload() {
        let f = fixture(true);
        let org = Uuid::new_v4();
        let mut req = request(SyncOperation::Update, "per_1", org);
        req.webhook_data = Some(json!({"firstName": "Webhook Ada"}));

        f.workflow.run(&req).await.unwrap();

        // the webhook payload is pushed verbatim
        let pushed = f.sink.pushed();
        assert_eq!(
            pushed[0].ops().next().unwrap().value,
            json!({"firstName": "Webhook Ada"})
        );
        // and the fetch was retried to exhaustion first
        assert_eq!(f.adapter.client.get_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_webhook_data_fails() {
        let f = fixture(true);
        let org = Uuid::new_v4();

        let err = f
            .workflow
            .run(&request(SyncOperation::Update, "per_1", org))
            .await
            .unwrap_err();

        assert_eq!(err.entity_type, "Person");
        assert_eq!(err.entity_id, "per_1");
        assert!(f.sink.pushed().is_empty());
    }

    #[tokio::test]
    async fn test_delete_keys_by_linked_canonical_id_and_soft_deletes() {
        let f = fixture(false);
        let org = Uuid::new_v4();
        f.links
            .create_links(&[ExternalLink::new(
                org,
                AdapterKind::Pco,
                "per_1",
                "Person",
                "canon-1",
            )])
            .await
            .unwrap();

        let outcome = f
            .workflow
            .run(&request(SyncOperation::Delete, "per_1", org))
            .await
            .unwrap();

        assert_eq!(outcome, WorkflowOutcome::Completed { ops_pushed: 1 });
        let pushed = f.sink.pushed();
        let op = pushed[0].ops().next().unwrap();
        assert_eq!(op.op, CrudKind::Delete);
        assert_eq!(op.primary_key["id"], "canon-1");

        let stored = f.links.get(org, AdapterKind::Pco, "per_1").await.unwrap();
        assert!(stored.is_deleted());
        assert!(!stored.syncing);
    }

    #[tokio::test]
    async fn test_merge_pushes_upsert_then_delete() {
        let f = fixture(false);
        let org = Uuid::new_v4();
        f.links
            .create_links(&[
                ExternalLink::new(org, AdapterKind::Pco, "per_keep", "Person", "canon-keep"),
                ExternalLink::new(org, AdapterKind::Pco, "per_remove", "Person", "canon-remove"),
            ])
            .await
            .unwrap();

        let mut req = request(SyncOperation::Merge, "per_keep", org);
        req.related_ids = vec!["per_remove".to_string()];

        let outcome = f.workflow.run(&req).await.unwrap();
        assert_eq!(outcome, WorkflowOutcome::Completed { ops_pushed: 2 });

        let pushed = f.sink.pushed();
        assert_eq!(pushed.len(), 1);
        let ops: Vec<_> = pushed[0].ops().collect();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].op, CrudKind::Upsert);
        assert_eq!(ops[0].primary_key["id"], "canon-keep");
        assert_eq!(ops[1].op, CrudKind::Delete);
        assert_eq!(ops[1].primary_key["id"], "canon-remove");

        let removed = f.links.get(org, AdapterKind::Pco, "per_remove").await.unwrap();
        assert!(removed.is_deleted());
    }

    #[tokio::test]
    async fn test_merge_without_related_id_fails() {
        let f = fixture(false);
        let org = Uuid::new_v4();

        let err = f
            .workflow
            .run(&request(SyncOperation::Merge, "per_keep", org))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("merge requires a related id"));
    }

    #[tokio::test]
    async fn test_already_syncing_short_circuits() {
        let f = fixture(false);
        let org = Uuid::new_v4();
        f.links
            .create_links(&[ExternalLink::new(
                org,
                AdapterKind::Pco,
                "per_1",
                "Person",
                "canon-1",
            )])
            .await
            .unwrap();
        assert!(f.links.begin_sync(org, AdapterKind::Pco, "per_1").await.unwrap());

        let outcome = f
            .workflow
            .run(&request(SyncOperation::Update, "per_1", org))
            .await
            .unwrap();

        assert_eq!(outcome, WorkflowOutcome::AlreadySyncing);
        assert!(f.sink.pushed().is_empty());
        // the flag still belongs to the first runner
        assert!(f.links.get(org, AdapterKind::Pco, "per_1").await.unwrap().syncing);
    }

    #[tokio::test]
    async fn test_syncing_flag_released_when_push_fails() {
        let adapter = Arc::new(StubAdapter::new(false));
        let registry = Arc::new(
            AdapterRegistry::builder()
                .register(Arc::clone(&adapter) as Arc<dyn AdapterOperations>)
                .build(),
        );
        let links = Arc::new(MemoryExternalLinkStore::new());
        let workflow = EntitySyncWorkflow::new(
            registry,
            Arc::clone(&links) as Arc<dyn ExternalLinkStore>,
            Arc::new(FailingSink),
        );

        let org = Uuid::new_v4();
        links
            .create_links(&[ExternalLink::new(
                org,
                AdapterKind::Pco,
                "per_1",
                "Person",
                "canon-1",
            )])
            .await
            .unwrap();

        let err = workflow
            .run(&request(SyncOperation::Update, "per_1", org))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("log unavailable"));

        // begin_sync was paired with finish_sync despite the failure
        let stored = links.get(org, AdapterKind::Pco, "per_1").await.unwrap();
        assert!(!stored.syncing);
    }

    #[tokio::test]
    async fn test_idempotency_key_is_stable_across_retries() {
        let org = Uuid::new_v4();
        let a = request(SyncOperation::Update, "per_1", org).idempotency_key();
        let b = request(SyncOperation::Update, "per_1", org).idempotency_key();
        assert_eq!(a, b);

        let mut other = request(SyncOperation::Update, "per_1", org);
        other.request_id = "req-2".to_string();
        assert_ne!(a, other.idempotency_key());
    }
}
