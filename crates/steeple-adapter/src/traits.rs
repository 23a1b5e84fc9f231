//! Adapter capability traits
//!
//! One [`AdapterOperations`] implementation per external ChMS. The generic
//! parts (batch sync, ingestion driving, field transformation) are default
//! methods so a concrete adapter only supplies its manifest, its entity
//! clients, and its transport.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tracing::info;

use crate::crud::{CrudOp, SyncOutcome};
use crate::envelope::{ListEnvelope, SingleEnvelope};
use crate::error::{AdapterError, AdapterResult};
use crate::manifest::EntityManifest;
use crate::stream::PageStream;
use crate::token::OAuthToken;
use crate::translator;
use crate::types::{AdapterKind, CrudKind, RemoteOperation};

/// Parameters for a paginated list.
#[derive(Debug, Clone)]
pub struct ListParams {
    /// Starting offset.
    pub offset: u64,

    /// Page size.
    pub per_page: u64,

    /// Ordering field, when the endpoint declares it orderable.
    pub order: Option<String>,

    /// Query filters, `(field, value)` pairs from the queryable set.
    pub filter: Vec<(String, String)>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            offset: 0,
            per_page: 25,
            order: None,
            filter: Vec::new(),
        }
    }
}

/// Per-page ingestion callback.
pub type PageHandler<'a> = dyn FnMut(ListEnvelope) -> AdapterResult<()> + Send + 'a;

/// The remote surface for one entity of one adapter.
///
/// Verbs the adapter does not expose for the entity report
/// `supports(op) == false`; the translator treats unsupported create and
/// delete as successful no-ops.
#[async_trait]
pub trait EntityClient: Send + Sync {
    /// Canonical entity name this client addresses.
    fn entity(&self) -> &str;

    /// Whether the adapter exposes a remote operation for this entity.
    fn supports(&self, op: RemoteOperation) -> bool;

    /// Fetch one record by external id.
    async fn get(&self, external_id: &str) -> AdapterResult<SingleEnvelope>;

    /// Create a record from external-shape attributes; the adapter wraps
    /// its own envelope and the remote system assigns the id.
    async fn create(&self, attributes: Value) -> AdapterResult<SingleEnvelope>;

    /// Update a record by external id.
    async fn update(&self, external_id: &str, attributes: Value) -> AdapterResult<SingleEnvelope>;

    /// Delete a record by external id.
    async fn delete(&self, external_id: &str) -> AdapterResult<()>;
}

/// Capability interface for one external ChMS, scoped to one org token.
#[async_trait]
pub trait AdapterOperations: Send + Sync {
    /// Which provider this adapter integrates.
    fn kind(&self) -> AdapterKind;

    /// The adapter's entity manifest.
    fn manifest(&self) -> &EntityManifest;

    /// Resolve the remote surface for an entity.
    ///
    /// Fails with a sync error for entities outside the manifest; that is
    /// a configuration problem, not a per-record one.
    fn entity_client(&self, entity: &str) -> AdapterResult<Arc<dyn EntityClient>>;

    /// Open a pull-based page stream over the entity's list endpoint.
    ///
    /// Fails with `Sync { operation: "list" }` when the entity has no list
    /// capability; individual page fetch failures surface through the
    /// stream as connection errors.
    async fn list_entity_data(&self, entity: &str, params: ListParams)
        -> AdapterResult<PageStream>;

    /// Exchange an OAuth authorization code for a token.
    ///
    /// Adapters whose token acquisition is handled by a different layer
    /// keep this default.
    async fn fetch_token(&self, _code: &str, _redirect_uri: &str) -> AdapterResult<OAuthToken> {
        Err(AdapterError::token(format!(
            "token exchange is not handled by the {} adapter",
            self.kind()
        )))
    }

    /// Transform canonical data into the entity's external wire shape.
    ///
    /// `update` performs a partial transform of only the supplied fields;
    /// any other operation performs a full transform.
    fn transform_entity_data(
        &self,
        entity: &str,
        data: &Value,
        operation: CrudKind,
    ) -> AdapterResult<Value> {
        let entry = self
            .manifest()
            .get(entity)
            .ok_or_else(|| AdapterError::sync("transform", format!("unknown entity '{entity}'")))?;
        entry
            .transformer
            .to_external(data, operation == CrudKind::Update)
    }

    /// Apply a batch of canonical CRUD ops against the remote system.
    ///
    /// Returns exactly one outcome per input op, in input order. Failures
    /// resolving the entity client or manifest entry fail the whole batch;
    /// per-op failures are folded into failed outcomes.
    async fn sync_entity_data(
        &self,
        entity: &str,
        ops: &[CrudOp],
    ) -> AdapterResult<Vec<SyncOutcome>> {
        let client = self.entity_client(entity)?;
        let entry = self
            .manifest()
            .get(entity)
            .ok_or_else(|| AdapterError::sync("sync", format!("unknown entity '{entity}'")))?;
        Ok(translator::run_batch(entry, client.as_ref(), ops).await)
    }

    /// Drive the full paginated ingestion for one entity, feeding each
    /// page to `handler`.
    ///
    /// Unknown and skip-sync entities are an intentional no-op, logged at
    /// info and reported as success.
    async fn process_entity_data(
        &self,
        entity: &str,
        handler: &mut PageHandler<'_>,
    ) -> AdapterResult<()> {
        let Some(entry) = self.manifest().get(entity) else {
            info!(adapter = %self.kind(), entity, "entity not in manifest, skipping ingestion");
            return Ok(());
        };
        if entry.skip_sync {
            info!(adapter = %self.kind(), entity, "entity flagged skip-sync, skipping ingestion");
            return Ok(());
        }

        let mut pages = self.list_entity_data(entity, ListParams::default()).await?;
        while let Some(page) = pages.next().await {
            handler(page?)?;
        }
        Ok(())
    }
}
