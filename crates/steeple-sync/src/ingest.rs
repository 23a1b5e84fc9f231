//! Inbound ingestor
//!
//! The consumer side of the paginated ingestion stream: per page, each
//! external record is inverse-transformed into canonical shape, pushed as
//! an upsert into the mutation log, and tracked with an external link.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use steeple_adapter::crud::CrudOp;
use steeple_adapter::envelope::flatten_record;
use steeple_adapter::error::AdapterError;
use steeple_adapter::traits::AdapterOperations;

use crate::link::ExternalLink;
use crate::mutation::{Mutation, MutationSink, SinkError};
use crate::store::{ExternalLinkStore, LinkStoreError};

/// Ingest errors.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Adapter-side failure.
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Link store failure.
    #[error("link store error: {0}")]
    Store(#[from] LinkStoreError),

    /// Mutation log failure.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Accounting for one entity's ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Pages consumed.
    pub pages: usize,

    /// Records upserted.
    pub records: usize,

    /// Records skipped (no id, or untransformable).
    pub skipped: usize,

    /// New links recorded.
    pub links_created: u64,
}

/// Drives full-entity ingestion from an adapter into the canonical store.
pub struct Ingestor {
    links: Arc<dyn ExternalLinkStore>,
    sink: Arc<dyn MutationSink>,
    client_id: String,
}

impl Ingestor {
    /// Create an ingestor over the given collaborators.
    #[must_use]
    pub fn new(links: Arc<dyn ExternalLinkStore>, sink: Arc<dyn MutationSink>) -> Self {
        Self {
            links,
            sink,
            client_id: "steeple-ingest".to_string(),
        }
    }

    /// Override the client id stamped on outbound mutations.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Ingest every page of one entity.
    ///
    /// Unknown and skip-sync entities come back as an empty summary, the
    /// same intentional no-op the adapter reports. One mutation batch is
    /// pushed per page, in page order.
    #[instrument(skip(self, adapter), fields(adapter = %adapter.kind()))]
    pub async fn ingest_entity(
        &self,
        org_id: Uuid,
        adapter: &dyn AdapterOperations,
        entity: &str,
    ) -> Result<IngestSummary, IngestError> {
        let mut pages = Vec::new();
        adapter
            .process_entity_data(entity, &mut |page| {
                pages.push(page);
                Ok(())
            })
            .await?;

        let mut summary = IngestSummary::default();
        if pages.is_empty() {
            return Ok(summary);
        }

        // process_entity_data only feeds pages for manifest entities
        let Some(entry) = adapter.manifest().get(entity) else {
            return Ok(summary);
        };
        let kind = adapter.kind();
        let table = entry.table_name().to_string();

        for page in pages {
            let mut ops = Vec::with_capacity(page.data.len());
            for record in &page.data {
                let Some(external_id) = record.get("id").and_then(Value::as_str) else {
                    warn!(entity, "record without id, skipping");
                    summary.skipped += 1;
                    continue;
                };

                let canonical = match entry.transformer.to_canonical(&flatten_record(record)) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(entity, external_id, error = %e, "record failed transform, skipping");
                        summary.skipped += 1;
                        continue;
                    }
                };

                let entity_id = self
                    .resolve_entity_id(org_id, kind, entity, external_id, &mut summary)
                    .await?;
                ops.push(CrudOp::upsert(table.clone(), entity_id, canonical));
                summary.records += 1;
            }

            if !ops.is_empty() {
                self.sink
                    .push(Mutation::crud(&self.client_id, ops, Some(kind)))
                    .await?;
            }
            summary.pages += 1;
        }

        info!(
            entity,
            pages = summary.pages,
            records = summary.records,
            skipped = summary.skipped,
            links_created = summary.links_created,
            "ingestion finished"
        );
        Ok(summary)
    }

    async fn resolve_entity_id(
        &self,
        org_id: Uuid,
        kind: steeple_adapter::types::AdapterKind,
        entity: &str,
        external_id: &str,
        summary: &mut IngestSummary,
    ) -> Result<String, IngestError> {
        if let Some(entity_id) = self
            .links
            .find_entity_by_external_id(org_id, kind, external_id)
            .await?
        {
            return Ok(entity_id);
        }

        let minted = Uuid::new_v4().to_string();
        let link = ExternalLink::new(org_id, kind, external_id, entity, &minted);
        summary.links_created += self.links.create_links(&[link]).await?;

        // first writer wins: re-read in case a concurrent insert landed
        let entity_id = self
            .links
            .find_entity_by_external_id(org_id, kind, external_id)
            .await?
            .unwrap_or(minted);
        Ok(entity_id)
    }
}
