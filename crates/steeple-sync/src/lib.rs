//! # Sync Engine
//!
//! Orchestration over the adapter framework: the durable external-link
//! store, the outbound mutation batch, the retry boundary, and the
//! per-entity sync workflow.
//!
//! ## Data flow
//!
//! Inbound: [`Ingestor`] drives an adapter's paginated stream, inverse
//! transforms each record, pushes upserts into the canonical mutation log
//! and records external links. Outbound: a webhook or internal mutation
//! becomes a [`SyncRequest`]; [`EntitySyncWorkflow`] fetches fresh source
//! data (webhook payload as fallback), resolves canonical identity
//! through the link store, and pushes mutations tagged with the
//! originating adapter so downstream sync excludes it.

pub mod idempotency;
pub mod ingest;
pub mod link;
pub mod memory;
pub mod mutation;
pub mod retry;
pub mod store;
pub mod workflow;

pub use ingest::{IngestError, IngestSummary, Ingestor};
pub use link::ExternalLink;
pub use memory::MemoryExternalLinkStore;
pub use mutation::{Mutation, MutationSink, RecordingSink, SinkError, CRUD_MUTATION_NAME};
pub use store::{ExternalLinkStore, LinkStoreError, LinkStoreResult, PgExternalLinkStore};
pub use workflow::{
    EntitySyncWorkflow, SyncOperation, SyncRequest, WorkflowError, WorkflowOutcome,
};
