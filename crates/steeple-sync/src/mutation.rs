//! Outbound mutations
//!
//! The batch shape pushed into the canonical mutation log, and the sink
//! trait that log sits behind. Mutations carry the originating adapter as
//! `source` so the outbound-sync trigger can exclude it and avoid loops.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use steeple_adapter::crud::CrudOp;
use steeple_adapter::types::AdapterKind;

/// Mutation name for canonical CRUD batches.
pub const CRUD_MUTATION_NAME: &str = "_zero_crud";

/// One argument bundle of a CRUD mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrudArgs {
    /// The ops, applied in order.
    pub ops: Vec<CrudOp>,
}

/// A mutation batch destined for the canonical mutation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutation {
    /// Mutation id.
    pub id: Uuid,

    /// The pushing client.
    #[serde(rename = "clientID")]
    pub client_id: String,

    /// Mutation name; CRUD batches use [`CRUD_MUTATION_NAME`].
    pub name: String,

    /// Mutation type tag.
    #[serde(rename = "type")]
    pub kind: String,

    /// When the mutation was built.
    pub timestamp: DateTime<Utc>,

    /// Originating adapter tag; the outbound trigger skips this adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// The CRUD payload.
    pub args: Vec<CrudArgs>,
}

impl Mutation {
    /// Build a CRUD mutation batch.
    #[must_use]
    pub fn crud(client_id: impl Into<String>, ops: Vec<CrudOp>, source: Option<AdapterKind>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id: client_id.into(),
            name: CRUD_MUTATION_NAME.to_string(),
            kind: "crud".to_string(),
            timestamp: Utc::now(),
            source: source.map(|k| k.as_str().to_string()),
            args: vec![CrudArgs { ops }],
        }
    }

    /// The ops across all argument bundles, in order.
    pub fn ops(&self) -> impl Iterator<Item = &CrudOp> {
        self.args.iter().flat_map(|a| a.ops.iter())
    }
}

/// Sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The mutation log rejected or never received the batch.
    #[error("mutation push failed: {message}")]
    Push {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SinkError {
    /// Create a push error.
    pub fn push(message: impl Into<String>) -> Self {
        SinkError::Push {
            message: message.into(),
            source: None,
        }
    }
}

/// The canonical mutation log, as seen from the sync engine.
#[async_trait]
pub trait MutationSink: Send + Sync {
    /// Push one mutation batch downstream.
    async fn push(&self, mutation: Mutation) -> Result<(), SinkError>;
}

/// Sink that records pushed mutations; for tests and dry runs.
#[derive(Default)]
pub struct RecordingSink {
    pushed: std::sync::Mutex<Vec<Mutation>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything pushed so far.
    pub fn pushed(&self) -> Vec<Mutation> {
        self.pushed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MutationSink for RecordingSink {
    async fn push(&self, mutation: Mutation) -> Result<(), SinkError> {
        self.pushed.lock().unwrap().push(mutation);
        Ok(())
    }
}
