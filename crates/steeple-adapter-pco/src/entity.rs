//! Per-entity remote surface
//!
//! Verb dispatch driven by the manifest's endpoint descriptors, with
//! JSON:API envelope wrapping on writes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use steeple_adapter::endpoint::{fill_path, path_param_name, EndpointDescriptor};
use steeple_adapter::envelope::SingleEnvelope;
use steeple_adapter::error::{AdapterError, AdapterResult};
use steeple_adapter::manifest::EntityManifestEntry;
use steeple_adapter::traits::EntityClient;
use steeple_adapter::types::RemoteOperation;

use crate::client::PcoClient;

/// Entity client for one Planning Center entity.
pub struct PcoEntityClient {
    client: Arc<PcoClient>,
    entry: EntityManifestEntry,
    path_param: String,
}

impl PcoEntityClient {
    /// Create a client for one manifest entry.
    #[must_use]
    pub fn new(client: Arc<PcoClient>, entry: EntityManifestEntry) -> Self {
        let path_param = path_param_name(&entry.name);
        Self {
            client,
            entry,
            path_param,
        }
    }

    fn endpoint(&self, op: RemoteOperation) -> AdapterResult<&EndpointDescriptor> {
        self.entry.endpoint(op).ok_or_else(|| {
            AdapterError::sync(
                op.as_str(),
                format!("entity '{}' has no {op} endpoint", self.entry.name),
            )
        })
    }

    fn record_path(&self, op: RemoteOperation, external_id: &str) -> AdapterResult<String> {
        let descriptor = self.endpoint(op)?;
        fill_path(&descriptor.path, &self.path_param, external_id)
    }

    /// Wrap attributes in the JSON:API envelope PCO expects on writes.
    fn envelope(&self, attributes: Value) -> Value {
        json!({
            "data": {
                "type": self.entry.external_type,
                "attributes": attributes,
            }
        })
    }
}

#[async_trait]
impl EntityClient for PcoEntityClient {
    fn entity(&self) -> &str {
        &self.entry.name
    }

    fn supports(&self, op: RemoteOperation) -> bool {
        self.entry.supports(op)
    }

    async fn get(&self, external_id: &str) -> AdapterResult<SingleEnvelope> {
        let path = self.record_path(RemoteOperation::Get, external_id)?;
        self.client.get_json(&path, &[]).await
    }

    async fn create(&self, attributes: Value) -> AdapterResult<SingleEnvelope> {
        let descriptor = self.endpoint(RemoteOperation::Create)?;
        let body = self.envelope(attributes);
        self.client.post_json(&descriptor.path, &body).await
    }

    async fn update(&self, external_id: &str, attributes: Value) -> AdapterResult<SingleEnvelope> {
        let path = self.record_path(RemoteOperation::Update, external_id)?;
        let body = self.envelope(attributes);
        self.client.patch_json(&path, &body).await
    }

    async fn delete(&self, external_id: &str) -> AdapterResult<()> {
        let path = self.record_path(RemoteOperation::Delete, external_id)?;
        self.client.delete(&path).await
    }
}
