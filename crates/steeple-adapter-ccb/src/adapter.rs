//! Church Community Builder adapter
//!
//! Smaller surface than PCO: individuals and groups, list/get/update only.
//! Token acquisition is handled by the credential layer, so `fetch_token`
//! keeps the trait default.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use steeple_adapter::config::AdapterConfig;
use steeple_adapter::endpoint::{
    fill_path, path_param_name, EndpointDefinition, EndpointDescriptor, HttpMethod,
};
use steeple_adapter::envelope::{ListEnvelope, SingleEnvelope};
use steeple_adapter::error::{AdapterError, AdapterResult};
use steeple_adapter::manifest::{EntityManifest, EntityManifestEntry};
use steeple_adapter::stream::{page_stream, PageLister, PageStream};
use steeple_adapter::traits::{AdapterOperations, EntityClient, ListParams};
use steeple_adapter::transform::FieldMap;
use steeple_adapter::types::{AdapterKind, RemoteOperation};

use crate::client::CcbClient;

fn definition(
    entity: &str,
    operation: RemoteOperation,
    descriptor: EndpointDescriptor,
    fields: FieldMap,
) -> EndpointDefinition {
    EndpointDefinition {
        entity: entity.to_string(),
        module: "people".to_string(),
        external_type: entity.to_string(),
        operation,
        descriptor,
        fields,
    }
}

fn individual_fields() -> FieldMap {
    FieldMap::new()
        .map("id", "id")
        .map("first_name", "firstName")
        .map("last_name", "lastName")
        .map("email", "email")
        .map("campus_id", "campusId")
}

fn group_fields() -> FieldMap {
    FieldMap::new()
        .map("id", "id")
        .map("name", "name")
        .map("group_type", "groupType")
}

/// Build the CCB manifest.
#[must_use]
pub fn ccb_manifest() -> EntityManifest {
    EntityManifest::from_definitions(vec![
        definition(
            "Individual",
            RemoteOperation::List,
            EndpointDescriptor::new(HttpMethod::Get, "/api/individuals"),
            individual_fields(),
        ),
        definition(
            "Individual",
            RemoteOperation::Get,
            EndpointDescriptor::new(HttpMethod::Get, "/api/individuals/:individual_id"),
            individual_fields(),
        ),
        definition(
            "Individual",
            RemoteOperation::Update,
            EndpointDescriptor::new(HttpMethod::Patch, "/api/individuals/:individual_id"),
            individual_fields(),
        ),
        definition(
            "Group",
            RemoteOperation::List,
            EndpointDescriptor::new(HttpMethod::Get, "/api/groups"),
            group_fields(),
        ),
    ])
}

/// Church Community Builder adapter, scoped to one org token.
pub struct CcbAdapter {
    client: Arc<CcbClient>,
    manifest: EntityManifest,
}

impl CcbAdapter {
    /// Create an adapter for the given configuration.
    pub fn new(config: AdapterConfig) -> AdapterResult<Self> {
        Ok(Self {
            client: Arc::new(CcbClient::new(config)?),
            manifest: ccb_manifest(),
        })
    }
}

/// Entity client for one CCB entity.
struct CcbEntityClient {
    client: Arc<CcbClient>,
    entry: EntityManifestEntry,
    path_param: String,
}

impl CcbEntityClient {
    fn endpoint(&self, op: RemoteOperation) -> AdapterResult<&EndpointDescriptor> {
        self.entry.endpoint(op).ok_or_else(|| {
            AdapterError::sync(
                op.as_str(),
                format!("entity '{}' has no {op} endpoint", self.entry.name),
            )
        })
    }
}

#[async_trait]
impl EntityClient for CcbEntityClient {
    fn entity(&self) -> &str {
        &self.entry.name
    }

    fn supports(&self, op: RemoteOperation) -> bool {
        self.entry.supports(op)
    }

    async fn get(&self, external_id: &str) -> AdapterResult<SingleEnvelope> {
        let descriptor = self.endpoint(RemoteOperation::Get)?;
        let path = fill_path(&descriptor.path, &self.path_param, external_id)?;
        self.client.get_json(&path, &[]).await
    }

    async fn create(&self, attributes: Value) -> AdapterResult<SingleEnvelope> {
        let descriptor = self.endpoint(RemoteOperation::Create)?;
        let body = json!({"data": attributes});
        self.client.post_json(&descriptor.path, &body).await
    }

    async fn update(&self, external_id: &str, attributes: Value) -> AdapterResult<SingleEnvelope> {
        let descriptor = self.endpoint(RemoteOperation::Update)?;
        let path = fill_path(&descriptor.path, &self.path_param, external_id)?;
        let body = json!({"data": attributes});
        self.client.patch_json(&path, &body).await
    }

    async fn delete(&self, external_id: &str) -> AdapterResult<()> {
        let descriptor = self.endpoint(RemoteOperation::Delete)?;
        let path = fill_path(&descriptor.path, &self.path_param, external_id)?;
        self.client.delete(&path).await
    }
}

/// One entity's list endpoint as a page lister.
struct CcbPageLister {
    client: Arc<CcbClient>,
    path: String,
    per_page: u64,
}

#[async_trait]
impl PageLister for CcbPageLister {
    async fn fetch_page(&self, offset: u64) -> AdapterResult<ListEnvelope> {
        let query = vec![
            ("offset".to_string(), offset.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        debug!(path = %self.path, offset, "fetching page");
        self.client.get_json(&self.path, &query).await
    }
}

#[async_trait]
impl AdapterOperations for CcbAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Ccb
    }

    fn manifest(&self) -> &EntityManifest {
        &self.manifest
    }

    fn entity_client(&self, entity: &str) -> AdapterResult<Arc<dyn EntityClient>> {
        let entry = self
            .manifest
            .get(entity)
            .ok_or_else(|| AdapterError::sync("resolve", format!("unknown entity '{entity}'")))?;
        Ok(Arc::new(CcbEntityClient {
            client: Arc::clone(&self.client),
            path_param: path_param_name(&entry.name),
            entry: entry.clone(),
        }))
    }

    async fn list_entity_data(
        &self,
        entity: &str,
        params: ListParams,
    ) -> AdapterResult<PageStream> {
        let entry = self
            .manifest
            .get(entity)
            .ok_or_else(|| AdapterError::sync("list", format!("unknown entity '{entity}'")))?;
        let descriptor = entry.endpoint(RemoteOperation::List).ok_or_else(|| {
            AdapterError::sync("list", format!("entity '{entity}' has no list endpoint"))
        })?;

        let lister = CcbPageLister {
            client: Arc::clone(&self.client),
            path: descriptor.path.clone(),
            per_page: params.per_page,
        };
        Ok(page_stream(Arc::new(lister), params.offset))
    }
}
