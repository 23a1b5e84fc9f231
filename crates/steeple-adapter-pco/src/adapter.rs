//! Planning Center adapter
//!
//! [`AdapterOperations`] implementation: offset-paginated listing, entity
//! clients over the People manifest, and OAuth authorization-code
//! exchange.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use steeple_adapter::config::AdapterConfig;
use steeple_adapter::envelope::ListEnvelope;
use steeple_adapter::error::{AdapterError, AdapterResult};
use steeple_adapter::manifest::EntityManifest;
use steeple_adapter::stream::{page_stream, PageLister, PageStream};
use steeple_adapter::token::{OAuthToken, TokenResponse};
use steeple_adapter::traits::{AdapterOperations, EntityClient, ListParams};
use steeple_adapter::types::{AdapterKind, RemoteOperation};

use crate::client::PcoClient;
use crate::entity::PcoEntityClient;
use crate::manifest::pco_manifest;

/// OAuth application credentials for the code-exchange flow.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Planning Center Online adapter, scoped to one org token.
pub struct PcoAdapter {
    client: Arc<PcoClient>,
    manifest: EntityManifest,
    oauth: Option<OAuthCredentials>,
}

impl PcoAdapter {
    /// Create an adapter for the given configuration.
    pub fn new(config: AdapterConfig) -> AdapterResult<Self> {
        Ok(Self {
            client: Arc::new(PcoClient::new(config)?),
            manifest: pco_manifest(),
            oauth: None,
        })
    }

    /// Attach OAuth application credentials, enabling `fetch_token`.
    #[must_use]
    pub fn with_oauth(mut self, oauth: OAuthCredentials) -> Self {
        self.oauth = Some(oauth);
        self
    }
}

/// One entity's list endpoint as a page lister.
struct PcoPageLister {
    client: Arc<PcoClient>,
    path: String,
    per_page: u64,
    order: Option<String>,
    filter: Vec<(String, String)>,
}

#[async_trait]
impl PageLister for PcoPageLister {
    async fn fetch_page(&self, offset: u64) -> AdapterResult<ListEnvelope> {
        let mut query = vec![
            ("offset".to_string(), offset.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        if let Some(order) = &self.order {
            query.push(("order".to_string(), order.clone()));
        }
        for (field, value) in &self.filter {
            query.push((format!("where[{field}]"), value.clone()));
        }

        debug!(path = %self.path, offset, "fetching page");
        self.client.get_json(&self.path, &query).await
    }
}

#[async_trait]
impl AdapterOperations for PcoAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Pco
    }

    fn manifest(&self) -> &EntityManifest {
        &self.manifest
    }

    fn entity_client(&self, entity: &str) -> AdapterResult<Arc<dyn EntityClient>> {
        let entry = self
            .manifest
            .get(entity)
            .ok_or_else(|| AdapterError::sync("resolve", format!("unknown entity '{entity}'")))?;
        Ok(Arc::new(PcoEntityClient::new(
            Arc::clone(&self.client),
            entry.clone(),
        )))
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

        let lister = PcoPageLister {
            client: Arc::clone(&self.client),
            path: descriptor.path.clone(),
            per_page: params.per_page,
            order: params.order,
            filter: params.filter,
        };
        Ok(page_stream(Arc::new(lister), params.offset))
    }

    async fn fetch_token(&self, code: &str, redirect_uri: &str) -> AdapterResult<OAuthToken> {
        let oauth = self
            .oauth
            .as_ref()
            .ok_or_else(|| AdapterError::token("no OAuth credentials configured"))?;

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
        ];
        let response: TokenResponse = self.client.post_form("/oauth/token", &form).await?;
        Ok(OAuthToken::from_response(response))
    }
}
