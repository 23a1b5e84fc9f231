//! Church Community Builder HTTP client
//!
//! Single-attempt reqwest wrapper; retry lives in the workflow layer.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use steeple_adapter::config::AdapterConfig;
use steeple_adapter::error::{AdapterError, AdapterResult};

/// HTTP client for the CCB API.
#[derive(Debug)]
pub struct CcbClient {
    http: reqwest::Client,
    config: AdapterConfig,
}

impl CcbClient {
    /// Create a client for a validated configuration.
    pub fn new(config: AdapterConfig) -> AdapterResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connection.connect_timeout_secs))
            .timeout(Duration::from_secs(config.connection.read_timeout_secs))
            .build()
            .map_err(|e| AdapterError::validation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// GET a JSON resource.
    #[instrument(skip(self, query))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> AdapterResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.config.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AdapterError::connection_with_source("request failed", e))?;
        Self::decode("GET", response).await
    }

    /// POST a JSON body.
    #[instrument(skip(self, body))]
    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> AdapterResult<T> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AdapterError::connection_with_source("request failed", e))?;
        Self::decode("POST", response).await
    }

    /// PATCH a JSON body.
    #[instrument(skip(self, body))]
    pub async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> AdapterResult<T> {
        let response = self
            .http
            .patch(self.url(path))
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AdapterError::connection_with_source("request failed", e))?;
        Self::decode("PATCH", response).await
    }

    /// DELETE a resource.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> AdapterResult<()> {
        let response = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| AdapterError::connection_with_source("request failed", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::status_error("DELETE", status, response).await)
    }

    async fn decode<T: DeserializeOwned>(
        method: &'static str,
        response: reqwest::Response,
    ) -> AdapterResult<T> {
        let status = response.status();
        if status.is_success() {
            debug!(%status, "request succeeded");
            return response
                .json()
                .await
                .map_err(|e| AdapterError::validation(format!("failed to decode response: {e}")));
        }
        Err(Self::status_error(method, status, response).await)
    }

    async fn status_error(
        method: &'static str,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> AdapterError {
        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => AdapterError::token(format!("{status}: {body}")),
            _ => AdapterError::sync(method, format!("{status}: {body}")),
        }
    }
}
