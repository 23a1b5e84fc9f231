//! Planning Center HTTP client
//!
//! Thin reqwest wrapper with bearer auth and JSON:API error decoding.
//! Single-attempt by design: retry policy belongs to the sync workflow,
//! and the page stream must never retry an individual fetch.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use steeple_adapter::config::AdapterConfig;
use steeple_adapter::error::{AdapterError, AdapterResult};

/// JSON:API error response body.
#[derive(Debug, Deserialize)]
struct ApiErrors {
    errors: Vec<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// HTTP client for the Planning Center API.
#[derive(Debug)]
pub struct PcoClient {
    http: reqwest::Client,
    config: AdapterConfig,
}

impl PcoClient {
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

    /// The configured API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
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
        let request = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.config.access_token)
            .query(query);
        self.execute(request, "GET").await
    }

    /// POST a JSON body.
    #[instrument(skip(self, body))]
    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> AdapterResult<T> {
        let request = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.config.access_token)
            .json(body);
        self.execute(request, "POST").await
    }

    /// PATCH a JSON body.
    #[instrument(skip(self, body))]
    pub async fn patch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> AdapterResult<T> {
        let request = self
            .http
            .patch(self.url(path))
            .bearer_auth(&self.config.access_token)
            .json(body);
        self.execute(request, "PATCH").await
    }

    /// DELETE a resource. Tolerates an empty response body.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> AdapterResult<()> {
        let request = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.config.access_token);

        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::connection_with_source("request failed", e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::status_error("DELETE", status, response).await)
    }

    /// POST a form body without auth, for the OAuth token endpoint.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> AdapterResult<T> {
        let request = self.http.post(self.url(path)).form(form);
        self.execute(request, "POST").await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        method: &'static str,
    ) -> AdapterResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::connection_with_source("request failed", e))?;

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
        let detail = serde_json::from_str::<ApiErrors>(&body)
            .ok()
            .and_then(|e| {
                e.errors
                    .into_iter()
                    .next()
                    .map(|b| b.detail.or(b.title).unwrap_or_default())
            })
            .filter(|s| !s.is_empty())
            .unwrap_or(body);

        match status.as_u16() {
            401 | 403 => AdapterError::token(format!("{status}: {detail}")),
            _ => AdapterError::sync(method, format!("{status}: {detail}")),
        }
    }
}
