//! OAuth token types
//!
//! The token shape returned by an adapter's code exchange. Caching and
//! refresh live in the credential layer, not here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Wire shape of an OAuth token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// An acquired OAuth token with absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Bearer token value.
    pub access_token: String,

    /// Token type, normally "Bearer".
    pub token_type: String,

    /// Refresh token, when the provider issues one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Absolute expiry; `None` for non-expiring tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuthToken {
    /// Build from a token endpoint response, anchoring expiry to now.
    #[must_use]
    pub fn from_response(response: TokenResponse) -> Self {
        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            refresh_token: response.refresh_token,
            scope: response.scope,
            expires_at,
        }
    }

    /// Whether the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}
