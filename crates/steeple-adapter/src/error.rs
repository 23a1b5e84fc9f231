//! Adapter error types
//!
//! Error definitions with retryable/permanent classification for the sync
//! retry policy.

use thiserror::Error;

/// Error that can occur talking to an external ChMS adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Transport-level failure reaching the external system (retryable).
    #[error("connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Business-level sync failure: unsupported operation, unknown entity,
    /// remote rejection. Not retried by the engine itself.
    #[error("sync failed during {operation}: {message}")]
    Sync { operation: String, message: String },

    /// OAuth or credential failure.
    #[error("token error: {message}")]
    Token { message: String },

    /// Schema mismatch between the canonical and external shapes.
    #[error("validation failed: {message}")]
    Validation { message: String },
}

impl AdapterError {
    /// Check if the operation should be retried by the workflow layer.
    ///
    /// Only transport failures are retryable; business, token, and
    /// validation failures require intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Connection { .. })
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            AdapterError::Connection { .. } => "CONNECTION_FAILED",
            AdapterError::Sync { .. } => "SYNC_FAILED",
            AdapterError::Token { .. } => "TOKEN_ERROR",
            AdapterError::Validation { .. } => "VALIDATION_FAILED",
        }
    }

    // Convenience constructors

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        AdapterError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error with the underlying cause.
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AdapterError::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a sync error for a named operation.
    pub fn sync(operation: impl Into<String>, message: impl Into<String>) -> Self {
        AdapterError::Sync {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a token error.
    pub fn token(message: impl Into<String>) -> Self {
        AdapterError::Token {
            message: message.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AdapterError::Validation {
            message: message.into(),
        }
    }
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_retryable() {
        assert!(AdapterError::connection("socket closed").is_retryable());

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(AdapterError::connection_with_source("timeout", io).is_retryable());
    }

    #[test]
    fn test_business_errors_are_not_retryable() {
        for err in [
            AdapterError::sync("list", "no list endpoint"),
            AdapterError::token("expired"),
            AdapterError::validation("not an object"),
        ] {
            assert!(!err.is_retryable(), "{} should not retry", err.error_code());
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AdapterError::connection("x").error_code(),
            "CONNECTION_FAILED"
        );
        assert_eq!(AdapterError::sync("list", "x").error_code(), "SYNC_FAILED");
        assert_eq!(AdapterError::token("x").error_code(), "TOKEN_ERROR");
        assert_eq!(
            AdapterError::validation("x").error_code(),
            "VALIDATION_FAILED"
        );
    }

    #[test]
    fn test_error_display() {
        let err = AdapterError::sync("create", "remote rejected payload");
        assert_eq!(
            err.to_string(),
            "sync failed during create: remote rejected payload"
        );
    }
}
