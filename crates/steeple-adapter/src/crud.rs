//! Canonical CRUD operations
//!
//! The per-request mutation shape exchanged with the canonical store, and
//! the per-operation outcome returned by a sync batch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AdapterError, AdapterResult};
use crate::types::CrudKind;

/// One requested canonical mutation.
///
/// Ephemeral: constructed per request and never persisted by this
/// subsystem. The wire form matches the canonical mutation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrudOp {
    /// Operation kind.
    pub op: CrudKind,

    /// Target table in the canonical store.
    #[serde(rename = "tableName")]
    pub table_name: String,

    /// Primary key mapping; exactly one entry for single-entity ops.
    #[serde(rename = "primaryKey")]
    pub primary_key: HashMap<String, String>,

    /// The value payload.
    pub value: Value,
}

impl CrudOp {
    /// Create an op with a single `id`-keyed primary key.
    pub fn new(
        op: CrudKind,
        table_name: impl Into<String>,
        id: impl Into<String>,
        value: Value,
    ) -> Self {
        let mut primary_key = HashMap::new();
        primary_key.insert("id".to_string(), id.into());
        Self {
            op,
            table_name: table_name.into(),
            primary_key,
            value,
        }
    }

    /// Create an upsert op.
    pub fn upsert(table_name: impl Into<String>, id: impl Into<String>, value: Value) -> Self {
        Self::new(CrudKind::Upsert, table_name, id, value)
    }

    /// Create a delete op with an empty payload.
    pub fn delete(table_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(CrudKind::Delete, table_name, id, Value::Null)
    }

    /// Extract the external id as the single primary-key value.
    pub fn external_id(&self) -> AdapterResult<&str> {
        let mut values = self.primary_key.values();
        match (values.next(), values.next()) {
            (Some(id), None) => Ok(id),
            _ => Err(AdapterError::validation(format!(
                "expected exactly one primary key value, got {}",
                self.primary_key.len()
            ))),
        }
    }

    /// The name of the primary-key field, when there is exactly one.
    #[must_use]
    pub fn primary_key_field(&self) -> Option<&str> {
        if self.primary_key.len() == 1 {
            self.primary_key.keys().next().map(String::as_str)
        } else {
            None
        }
    }
}

/// Outcome of applying one [`CrudOp`] against one adapter.
///
/// A batch returns exactly one outcome per input op, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Canonical entity name.
    pub entity: String,

    /// External id the op addressed.
    #[serde(rename = "externalId")]
    pub external_id: String,

    /// The operation kind that was applied.
    pub operation: CrudKind,

    /// Whether the remote call succeeded.
    pub success: bool,

    /// Error message for failed operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    /// A successful outcome.
    pub fn ok(entity: impl Into<String>, external_id: impl Into<String>, op: CrudKind) -> Self {
        Self {
            entity: entity.into(),
            external_id: external_id.into(),
            operation: op,
            success: true,
            error: None,
        }
    }

    /// A failed outcome carrying the error message.
    pub fn failed(
        entity: impl Into<String>,
        external_id: impl Into<String>,
        op: CrudKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            external_id: external_id.into(),
            operation: op,
            success: false,
            error: Some(error.into()),
        }
    }
}
