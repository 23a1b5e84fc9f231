//! External links
//!
//! A link is the durable mapping between a canonical entity id and the id
//! the same record carries in one external system. Links also carry the
//! advisory `syncing` flag that serializes per-entity sync runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use steeple_adapter::types::AdapterKind;

/// One (org, adapter, external id) ↔ canonical id mapping.
///
/// The tuple (org_id, adapter, external_id) is unique. Links are soft
/// deleted, never removed, so the mapping history survives entity
/// removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLink {
    /// Row id.
    pub id: Uuid,

    /// Organization the link belongs to.
    pub org_id: Uuid,

    /// Canonical entity id.
    pub entity_id: String,

    /// Canonical entity type, e.g. "Person".
    pub entity_type: String,

    /// Which external system the id belongs to.
    pub adapter: AdapterKind,

    /// The id in the external system.
    pub external_id: String,

    /// Advisory flag: a sync run for this entity is in progress.
    pub syncing: bool,

    /// Last successful sync completion.
    pub last_processed_at: Option<DateTime<Utc>>,

    /// When the link was created.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,

    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,

    /// Who soft-deleted the link.
    pub deleted_by: Option<String>,
}

impl ExternalLink {
    /// Create a fresh link.
    #[must_use]
    pub fn new(
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id,
            entity_id: entity_id.into(),
            entity_type: entity_type.into(),
            adapter,
            external_id: external_id.into(),
            syncing: false,
            last_processed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
        }
    }

    /// Whether the link has been soft deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Soft delete the link.
    pub fn mark_deleted(&mut self, deleted_by: Option<String>) {
        self.deleted_at = Some(Utc::now());
        self.deleted_by = deleted_by;
        self.updated_at = Utc::now();
    }
}
