//! External link storage
//!
//! All link mutations go through this narrow interface so the uniqueness
//! and syncing-flag invariants are enforced in one place, never by ad hoc
//! queries.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use steeple_adapter::types::AdapterKind;

use crate::link::ExternalLink;

/// Link store errors.
#[derive(Debug, Error)]
pub enum LinkStoreError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored adapter tag no longer parses.
    #[error("corrupt adapter tag '{0}'")]
    CorruptAdapterTag(String),
}

/// Result type for link store operations.
pub type LinkStoreResult<T> = Result<T, LinkStoreError>;

/// Durable store for external links.
#[async_trait]
pub trait ExternalLinkStore: Send + Sync {
    /// All live links for a canonical entity.
    async fn links_for_entity(
        &self,
        org_id: Uuid,
        entity_id: &str,
    ) -> LinkStoreResult<Vec<ExternalLink>>;

    /// Resolve the canonical id mapped to an external id, if linked.
    async fn find_entity_by_external_id(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<Option<String>>;

    /// Insert links; an existing (org, adapter, external id) row is left
    /// untouched. Returns the number of rows actually inserted.
    async fn create_links(&self, links: &[ExternalLink]) -> LinkStoreResult<u64>;

    /// Update a link row in place.
    async fn update_link(&self, link: &ExternalLink) -> LinkStoreResult<()>;

    /// Soft-delete a link. A missing row is a no-op.
    async fn delete_link(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
        deleted_by: Option<&str>,
    ) -> LinkStoreResult<()>;

    /// Atomically flip `syncing` from false to true.
    ///
    /// Returns false when the link is missing, deleted, or already
    /// syncing; callers short-circuit instead of double-running.
    async fn begin_sync(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<bool>;

    /// Release the `syncing` flag and stamp `last_processed_at`.
    ///
    /// Callers pair this with `begin_sync` on every exit path.
    async fn finish_sync(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<()>;
}

/// Postgres-backed link store.
pub struct PgExternalLinkStore {
    pool: PgPool,
}

impl PgExternalLinkStore {
    /// Create a store over a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_link(row: &sqlx::postgres::PgRow) -> LinkStoreResult<ExternalLink> {
        let tag: String = row.get("adapter");
        let adapter = tag
            .parse::<AdapterKind>()
            .map_err(|_| LinkStoreError::CorruptAdapterTag(tag))?;
        Ok(ExternalLink {
            id: row.get("id"),
            org_id: row.get("org_id"),
            entity_id: row.get("entity_id"),
            entity_type: row.get("entity_type"),
            adapter,
            external_id: row.get("external_id"),
            syncing: row.get("syncing"),
            last_processed_at: row.get("last_processed_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
            deleted_by: row.get("deleted_by"),
        })
    }
}

#[async_trait]
impl ExternalLinkStore for PgExternalLinkStore {
    #[instrument(skip(self))]
    async fn links_for_entity(
        &self,
        org_id: Uuid,
        entity_id: &str,
    ) -> LinkStoreResult<Vec<ExternalLink>> {
        let rows = sqlx::query(
            r"
            SELECT id, org_id, entity_id, entity_type, adapter, external_id,
                   syncing, last_processed_at, created_at, updated_at,
                   deleted_at, deleted_by
            FROM chms_external_links
            WHERE org_id = $1 AND entity_id = $2 AND deleted_at IS NULL
            ORDER BY created_at
            ",
        )
        .bind(org_id)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_link).collect()
    }

    #[instrument(skip(self))]
    async fn find_entity_by_external_id(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<Option<String>> {
        let row = sqlx::query(
            r"
            SELECT entity_id
            FROM chms_external_links
            WHERE org_id = $1 AND adapter = $2 AND external_id = $3
              AND deleted_at IS NULL
            ",
        )
        .bind(org_id)
        .bind(adapter.as_str())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("entity_id")))
    }

    #[instrument(skip(self, links))]
    async fn create_links(&self, links: &[ExternalLink]) -> LinkStoreResult<u64> {
        let mut inserted = 0;
        for link in links {
            let result = sqlx::query(
                r"
                INSERT INTO chms_external_links (
                    id, org_id, entity_id, entity_type, adapter, external_id,
                    syncing, last_processed_at, created_at, updated_at,
                    deleted_at, deleted_by
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (org_id, adapter, external_id) DO NOTHING
                ",
            )
            .bind(link.id)
            .bind(link.org_id)
            .bind(&link.entity_id)
            .bind(&link.entity_type)
            .bind(link.adapter.as_str())
            .bind(&link.external_id)
            .bind(link.syncing)
            .bind(link.last_processed_at)
            .bind(link.created_at)
            .bind(link.updated_at)
            .bind(link.deleted_at)
            .bind(&link.deleted_by)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    #[instrument(skip(self, link))]
    async fn update_link(&self, link: &ExternalLink) -> LinkStoreResult<()> {
        sqlx::query(
            r"
            UPDATE chms_external_links
            SET entity_id = $4, entity_type = $5, syncing = $6,
                last_processed_at = $7, updated_at = NOW()
            WHERE org_id = $1 AND adapter = $2 AND external_id = $3
            ",
        )
        .bind(link.org_id)
        .bind(link.adapter.as_str())
        .bind(&link.external_id)
        .bind(&link.entity_id)
        .bind(&link.entity_type)
        .bind(link.syncing)
        .bind(link.last_processed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_link(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
        deleted_by: Option<&str>,
    ) -> LinkStoreResult<()> {
        sqlx::query(
            r"
            UPDATE chms_external_links
            SET deleted_at = NOW(), deleted_by = $4, updated_at = NOW()
            WHERE org_id = $1 AND adapter = $2 AND external_id = $3
              AND deleted_at IS NULL
            ",
        )
        .bind(org_id)
        .bind(adapter.as_str())
        .bind(external_id)
        .bind(deleted_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn begin_sync(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<bool> {
        // Conditional flip: zero affected rows means a concurrent run
        // already holds the flag (or the link is gone).
        let result = sqlx::query(
            r"
            UPDATE chms_external_links
            SET syncing = TRUE, updated_at = NOW()
            WHERE org_id = $1 AND adapter = $2 AND external_id = $3
              AND syncing = FALSE AND deleted_at IS NULL
            ",
        )
        .bind(org_id)
        .bind(adapter.as_str())
        .bind(external_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn finish_sync(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<()> {
        sqlx::query(
            r"
            UPDATE chms_external_links
            SET syncing = FALSE, last_processed_at = NOW(), updated_at = NOW()
            WHERE org_id = $1 AND adapter = $2 AND external_id = $3
            ",
        )
        .bind(org_id)
        .bind(adapter.as_str())
        .bind(external_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
