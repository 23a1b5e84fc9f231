//! In-memory link store
//!
//! Same semantics as the Postgres store, held in a process-local map.
//! Used by tests and by single-process deployments without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use steeple_adapter::types::AdapterKind;

use crate::link::ExternalLink;
use crate::store::{ExternalLinkStore, LinkStoreResult};

type LinkKey = (Uuid, AdapterKind, String);

/// Process-local [`ExternalLinkStore`].
#[derive(Default)]
pub struct MemoryExternalLinkStore {
    links: RwLock<HashMap<LinkKey, ExternalLink>>,
}

impl MemoryExternalLinkStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch one link by its unique key, deleted or not.
    pub async fn get(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> Option<ExternalLink> {
        self.links
            .read()
            .await
            .get(&(org_id, adapter, external_id.to_string()))
            .cloned()
    }

    /// Number of stored links, including soft-deleted ones.
    pub async fn len(&self) -> usize {
        self.links.read().await.len()
    }

    /// Whether the store holds no links.
    pub async fn is_empty(&self) -> bool {
        self.links.read().await.is_empty()
    }
}

#[async_trait]
impl ExternalLinkStore for MemoryExternalLinkStore {
    async fn links_for_entity(
        &self,
        org_id: Uuid,
        entity_id: &str,
    ) -> LinkStoreResult<Vec<ExternalLink>> {
        let links = self.links.read().await;
        let mut found: Vec<ExternalLink> = links
            .values()
            .filter(|l| l.org_id == org_id && l.entity_id == entity_id && !l.is_deleted())
            .cloned()
            .collect();
        found.sort_by_key(|l| l.created_at);
        Ok(found)
    }

    async fn find_entity_by_external_id(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<Option<String>> {
        let links = self.links.read().await;
        Ok(links
            .get(&(org_id, adapter, external_id.to_string()))
            .filter(|l| !l.is_deleted())
            .map(|l| l.entity_id.clone()))
    }

    async fn create_links(&self, new_links: &[ExternalLink]) -> LinkStoreResult<u64> {
        let mut links = self.links.write().await;
        let mut inserted = 0;
        for link in new_links {
            let key = (link.org_id, link.adapter, link.external_id.clone());
            // first writer wins: an existing mapping is never overwritten
            if let std::collections::hash_map::Entry::Vacant(slot) = links.entry(key) {
                slot.insert(link.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn update_link(&self, link: &ExternalLink) -> LinkStoreResult<()> {
        let mut links = self.links.write().await;
        let key = (link.org_id, link.adapter, link.external_id.clone());
        if let Some(existing) = links.get_mut(&key) {
            existing.entity_id = link.entity_id.clone();
            existing.entity_type = link.entity_type.clone();
            existing.syncing = link.syncing;
            existing.last_processed_at = link.last_processed_at;
            existing.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_link(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
        deleted_by: Option<&str>,
    ) -> LinkStoreResult<()> {
        let mut links = self.links.write().await;
        if let Some(link) = links.get_mut(&(org_id, adapter, external_id.to_string())) {
            if !link.is_deleted() {
                link.mark_deleted(deleted_by.map(str::to_string));
            }
        }
        Ok(())
    }

    async fn begin_sync(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<bool> {
        let mut links = self.links.write().await;
        match links.get_mut(&(org_id, adapter, external_id.to_string())) {
            Some(link) if !link.syncing && !link.is_deleted() => {
                link.syncing = true;
                link.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn finish_sync(
        &self,
        org_id: Uuid,
        adapter: AdapterKind,
        external_id: &str,
    ) -> LinkStoreResult<()> {
        let mut links = self.links.write().await;
        if let Some(link) = links.get_mut(&(org_id, adapter, external_id.to_string())) {
            link.syncing = false;
            link.last_processed_at = Some(Utc::now());
            link.updated_at = Utc::now();
        }
        Ok(())
    }
}
