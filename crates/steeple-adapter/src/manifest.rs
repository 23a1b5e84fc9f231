//! Entity manifest
//!
//! Static registry of the entities an adapter integrates, folded once at
//! startup from per-operation endpoint definitions and then read-only.

use std::collections::HashMap;

use crate::endpoint::{EndpointDefinition, EndpointDescriptor};
use crate::transform::FieldTransformer;
use crate::types::RemoteOperation;

/// Everything the engine knows about one canonical entity type.
#[derive(Debug, Clone)]
pub struct EntityManifestEntry {
    /// Canonical entity name, e.g. "Person".
    pub name: String,

    /// Module grouping, e.g. "people".
    pub module: String,

    /// External type tag on the wire.
    pub external_type: String,

    /// Available remote operations.
    pub endpoints: HashMap<RemoteOperation, EndpointDescriptor>,

    /// Bidirectional field transformer.
    pub transformer: FieldTransformer,

    /// Exclude this entity from synchronization.
    pub skip_sync: bool,
}

impl EntityManifestEntry {
    /// The descriptor for a remote operation, if the adapter exposes it.
    #[must_use]
    pub fn endpoint(&self, op: RemoteOperation) -> Option<&EndpointDescriptor> {
        self.endpoints.get(&op)
    }

    /// Whether the adapter exposes a remote operation for this entity.
    #[must_use]
    pub fn supports(&self, op: RemoteOperation) -> bool {
        self.endpoints.contains_key(&op)
    }

    /// The canonical-store table name for this entity (its module).
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.module
    }
}

/// Immutable registry of manifest entries, keyed by entity name.
///
/// Built explicitly during process initialization and passed by reference;
/// safe for concurrent reads without locking.
#[derive(Debug, Clone, Default)]
pub struct EntityManifest {
    entries: HashMap<String, EntityManifestEntry>,
}

impl EntityManifest {
    /// Fold a list of per-operation endpoint definitions into a manifest.
    ///
    /// Definitions are grouped by entity name. The first definition seen
    /// for an entity supplies its module, external type, and field map;
    /// `skip_sync` is true if any of the entity's endpoints declares it.
    #[must_use]
    pub fn from_definitions(definitions: Vec<EndpointDefinition>) -> Self {
        let mut entries: HashMap<String, EntityManifestEntry> = HashMap::new();

        for def in definitions {
            match entries.get_mut(&def.entity) {
                Some(entry) => {
                    entry.skip_sync |= def.descriptor.skip_sync;
                    entry.endpoints.insert(def.operation, def.descriptor);
                }
                None => {
                    let skip_sync = def.descriptor.skip_sync;
                    let mut endpoints = HashMap::new();
                    endpoints.insert(def.operation, def.descriptor);
                    entries.insert(
                        def.entity.clone(),
                        EntityManifestEntry {
                            name: def.entity,
                            module: def.module,
                            external_type: def.external_type,
                            endpoints,
                            transformer: FieldTransformer::new(def.fields),
                            skip_sync,
                        },
                    );
                }
            }
        }

        Self { entries }
    }

    /// Look up an entry by canonical entity name.
    #[must_use]
    pub fn get(&self, entity: &str) -> Option<&EntityManifestEntry> {
        self.entries.get(entity)
    }

    /// Look up an entry by its external type tag.
    #[must_use]
    pub fn find_by_external_type(&self, external_type: &str) -> Option<&EntityManifestEntry> {
        self.entries
            .values()
            .find(|e| e.external_type == external_type)
    }

    /// Iterate over all entries.
    pub fn entries(&self) -> impl Iterator<Item = &EntityManifestEntry> {
        self.entries.values()
    }

    /// Whether an entity is flagged to skip synchronization.
    ///
    /// Unknown entities are not skipped; callers distinguish "unknown"
    /// via [`EntityManifest::get`].
    #[must_use]
    pub fn is_skip_sync(&self, entity: &str) -> bool {
        self.entries.get(entity).is_some_and(|e| e.skip_sync)
    }

    /// Number of entities in the manifest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::HttpMethod;
    use crate::transform::FieldMap;

    fn definition(
        entity: &str,
        op: RemoteOperation,
        descriptor: EndpointDescriptor,
    ) -> EndpointDefinition {
        EndpointDefinition {
            entity: entity.to_string(),
            module: "people".to_string(),
            external_type: entity.to_string(),
            operation: op,
            descriptor,
            fields: FieldMap::new().map("first_name", "firstName"),
        }
    }

    #[test]
    fn test_fold_groups_by_entity() {
        let manifest = EntityManifest::from_definitions(vec![
            definition(
                "Person",
                RemoteOperation::List,
                EndpointDescriptor::new(HttpMethod::Get, "/people/v2/people"),
            ),
            definition(
                "Person",
                RemoteOperation::Update,
                EndpointDescriptor::new(HttpMethod::Patch, "/people/v2/people/:person_id"),
            ),
            definition(
                "Address",
                RemoteOperation::List,
                EndpointDescriptor::new(HttpMethod::Get, "/people/v2/addresses"),
            ),
        ]);

        assert_eq!(manifest.len(), 2);
        let person = manifest.get("Person").unwrap();
        assert!(person.supports(RemoteOperation::List));
        assert!(person.supports(RemoteOperation::Update));
        assert!(!person.supports(RemoteOperation::Delete));
    }

    #[test]
    fn test_skip_sync_any_endpoint_wins() {
        let manifest = EntityManifest::from_definitions(vec![
            definition(
                "Campus",
                RemoteOperation::List,
                EndpointDescriptor::new(HttpMethod::Get, "/people/v2/campuses"),
            ),
            definition(
                "Campus",
                RemoteOperation::Get,
                EndpointDescriptor::new(HttpMethod::Get, "/people/v2/campuses/:campus_id")
                    .with_skip_sync(),
            ),
        ]);

        assert!(manifest.is_skip_sync("Campus"));
        assert!(!manifest.is_skip_sync("Person"));
    }

    #[test]
    fn test_find_by_external_type() {
        let manifest = EntityManifest::from_definitions(vec![definition(
            "Person",
            RemoteOperation::List,
            EndpointDescriptor::new(HttpMethod::Get, "/people/v2/people"),
        )]);

        assert!(manifest.find_by_external_type("Person").is_some());
        assert!(manifest.find_by_external_type("Donation").is_none());
    }
}
