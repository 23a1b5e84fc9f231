//! Field transformation
//!
//! Pure bidirectional mapping between an adapter's wire shape and the
//! canonical shape, with a catch-all `custom_fields` bucket for external
//! attributes the canonical schema does not model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdapterError, AdapterResult};

/// Canonical bucket for unmapped external attributes.
pub const CUSTOM_FIELDS: &str = "custom_fields";

/// A single external ↔ canonical field pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Attribute name on the external wire.
    pub external: String,
    /// Attribute name in the canonical shape.
    pub canonical: String,
}

/// Declarative field mapping for one entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldMap {
    mappings: Vec<FieldMapping>,
}

impl FieldMap {
    /// Create an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mappings: Vec::new(),
        }
    }

    /// Add a pairing, builder style.
    #[must_use]
    pub fn map(mut self, external: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.mappings.push(FieldMapping {
            external: external.into(),
            canonical: canonical.into(),
        });
        self
    }

    /// Iterate over the pairings.
    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.mappings.iter()
    }

    fn canonical_for(&self, external: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.external == external)
            .map(|m| m.canonical.as_str())
    }

    fn external_for(&self, canonical: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.canonical == canonical)
            .map(|m| m.external.as_str())
    }
}

/// Bidirectional transformer over a [`FieldMap`].
#[derive(Debug, Clone)]
pub struct FieldTransformer {
    fields: FieldMap,
}

impl FieldTransformer {
    /// Create a transformer for the given field map.
    #[must_use]
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// Get the underlying field map.
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Transform an external record into the canonical shape.
    ///
    /// Mapped attributes are renamed; everything else lands in the
    /// `custom_fields` bucket so no external data is dropped.
    pub fn to_canonical(&self, external: &Value) -> AdapterResult<Value> {
        let obj = as_object(external)?;

        let mut canonical = Map::new();
        let mut custom = Map::new();
        for (key, value) in obj {
            match self.fields.canonical_for(key) {
                Some(name) => {
                    canonical.insert(name.to_string(), value.clone());
                }
                None => {
                    custom.insert(key.clone(), value.clone());
                }
            }
        }
        if !custom.is_empty() {
            canonical.insert(CUSTOM_FIELDS.to_string(), Value::Object(custom));
        }
        Ok(Value::Object(canonical))
    }

    /// Transform a canonical record into the external wire shape.
    ///
    /// A partial transform (updates) emits only the supplied fields; a full
    /// transform emits every mapped external attribute, null when absent,
    /// so creates carry the complete wire shape. Canonical attributes
    /// outside the map and the `custom_fields` bucket are a schema
    /// mismatch.
    pub fn to_external(&self, canonical: &Value, partial: bool) -> AdapterResult<Value> {
        let obj = as_object(canonical)?;

        let mut external = Map::new();
        for (key, value) in obj {
            if key == CUSTOM_FIELDS {
                let bucket = as_object(value)?;
                for (k, v) in bucket {
                    external.insert(k.clone(), v.clone());
                }
                continue;
            }
            match self.fields.external_for(key) {
                Some(name) => {
                    external.insert(name.to_string(), value.clone());
                }
                None => {
                    return Err(AdapterError::validation(format!(
                        "canonical field '{key}' has no external mapping"
                    )));
                }
            }
        }

        if !partial {
            for mapping in self.fields.iter() {
                external
                    .entry(mapping.external.clone())
                    .or_insert(Value::Null);
            }
        }

        Ok(Value::Object(external))
    }
}

fn as_object(value: &Value) -> AdapterResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AdapterError::validation("expected a JSON object"))
}
