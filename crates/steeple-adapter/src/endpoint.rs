//! Endpoint descriptors
//!
//! The hand-off shape from the endpoint-definition layer: one descriptor per
//! remote operation, grouped by entity into the manifest.

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, AdapterResult};
use crate::transform::FieldMap;
use crate::types::RemoteOperation;

/// HTTP method for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Descriptor for one remote REST endpoint.
///
/// Path templates use `:param` segments, e.g.
/// `/people/v2/people/:person_id/addresses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// HTTP method.
    pub method: HttpMethod,

    /// Path template with `:param` segments.
    pub path: String,

    /// Fields accepted as query filters.
    #[serde(default)]
    pub queryable: Vec<String>,

    /// Fields accepted for ordering.
    #[serde(default)]
    pub orderable: Vec<String>,

    /// Fields accepted on create.
    #[serde(default)]
    pub creatable: Vec<String>,

    /// Fields accepted on update.
    #[serde(default)]
    pub updatable: Vec<String>,

    /// Related resources that can be side-loaded.
    #[serde(default)]
    pub includes: Vec<String>,

    /// Exclude this entity from synchronization.
    #[serde(default)]
    pub skip_sync: bool,
}

impl EndpointDescriptor {
    /// Create a descriptor for the given method and path template.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            queryable: Vec::new(),
            orderable: Vec::new(),
            creatable: Vec::new(),
            updatable: Vec::new(),
            includes: Vec::new(),
            skip_sync: false,
        }
    }

    /// Mark the entity as excluded from synchronization.
    #[must_use]
    pub fn with_skip_sync(mut self) -> Self {
        self.skip_sync = true;
        self
    }
}

/// One per-operation definition consumed from the endpoint-definition layer.
///
/// Definitions for the same entity are folded into a single manifest entry;
/// the first definition seen for an entity supplies its external type tag
/// and field map.
#[derive(Debug, Clone)]
pub struct EndpointDefinition {
    /// Canonical entity name, e.g. "Person".
    pub entity: String,

    /// Module grouping, e.g. "people".
    pub module: String,

    /// External type tag on the wire, e.g. "Person" in a JSON:API `type`.
    pub external_type: String,

    /// The remote operation this endpoint implements.
    pub operation: RemoteOperation,

    /// The endpoint itself.
    pub descriptor: EndpointDescriptor,

    /// Bidirectional field mapping between external and canonical shapes.
    pub fields: FieldMap,
}

/// Derive the adapter path parameter name for an entity.
///
/// `Person` → `person_id`, `PhoneNumber` → `phone_number_id`.
#[must_use]
pub fn path_param_name(entity: &str) -> String {
    let mut out = String::with_capacity(entity.len() + 4);
    for (i, c) in entity.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out.push_str("_id");
    out
}

/// Substitute a `:param` segment in a path template.
///
/// Fails with a validation error if the template still contains an
/// unfilled parameter afterwards, which indicates a descriptor the caller
/// cannot address with a single id.
pub fn fill_path(template: &str, param: &str, value: &str) -> AdapterResult<String> {
    let needle = format!(":{param}");
    let filled = template.replace(&needle, value);
    if filled.contains(':') {
        return Err(AdapterError::validation(format!(
            "path template '{template}' has unfilled parameters"
        )));
    }
    Ok(filled)
}
