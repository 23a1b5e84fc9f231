//! # Adapter Framework
//!
//! Core abstractions for integrating the canonical entity store with
//! external Church Management Systems (ChMS) such as Planning Center
//! Online and Church Community Builder.
//!
//! ## Architecture
//!
//! Each provider implements [`AdapterOperations`], a capability trait
//! wrapping its HTTP surface. The framework supplies everything generic:
//!
//! - [`manifest`] - static registry of entities and their endpoints
//! - [`transform`] - bidirectional field mapping with a custom-fields bucket
//! - [`stream`] - pull-based paginated ingestion
//! - [`translator`] - canonical CRUD ops onto remote verbs
//! - [`registry`] - startup-built adapter lookup by closed [`AdapterKind`]
//!
//! ## Example
//!
//! ```ignore
//! use steeple_adapter::prelude::*;
//!
//! let registry = AdapterRegistry::builder()
//!     .register(pco_adapter)
//!     .build();
//!
//! let adapter = registry.get(AdapterKind::Pco)?;
//! let outcomes = adapter.sync_entity_data("Person", &ops).await?;
//! ```

pub mod config;
pub mod crud;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod stream;
pub mod token;
pub mod traits;
pub mod transform;
pub mod types;

pub mod translator;

pub use error::{AdapterError, AdapterResult};
pub use traits::AdapterOperations;
pub use types::AdapterKind;

/// Prelude module for convenient imports.
///
/// ```
/// use steeple_adapter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{AdapterConfig, ConnectionSettings};
    pub use crate::crud::{CrudOp, SyncOutcome};
    pub use crate::endpoint::{EndpointDefinition, EndpointDescriptor, HttpMethod};
    pub use crate::envelope::{ListEnvelope, SingleEnvelope};
    pub use crate::error::{AdapterError, AdapterResult};
    pub use crate::manifest::{EntityManifest, EntityManifestEntry};
    pub use crate::registry::AdapterRegistry;
    pub use crate::stream::{page_stream, PageLister, PageStream};
    pub use crate::token::OAuthToken;
    pub use crate::traits::{AdapterOperations, EntityClient, ListParams, PageHandler};
    pub use crate::transform::{FieldMap, FieldTransformer};
    pub use crate::types::{AdapterKind, CrudKind, RemoteOperation};
}

// Re-export async_trait for adapter implementors
pub use async_trait::async_trait;
