//! Adapter framework type definitions
//!
//! Closed enums for adapter dispatch and CRUD operation kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The external ChMS an adapter integrates with.
///
/// A closed enum so that adding a provider forces every dispatch site to
/// handle it. The string form is the stable tag stored on external link
/// rows and on outbound mutation sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Planning Center Online
    Pco,
    /// Church Community Builder
    Ccb,
}

impl AdapterKind {
    /// Get all supported adapter kinds.
    #[must_use]
    pub fn all() -> &'static [AdapterKind] {
        &[AdapterKind::Pco, AdapterKind::Ccb]
    }

    /// Get the stable tag used in link rows and mutation sources.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Pco => "pco",
            AdapterKind::Ccb => "ccb",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdapterKind {
    type Err = ParseAdapterKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pco" => Ok(AdapterKind::Pco),
            "ccb" => Ok(AdapterKind::Ccb),
            _ => Err(ParseAdapterKindError(s.to_string())),
        }
    }
}

/// Error parsing an adapter kind from its tag.
#[derive(Debug, Clone)]
pub struct ParseAdapterKindError(String);

impl fmt::Display for ParseAdapterKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid adapter kind '{}', expected one of: pco, ccb",
            self.0
        )
    }
}

impl std::error::Error for ParseAdapterKindError {}

/// Kind of a requested canonical CRUD mutation.
///
/// Closed on purpose: an operation the engine does not support cannot be
/// represented past deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudKind {
    /// Create a new record; the remote system assigns its own id.
    Insert,
    /// Update an existing record by external id.
    Update,
    /// Insert-or-update; maps to the remote update verb.
    Upsert,
    /// Delete a record by external id.
    Delete,
}

impl CrudKind {
    /// Get the string representation used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CrudKind::Insert => "insert",
            CrudKind::Update => "update",
            CrudKind::Upsert => "upsert",
            CrudKind::Delete => "delete",
        }
    }
}

impl fmt::Display for CrudKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A remote operation an adapter endpoint can expose for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteOperation {
    /// Paginated listing.
    List,
    /// Fetch a single record by id.
    Get,
    /// Create a record.
    Create,
    /// Update a record.
    Update,
    /// Delete a record.
    Delete,
}

impl RemoteOperation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteOperation::List => "list",
            RemoteOperation::Get => "get",
            RemoteOperation::Create => "create",
            RemoteOperation::Update => "update",
            RemoteOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
