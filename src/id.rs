//! Identifiers shared by every aggregate.
//!
//! `DomainId` is an opaque string id (GUIDs by default). Child aggregates are
//! stored under `DomainId::combine(app_id, id)`, which partitions storage per
//! tenant without a separate tenant column in the key space.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const COMBINE_SEPARATOR: &str = "--";

/// Opaque, globally unique identifier of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainId(String);

impl DomainId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Create a new random id.
    pub fn new_guid() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The empty id (nil GUID).
    pub fn empty() -> Self {
        Self(Uuid::nil().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.as_guid() == Some(Uuid::nil())
    }

    /// Build the storage id of an entity owned by `tenant`.
    pub fn combine(tenant: &DomainId, id: &DomainId) -> Self {
        Self(format!("{}{}{}", tenant.0, COMBINE_SEPARATOR, id.0))
    }

    /// Parse a route or user supplied value as a GUID id.
    pub fn parse_guid(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self::from)
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DomainId {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for DomainId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for DomainId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DomainId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An id paired with the display name used for name-based lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedId {
    pub id: DomainId,
    pub name: String,
}

impl NamedId {
    pub fn new(id: impl Into<DomainId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NamedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.id, self.name)
    }
}
