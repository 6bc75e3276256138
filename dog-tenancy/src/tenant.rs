//! Tenant identifiers, records and references.
//!
//! A tenant reference may arrive as a bare id or as an expanded record,
//! depending on how deep the storage layer populated the relationship.
//! Everything that compares tenants goes through [`AsTenantId`] /
//! [`resolve_tenant_id`] first.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque, stable tenant identifier.
///
/// Stores may key tenants by integer; those ids are read into their string
/// form so `1` and `"1"` name the same tenant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl<'de> Deserialize<'de> for TenantId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TenantIdVisitor;

        impl Visitor<'_> for TenantIdVisitor {
            type Value = TenantId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a tenant id (string or integer)")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TenantId, E> {
                Ok(TenantId::from(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<TenantId, E> {
                Ok(TenantId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TenantId, E> {
                Ok(TenantId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TenantId, E> {
                Ok(TenantId(v.to_string()))
            }
        }

        deserializer.deserialize_any(TenantIdVisitor)
    }
}

impl TenantId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A tenant registry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    #[serde(default)]
    pub name: String,
    /// Globally unique, URL-safe. Uniqueness is enforced by storage.
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Tenant {
    pub fn new(id: impl Into<TenantId>, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A relationship to a tenant: either unpopulated or expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TenantRef {
    Id(TenantId),
    Expanded(Tenant),
}

impl From<TenantId> for TenantRef {
    fn from(id: TenantId) -> Self {
        TenantRef::Id(id)
    }
}

impl From<&str> for TenantRef {
    fn from(id: &str) -> Self {
        TenantRef::Id(TenantId::from(id))
    }
}

impl From<Tenant> for TenantRef {
    fn from(tenant: Tenant) -> Self {
        TenantRef::Expanded(tenant)
    }
}

/// Anything that names a tenant.
pub trait AsTenantId {
    fn tenant_id(&self) -> &TenantId;
}

impl AsTenantId for TenantId {
    fn tenant_id(&self) -> &TenantId {
        self
    }
}

impl AsTenantId for Tenant {
    fn tenant_id(&self) -> &TenantId {
        &self.id
    }
}

impl AsTenantId for TenantRef {
    fn tenant_id(&self) -> &TenantId {
        match self {
            TenantRef::Id(id) => id,
            TenantRef::Expanded(tenant) => &tenant.id,
        }
    }
}

impl<T: AsTenantId + ?Sized> AsTenantId for &T {
    fn tenant_id(&self) -> &TenantId {
        (**self).tenant_id()
    }
}

/// Normalize an optional reference to a bare id.
pub fn resolve_tenant_id<T: AsTenantId>(tenant: Option<&T>) -> Option<&TenantId> {
    tenant.map(|t| t.tenant_id())
}

/// Read a tenant id out of a raw JSON field value.
///
/// Accepts a string id, a numeric id, or an expanded object with an `id`.
pub fn tenant_id_from_value(value: &serde_json::Value) -> Option<TenantId> {
    use serde_json::Value;

    match value {
        Value::String(s) if !s.is_empty() => Some(TenantId(s.clone())),
        Value::Number(n) => Some(TenantId(n.to_string())),
        Value::Object(map) => map.get("id").and_then(tenant_id_from_value),
        _ => None,
    }
}
