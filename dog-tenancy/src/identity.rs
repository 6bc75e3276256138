//! Identity model: who is acting, which roles they hold and which tenants
//! they belong to.
//!
//! Every predicate here takes `Option<&Actor>`; a missing actor is an
//! unauthenticated caller and never satisfies any of them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::tenant::{AsTenantId, TenantId, TenantRef};

/// Opaque, stable actor identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Roles, ordered by privilege: `User < Admin < SuperAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super-admin",
        }
    }

    /// True when this role carries at least the capabilities of `other`.
    pub fn covers(&self, other: Role) -> bool {
        *self >= other
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller, as loaded by the surrounding framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: ActorId,
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub tenants: Vec<TenantRef>,
    #[serde(default)]
    pub active_tenant: Option<TenantRef>,
}

impl Actor {
    /// A plain `user` with no memberships.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(id),
            roles: BTreeSet::from([Role::User]),
            tenants: Vec::new(),
            active_tenant: None,
        }
    }

    pub fn with_roles<I: IntoIterator<Item = Role>>(mut self, roles: I) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn with_tenants<I, T>(mut self, tenants: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TenantRef>,
    {
        self.tenants = tenants.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_active_tenant(mut self, tenant: impl Into<TenantRef>) -> Self {
        self.active_tenant = Some(tenant.into());
        self
    }

    /// True when some held role covers `role`.
    pub fn holds_at_least(&self, role: Role) -> bool {
        self.highest_role().is_some_and(|held| held.covers(role))
    }

    pub fn is_super_admin(&self) -> bool {
        self.holds_at_least(Role::SuperAdmin)
    }

    pub fn is_admin(&self) -> bool {
        self.holds_at_least(Role::Admin)
    }

    /// Highest role held, if any.
    pub fn highest_role(&self) -> Option<Role> {
        self.roles.iter().next_back().copied()
    }

    pub fn belongs_to<T: AsTenantId + ?Sized>(&self, tenant: &T) -> bool {
        let wanted = tenant.tenant_id();
        self.tenants.iter().any(|t| t.tenant_id() == wanted)
    }

    /// Membership ids in insertion order.
    pub fn tenant_ids(&self) -> Vec<TenantId> {
        self.tenants.iter().map(|t| t.tenant_id().clone()).collect()
    }

    pub fn active_tenant_id(&self) -> Option<&TenantId> {
        self.active_tenant.as_ref().map(|t| t.tenant_id())
    }

    /// Apply an incoming write, producing the candidate document.
    pub fn merged_with(&self, patch: &ActorPatch) -> Actor {
        let mut next = self.clone();
        if let Some(roles) = &patch.roles {
            next.roles = roles.clone();
        }
        if let Some(tenants) = &patch.tenants {
            next.tenants = tenants.clone();
        }
        if let Some(active) = &patch.active_tenant {
            next.active_tenant = active.clone();
        }
        next
    }
}

/// An incoming actor write.
///
/// `None` means the write does not touch the field. For `active_tenant`,
/// `Some(None)` is an explicit null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeSet<Role>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenants: Option<Vec<TenantRef>>,
    #[serde(
        default,
        deserialize_with = "explicit_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_tenant: Option<Option<TenantRef>>,
}

impl ActorPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles<I: IntoIterator<Item = Role>>(mut self, roles: I) -> Self {
        self.roles = Some(roles.into_iter().collect());
        self
    }

    pub fn tenants<I, T>(mut self, tenants: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TenantRef>,
    {
        self.tenants = Some(tenants.into_iter().map(Into::into).collect());
        self
    }

    pub fn active_tenant(mut self, tenant: impl Into<TenantRef>) -> Self {
        self.active_tenant = Some(Some(tenant.into()));
        self
    }

    pub fn clear_active_tenant(mut self) -> Self {
        self.active_tenant = Some(None);
        self
    }

    /// The full document a create would store.
    pub fn into_actor(self, id: impl Into<String>) -> Actor {
        Actor {
            id: ActorId::new(id),
            roles: self.roles.unwrap_or_else(|| BTreeSet::from([Role::User])),
            tenants: self.tenants.unwrap_or_default(),
            active_tenant: self.active_tenant.flatten(),
        }
    }
}

// A present field (even `null`) deserializes to `Some(..)`; a missing one
// falls back to `default`.
fn explicit_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn is_super_admin(actor: Option<&Actor>) -> bool {
    actor.is_some_and(Actor::is_super_admin)
}

pub fn is_admin(actor: Option<&Actor>) -> bool {
    actor.is_some_and(Actor::is_admin)
}

/// True iff `tenant` is among the actor's memberships, compared by id.
pub fn belongs_to_tenant<T: AsTenantId + ?Sized>(actor: Option<&Actor>, tenant: &T) -> bool {
    actor.is_some_and(|a| a.belongs_to(tenant))
}
