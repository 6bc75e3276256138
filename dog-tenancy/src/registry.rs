use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::TenancyConfig;
use crate::decision::{Decision, Filter, FilterField};
use crate::directory::{actor_directory, tenant_directory};
use crate::engine::{field_restricted_to_super_admin, tenant_scoped, AccessRequest};
use crate::errors::AccessError;
use crate::guard::{ROLES_FIELD, TENANTS_FIELD};
use crate::identity::Actor;
use crate::tenant::{AsTenantId, TenantRef};

/// Which rule set governs a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFamily {
    /// Documents owned by exactly one tenant (pages, posts, media, ...).
    TenantScoped,
    /// The tenant registry itself.
    TenantDirectory,
    /// The actor (user) registry.
    ActorDirectory,
}

/// Maps collection names to their access rules.
///
/// This is what the framework calls on every inbound operation: collection
/// name plus `{actor, operation, target}` in, decision out.
#[derive(Debug, Clone)]
pub struct AccessRegistry {
    collections: HashMap<String, ResourceFamily>,
    tenant_field: String,
}

impl AccessRegistry {
    /// An empty registry.
    pub fn new(tenant_field: impl Into<String>) -> Self {
        Self {
            collections: HashMap::new(),
            tenant_field: tenant_field.into(),
        }
    }

    pub fn from_config(cfg: &TenancyConfig) -> Self {
        let mut registry = Self::new(cfg.tenant_field.clone());
        for name in &cfg.tenant_scoped_collections {
            registry.register(name.clone(), ResourceFamily::TenantScoped);
        }
        registry.register(cfg.tenant_collection.clone(), ResourceFamily::TenantDirectory);
        registry.register(cfg.actor_collection.clone(), ResourceFamily::ActorDirectory);
        registry
    }

    pub fn with_defaults() -> Self {
        Self::from_config(&TenancyConfig::default())
    }

    pub fn register<S>(&mut self, name: S, family: ResourceFamily)
    where
        S: Into<String>,
    {
        self.collections.insert(name.into(), family);
    }

    pub fn family(&self, collection: &str) -> Option<ResourceFamily> {
        self.collections.get(collection).copied()
    }

    pub fn tenant_field(&self) -> &str {
        &self.tenant_field
    }

    /// Document-level decision for `collection`.
    ///
    /// Unknown collections are a configuration error (`NotFound`), not a
    /// denial.
    pub fn decide(&self, collection: &str, request: &AccessRequest<'_>) -> Result<Decision, AccessError> {
        let family = self.family(collection).ok_or_else(|| {
            AccessError::not_found(format!("No access policy registered for collection '{collection}'"))
        })?;

        let decision = match family {
            ResourceFamily::TenantScoped => tenant_scoped(request),
            ResourceFamily::TenantDirectory => tenant_directory(request)?,
            ResourceFamily::ActorDirectory => actor_directory(request),
        };

        trace!("{collection}.{} -> {}", request.operation, decision.kind());
        Ok(decision)
    }

    /// Field-level write permission. Fields without a rule are open.
    pub fn field_access(&self, collection: &str, field: &str, actor: Option<&Actor>) -> Decision {
        let restricted = match self.family(collection) {
            Some(ResourceFamily::TenantScoped) => field == self.tenant_field,
            Some(ResourceFamily::ActorDirectory) => field == ROLES_FIELD || field == TENANTS_FIELD,
            Some(ResourceFamily::TenantDirectory) | None => false,
        };

        if restricted {
            field_restricted_to_super_admin(actor)
        } else {
            Decision::Allow
        }
    }
}

impl Default for AccessRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Values an actor may pick as active tenant: its own memberships.
///
/// No memberships gives `id in []`, which matches nothing.
pub fn active_tenant_options(tenants: &[TenantRef]) -> Filter {
    Filter::one_of(FilterField::Id, tenants.iter().map(|t| t.tenant_id().0.clone()))
}
