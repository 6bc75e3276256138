//! Session claims.
//!
//! Every token carries the actor's roles, tenant ids and active tenant as
//! they were persisted at issuance. Claims are always rebuilt from the
//! stored actor, never from a previous token.

use std::collections::BTreeSet;

use chrono::Utc;
use dog_tenancy::{Actor, AsTenantId, Role, TenantId, TenantRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::options::JwtOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// Actor id.
    pub sub: String,
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub tenants: Vec<TenantId>,
    #[serde(default)]
    pub active_tenant: Option<TenantId>,
    pub iss: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl SessionClaims {
    pub fn for_actor(actor: &Actor, jwt: &JwtOptions) -> Self {
        Self::issued_at(actor, jwt, Utc::now().timestamp())
    }

    pub fn issued_at(actor: &Actor, jwt: &JwtOptions, now: i64) -> Self {
        let ttl = i64::try_from(jwt.access_token_expires_in.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: actor.id.as_str().to_string(),
            roles: actor.roles.clone(),
            tenants: actor.tenant_ids(),
            active_tenant: actor.active_tenant_id().cloned(),
            iss: jwt.issuer.clone(),
            aud: jwt.audience.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// The actor snapshot decisions run against.
    pub fn to_actor(&self) -> Actor {
        let actor = Actor::new(self.sub.clone())
            .with_roles(self.roles.iter().copied())
            .with_tenants(self.tenants.iter().cloned().map(TenantRef::Id));
        match &self.active_tenant {
            Some(active) => actor.with_active_tenant(active.clone()),
            None => actor,
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// True when roles, memberships and selection match `actor`.
    pub fn matches(&self, actor: &Actor) -> bool {
        self.sub == actor.id.as_str()
            && self.roles == actor.roles
            && self.tenants.len() == actor.tenants.len()
            && self
                .tenants
                .iter()
                .zip(&actor.tenants)
                .all(|(c, t)| c == t.tenant_id())
            && self.active_tenant.as_ref() == actor.active_tenant_id()
    }
}
