//! Active-tenant resolution.
//!
//! An actor's active tenant is either unset, a member of its tenant list, or
//! (transiently, mid-write) a tenant it no longer belongs to. Every actor
//! write passes through [`resolve_write`] before commit so the last state
//! never reaches storage: invalid selections are repaired to the first
//! membership, and an empty membership list clears the selection.
//!
//! Resolution is total and idempotent. It never fails.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::{Actor, ActorPatch};
use crate::tenant::{AsTenantId, TenantId, TenantRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActiveTenantState {
    Unset,
    SetValid,
    SetInvalid,
}

/// Outcome of one resolver pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub before: ActiveTenantState,
    pub after: ActiveTenantState,
    pub active_tenant: Option<TenantId>,
    /// The candidate selection was replaced.
    pub repaired: bool,
}

pub fn state_of(tenants: &[TenantRef], active: Option<&TenantRef>) -> ActiveTenantState {
    match active {
        None => ActiveTenantState::Unset,
        Some(active) => {
            let id = active.tenant_id();
            if tenants.iter().any(|t| t.tenant_id() == id) {
                ActiveTenantState::SetValid
            } else {
                ActiveTenantState::SetInvalid
            }
        }
    }
}

pub fn active_tenant_state(actor: &Actor) -> ActiveTenantState {
    state_of(&actor.tenants, actor.active_tenant.as_ref())
}

/// Pick the active tenant for a membership list and a candidate selection.
///
/// Empty list → `None`. A member candidate is kept as given (bare or
/// expanded). Anything else falls back to the first membership.
pub fn resolve_active_tenant(
    tenants: &[TenantRef],
    candidate: Option<&TenantRef>,
) -> Option<TenantRef> {
    let first = tenants.first()?;

    match candidate {
        Some(c) if tenants.iter().any(|t| t.tenant_id() == c.tenant_id()) => Some(c.clone()),
        _ => Some(TenantRef::Id(first.tenant_id().clone())),
    }
}

fn transition(tenants: &[TenantRef], candidate: Option<&TenantRef>) -> (Option<TenantRef>, Resolution) {
    let before = state_of(tenants, candidate);
    let resolved = resolve_active_tenant(tenants, candidate);
    let after = state_of(tenants, resolved.as_ref());

    let candidate_id = candidate.map(|c| c.tenant_id());
    let resolved_id = resolved.as_ref().map(|r| r.tenant_id().clone());
    let repaired = candidate_id != resolved_id.as_ref();

    (
        resolved,
        Resolution {
            before,
            after,
            active_tenant: resolved_id,
            repaired,
        },
    )
}

/// Repair a merged candidate document in place.
pub fn repair(actor: &mut Actor) -> Resolution {
    let (resolved, resolution) = transition(&actor.tenants, actor.active_tenant.as_ref());

    if resolution.repaired {
        debug!(
            "Repaired active tenant for actor {}: {:?} -> {:?}",
            actor.id,
            actor.active_tenant_id(),
            resolution.active_tenant
        );
    }

    actor.active_tenant = resolved;
    resolution
}

/// Resolve the active tenant of an incoming write against the stored actor.
///
/// Memberships come from the write, else from `existing`. The candidate is
/// the write's selection when it names one, else the stored selection (an
/// explicit `null` in the write does not override a stored value). The
/// resolved selection is always written back into the patch explicitly.
pub fn resolve_write(patch: &mut ActorPatch, existing: Option<&Actor>) -> Resolution {
    let tenants: &[TenantRef] = match (&patch.tenants, existing) {
        (Some(tenants), _) => tenants,
        (None, Some(actor)) => &actor.tenants,
        (None, None) => &[],
    };

    let candidate = patch
        .active_tenant
        .as_ref()
        .and_then(|a| a.as_ref())
        .or_else(|| existing.and_then(|a| a.active_tenant.as_ref()));

    let (resolved, resolution) = transition(tenants, candidate);

    if resolution.repaired {
        debug!(
            "Repaired active tenant on write for {}: {:?} -> {:?}",
            existing.map(|a| a.id.as_str()).unwrap_or("<new actor>"),
            candidate.map(|c| c.tenant_id()),
            resolution.active_tenant
        );
    }

    patch.active_tenant = Some(resolved);
    resolution
}
