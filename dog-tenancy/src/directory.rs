//! Policies for the two registries that are not tenant-scoped data: the
//! tenant directory itself and the actor (user) directory.

use tracing::warn;

use crate::decision::{Decision, Filter, FilterField};
use crate::engine::{AccessRequest, Operation};
use crate::errors::AccessError;
use crate::identity::Actor;
use crate::tenant::{AsTenantId, TenantId};

/// Create/delete rule shared by both directories.
pub fn super_admin_only(actor: Option<&Actor>) -> Decision {
    Decision::from_bool(actor.is_some_and(Actor::is_super_admin))
}

// ──────────────────────────────────────────────────────────────
// Tenant directory
// ──────────────────────────────────────────────────────────────

/// Actors see every tenant they belong to, active or not.
pub fn tenants_read(actor: Option<&Actor>) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny;
    };
    if actor.is_super_admin() {
        return Decision::Allow;
    }
    if actor.tenants.is_empty() {
        return Decision::Deny;
    }
    let ids = actor.tenants.iter().map(|t| t.tenant_id().0.clone());
    Decision::FilterBy(Filter::one_of(FilterField::Id, ids))
}

/// Admins may update tenants they are members of.
pub fn tenants_update(actor: Option<&Actor>, target: &TenantId) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny;
    };
    if actor.is_super_admin() {
        return Decision::Allow;
    }
    Decision::from_bool(actor.is_admin() && actor.belongs_to(target))
}

/// Dispatch for the tenant directory.
///
/// Update only needs the target id for the admin-membership check; an admin
/// update without one is caller misuse and returns `BadRequest` rather than
/// a policy decision.
pub fn tenant_directory(request: &AccessRequest<'_>) -> Result<Decision, AccessError> {
    match request.operation {
        Operation::Read => Ok(tenants_read(request.actor)),
        Operation::Create | Operation::Delete => Ok(super_admin_only(request.actor)),
        Operation::Update => {
            match request.actor {
                None => return Ok(Decision::Deny),
                Some(a) if a.is_super_admin() => return Ok(Decision::Allow),
                Some(a) if !a.is_admin() => return Ok(Decision::Deny),
                Some(_) => {}
            }
            let Some(target) = request.target else {
                warn!("tenant update decision requested without a target id");
                return Err(AccessError::bad_request(
                    "A tenant update decision requires a target tenant id",
                ));
            };
            Ok(tenants_update(request.actor, &TenantId::from(target)))
        }
    }
}

// ──────────────────────────────────────────────────────────────
// Actor directory
// ──────────────────────────────────────────────────────────────

fn self_only(actor: &Actor) -> Decision {
    Decision::FilterBy(Filter::equals(FilterField::Id, actor.id.as_str()))
}

/// Actors can always read themselves.
pub fn actors_read(actor: Option<&Actor>) -> Decision {
    match actor {
        None => Decision::Deny,
        Some(a) if a.is_super_admin() => Decision::Allow,
        Some(a) => self_only(a),
    }
}

/// Self-service updates. Field guards still apply to `roles`/`tenants`.
pub fn actors_update(actor: Option<&Actor>) -> Decision {
    match actor {
        None => Decision::Deny,
        Some(a) if a.is_super_admin() => Decision::Allow,
        Some(a) => self_only(a),
    }
}

pub fn actor_directory(request: &AccessRequest<'_>) -> Decision {
    match request.operation {
        Operation::Read => actors_read(request.actor),
        Operation::Update => actors_update(request.actor),
        Operation::Create | Operation::Delete => super_admin_only(request.actor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::identity::Role;

    #[test]
    fn members_see_all_their_tenants() {
        let actor = Actor::new("u").with_tenants(["t1", "t2"]).with_active_tenant("t1");

        assert_eq!(
            tenants_read(Some(&actor)),
            Decision::FilterBy(Filter::one_of(FilterField::Id, ["t1", "t2"]))
        );
        assert_eq!(tenants_read(Some(&Actor::new("lonely"))), Decision::Deny);
        assert_eq!(tenants_read(None), Decision::Deny);
    }

    #[test]
    fn admins_update_only_their_own_tenants() {
        let admin = Actor::new("a").with_roles([Role::Admin]).with_tenants(["t1"]);
        let user = Actor::new("u").with_tenants(["t1"]);

        assert_eq!(tenants_update(Some(&admin), &TenantId::from("t1")), Decision::Allow);
        assert_eq!(tenants_update(Some(&admin), &TenantId::from("t2")), Decision::Deny);
        assert_eq!(tenants_update(Some(&user), &TenantId::from("t1")), Decision::Deny);
    }

    #[test]
    fn update_without_target_is_misuse() {
        let admin = Actor::new("a").with_roles([Role::Admin]);
        let err = tenant_directory(&AccessRequest::new(Some(&admin), Operation::Update)).unwrap_err();

        assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn update_without_target_still_decides_when_the_id_is_irrelevant() {
        let root = Actor::new("r").with_roles([Role::SuperAdmin]);
        let user = Actor::new("u").with_tenants(["t1"]);
        let untargeted = |actor: Option<&Actor>| tenant_directory(&AccessRequest::new(actor, Operation::Update));

        assert_eq!(untargeted(Some(&root)).unwrap(), Decision::Allow);
        assert_eq!(untargeted(None).unwrap(), Decision::Deny);
        assert_eq!(untargeted(Some(&user)).unwrap(), Decision::Deny);
    }

    #[test]
    fn only_super_admins_create_or_delete_tenants() {
        let admin = Actor::new("a").with_roles([Role::Admin]).with_tenants(["t1"]);
        let root = Actor::new("r").with_roles([Role::SuperAdmin]);

        for op in [Operation::Create, Operation::Delete] {
            assert_eq!(tenant_directory(&AccessRequest::new(Some(&admin), op)).unwrap(), Decision::Deny);
            assert_eq!(tenant_directory(&AccessRequest::new(Some(&root), op)).unwrap(), Decision::Allow);
        }
    }

    #[test]
    fn actors_are_confined_to_themselves() {
        let admin = Actor::new("a1").with_roles([Role::Admin]);

        assert_eq!(
            actor_directory(&AccessRequest::new(Some(&admin), Operation::Read)),
            Decision::FilterBy(Filter::equals(FilterField::Id, "a1"))
        );
        assert_eq!(
            actor_directory(&AccessRequest::new(Some(&admin), Operation::Update)),
            Decision::FilterBy(Filter::equals(FilterField::Id, "a1"))
        );
        assert_eq!(actor_directory(&AccessRequest::new(Some(&admin), Operation::Delete)), Decision::Deny);
        assert_eq!(actor_directory(&AccessRequest::new(None, Operation::Read)), Decision::Deny);
    }
}
