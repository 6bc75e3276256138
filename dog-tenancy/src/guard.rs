//! Field-level write guards.
//!
//! These apply per field, on top of whatever the document-level decision
//! said. Resending a field's current value is not a change and passes.

use serde_json::{json, Value};
use tracing::warn;

use crate::engine::{field_restricted_to_super_admin, Operation};
use crate::errors::AccessError;
use crate::identity::{Actor, ActorPatch};
use crate::tenant::{tenant_id_from_value, AsTenantId, TenantId};

pub const ROLES_FIELD: &str = "roles";
pub const TENANTS_FIELD: &str = "tenants";

fn rejected(fields: &[&str]) -> AccessError {
    let mut errors = serde_json::Map::new();
    for f in fields {
        errors.insert(
            (*f).to_string(),
            json!(["Only a super-admin may change this field"]),
        );
    }
    AccessError::forbidden("You are not allowed to change these fields").with_errors(Value::Object(errors))
}

/// `roles` / `tenants` fields the patch would change.
pub fn restricted_actor_changes(patch: &ActorPatch, existing: Option<&Actor>) -> Vec<&'static str> {
    let mut changed = Vec::new();

    if let Some(roles) = &patch.roles {
        if existing.map_or(true, |a| &a.roles != roles) {
            changed.push(ROLES_FIELD);
        }
    }

    if let Some(tenants) = &patch.tenants {
        let next: Vec<&TenantId> = tenants.iter().map(|t| t.tenant_id()).collect();
        let same = existing.is_some_and(|a| {
            a.tenants.len() == next.len()
                && a.tenants.iter().zip(&next).all(|(t, n)| t.tenant_id() == *n)
        });
        if !same {
            changed.push(TENANTS_FIELD);
        }
    }

    changed
}

/// Role-mutation guard: only super-admins change roles or memberships.
pub fn guard_actor_write(
    actor: Option<&Actor>,
    patch: &ActorPatch,
    existing: Option<&Actor>,
) -> Result<(), AccessError> {
    if field_restricted_to_super_admin(actor).is_allow() {
        return Ok(());
    }

    let changed = restricted_actor_changes(patch, existing);
    if changed.is_empty() {
        return Ok(());
    }

    warn!(
        "Rejected change to {:?} by {}",
        changed,
        actor.map(|a| a.id.as_str()).unwrap_or("<anonymous>")
    );
    Err(rejected(&changed))
}

/// Tenant-field guard for tenant-scoped resources.
///
/// On update, non-super-admins may not change the stored tenant, and may
/// not touch the field at all when the stored document is unknown. On create,
/// an explicitly supplied tenant must be their active tenant.
pub fn guard_tenant_field(
    actor: Option<&Actor>,
    field: &str,
    data: &Value,
    existing: Option<&Value>,
    operation: Operation,
) -> Result<(), AccessError> {
    if field_restricted_to_super_admin(actor).is_allow() {
        return Ok(());
    }

    let Some(raw) = data.get(field) else {
        return Ok(());
    };
    let requested = tenant_id_from_value(raw);

    let allowed = match operation {
        Operation::Read | Operation::Delete => true,
        Operation::Create => match &requested {
            None => true,
            Some(id) => actor.and_then(Actor::active_tenant_id) == Some(id),
        },
        // Without the stored document there is nothing to compare against.
        Operation::Update => match existing {
            None => false,
            Some(doc) => requested == doc.get(field).and_then(tenant_id_from_value),
        },
    };

    if allowed {
        return Ok(());
    }

    warn!(
        "Rejected {} of tenant field '{}' by {}",
        operation,
        field,
        actor.map(|a| a.id.as_str()).unwrap_or("<anonymous>")
    );
    Err(rejected(&[field]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::identity::Role;

    #[test]
    fn resending_current_values_is_not_a_change() {
        let stored = Actor::new("u").with_roles([Role::User]).with_tenants(["t1", "t2"]);
        let patch = ActorPatch::new().roles([Role::User]).tenants(["t1", "t2"]);

        assert!(restricted_actor_changes(&patch, Some(&stored)).is_empty());
        assert!(guard_actor_write(Some(&stored), &patch, Some(&stored)).is_ok());
    }

    #[test]
    fn self_service_cannot_escalate() {
        let me = Actor::new("u").with_tenants(["t1"]).with_active_tenant("t1");
        let patch = ActorPatch::new().roles([Role::Admin]).tenants(["t1", "t9"]);

        let err = guard_actor_write(Some(&me), &patch, Some(&me)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        let errors = err.errors.unwrap();
        assert!(errors.get("roles").is_some() && errors.get("tenants").is_some());
    }

    #[test]
    fn active_tenant_switch_passes_the_guard() {
        let me = Actor::new("u").with_tenants(["t1", "t2"]).with_active_tenant("t1");
        let patch = ActorPatch::new().active_tenant("t2");

        assert!(guard_actor_write(Some(&me), &patch, Some(&me)).is_ok());
    }

    #[test]
    fn reordering_memberships_is_a_change() {
        let me = Actor::new("u").with_tenants(["t1", "t2"]);
        let patch = ActorPatch::new().tenants(["t2", "t1"]);

        assert_eq!(restricted_actor_changes(&patch, Some(&me)), vec![TENANTS_FIELD]);
    }

    #[test]
    fn super_admin_changes_anything() {
        let root = Actor::new("r").with_roles([Role::SuperAdmin]);
        let target = Actor::new("u");
        let patch = ActorPatch::new().roles([Role::Admin]).tenants(["t1"]);

        assert!(guard_actor_write(Some(&root), &patch, Some(&target)).is_ok());
        assert!(guard_tenant_field(
            Some(&root),
            "tenant",
            &json!({"tenant": "t2"}),
            Some(&json!({"tenant": "t1"})),
            Operation::Update
        )
        .is_ok());
    }

    #[test]
    fn tenant_field_is_locked_on_update() {
        let admin = Actor::new("a")
            .with_roles([Role::Admin])
            .with_tenants(["t1", "t2"])
            .with_active_tenant("t1");
        let stored = json!({"tenant": "t1", "title": "x"});

        let moved = guard_tenant_field(Some(&admin), "tenant", &json!({"tenant": "t2"}), Some(&stored), Operation::Update);
        assert_eq!(moved.unwrap_err().kind, ErrorKind::Forbidden);

        let cleared = guard_tenant_field(Some(&admin), "tenant", &json!({"tenant": null}), Some(&stored), Operation::Update);
        assert!(cleared.is_err());

        let same = guard_tenant_field(Some(&admin), "tenant", &json!({"tenant": {"id": "t1"}}), Some(&stored), Operation::Update);
        assert!(same.is_ok());

        let untouched = guard_tenant_field(Some(&admin), "tenant", &json!({"title": "y"}), Some(&stored), Operation::Update);
        assert!(untouched.is_ok());
    }

    #[test]
    fn update_without_stored_document_rejects_the_field() {
        let admin = Actor::new("a")
            .with_roles([Role::Admin])
            .with_tenants(["t1"])
            .with_active_tenant("t1");

        for data in [json!({"tenant": null}), json!({"tenant": "t1"})] {
            let err = guard_tenant_field(Some(&admin), "tenant", &data, None, Operation::Update).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Forbidden);
        }
        assert!(guard_tenant_field(Some(&admin), "tenant", &json!({"title": "y"}), None, Operation::Update).is_ok());
    }

    #[test]
    fn create_may_only_target_the_active_tenant() {
        let user = Actor::new("u").with_tenants(["t1", "t2"]).with_active_tenant("t1");

        assert!(guard_tenant_field(Some(&user), "tenant", &json!({"tenant": "t1"}), None, Operation::Create).is_ok());
        assert!(guard_tenant_field(Some(&user), "tenant", &json!({"tenant": "t2"}), None, Operation::Create).is_err());
        assert!(guard_tenant_field(Some(&user), "tenant", &json!({}), None, Operation::Create).is_ok());
    }
}
