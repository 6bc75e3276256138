//! Decision engine for tenant-scoped resources.
//!
//! Four combinators cover every tenant-scoped collection:
//!
//! | combinator                         | super-admin | admin + active | user + active | no active | no actor |
//! |------------------------------------|-------------|----------------|---------------|-----------|----------|
//! | [`tenant_scoped_read`]             | allow       | filter         | filter        | deny      | deny     |
//! | [`tenant_scoped_create`]           | allow       | allow          | allow         | deny      | deny     |
//! | [`tenant_scoped_admin_write`]      | allow       | filter         | deny          | deny      | deny     |
//! | [`field_restricted_to_super_admin`]| allow       | deny           | deny          | deny      | deny     |
//!
//! "filter" is always `{tenant = activeTenant}`. All functions are pure and
//! synchronous; they only look at the actor snapshot they are handed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::decision::{Decision, Filter, FilterField};
use crate::identity::Actor;
use crate::tenant::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_write(&self) -> bool {
        !matches!(self, Operation::Read)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

/// Input to a decision: who, what, and (for identity-style updates) which.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub actor: Option<&'a Actor>,
    pub operation: Operation,
    pub target: Option<&'a str>,
}

impl<'a> AccessRequest<'a> {
    pub fn new(actor: Option<&'a Actor>, operation: Operation) -> Self {
        Self {
            actor,
            operation,
            target: None,
        }
    }

    pub fn with_target(mut self, target: &'a str) -> Self {
        self.target = Some(target);
        self
    }
}

fn active_tenant_filter(active: &TenantId) -> Decision {
    Decision::FilterBy(Filter::equals(FilterField::Tenant, active.as_str()))
}

pub fn tenant_scoped_read(actor: Option<&Actor>) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny;
    };
    if actor.is_super_admin() {
        return Decision::Allow;
    }
    match actor.active_tenant_id() {
        Some(active) => active_tenant_filter(active),
        None => Decision::Deny,
    }
}

/// Creates carry no filter: there is no row to constrain yet.
pub fn tenant_scoped_create(actor: Option<&Actor>) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny;
    };
    Decision::from_bool(actor.is_super_admin() || actor.active_tenant_id().is_some())
}

/// Update and delete.
pub fn tenant_scoped_admin_write(actor: Option<&Actor>) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny;
    };
    if actor.is_super_admin() {
        return Decision::Allow;
    }
    if !actor.is_admin() {
        return Decision::Deny;
    }
    match actor.active_tenant_id() {
        Some(active) => active_tenant_filter(active),
        None => Decision::Deny,
    }
}

/// Field-level rule, independent of the document-level decision.
pub fn field_restricted_to_super_admin(actor: Option<&Actor>) -> Decision {
    Decision::from_bool(actor.is_some_and(Actor::is_super_admin))
}

/// Dispatch a tenant-scoped operation to its combinator.
pub fn tenant_scoped(request: &AccessRequest<'_>) -> Decision {
    let decision = match request.operation {
        Operation::Read => tenant_scoped_read(request.actor),
        Operation::Create => tenant_scoped_create(request.actor),
        Operation::Update | Operation::Delete => tenant_scoped_admin_write(request.actor),
    };

    trace!(
        "tenant-scoped {} by {} -> {}",
        request.operation,
        request.actor.map(|a| a.id.as_str()).unwrap_or("<anonymous>"),
        decision.kind()
    );

    decision
}

/// Fill `data[field]` from the actor's active tenant on create.
///
/// Only runs for `Operation::Create` and only when the field is absent or
/// null, so a resource's tenant never drifts on update. With no active
/// tenant the field stays unset; required-field validation belongs to
/// storage. Returns the id that was written, if any.
pub fn populate_tenant(
    data: &mut Value,
    field: &str,
    actor: Option<&Actor>,
    operation: Operation,
) -> Option<TenantId> {
    if operation != Operation::Create {
        return None;
    }
    let map = data.as_object_mut()?;
    if map.get(field).is_some_and(|v| !v.is_null()) {
        return None;
    }
    let active = actor?.active_tenant_id()?.clone();
    map.insert(field.to_string(), Value::String(active.0.clone()));
    Some(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;
    use serde_json::json;

    fn user(active: Option<&str>) -> Actor {
        let a = Actor::new("u").with_tenants(["t1", "t2"]);
        match active {
            Some(t) => a.with_active_tenant(t),
            None => a,
        }
    }

    #[test]
    fn read_filters_by_active_tenant() {
        assert_eq!(
            tenant_scoped_read(Some(&user(Some("t2")))),
            Decision::FilterBy(Filter::equals(FilterField::Tenant, "t2"))
        );
        assert_eq!(tenant_scoped_read(Some(&user(None))), Decision::Deny);
        assert_eq!(tenant_scoped_read(None), Decision::Deny);
    }

    #[test]
    fn create_needs_an_active_tenant() {
        assert_eq!(tenant_scoped_create(Some(&user(Some("t1")))), Decision::Allow);
        assert_eq!(tenant_scoped_create(Some(&user(None))), Decision::Deny);
        assert_eq!(tenant_scoped_create(None), Decision::Deny);
    }

    #[test]
    fn admin_write_denies_plain_users() {
        let admin = user(Some("t1")).with_roles([Role::Admin]);

        assert_eq!(tenant_scoped_admin_write(Some(&user(Some("t1")))), Decision::Deny);
        assert_eq!(
            tenant_scoped_admin_write(Some(&admin)),
            Decision::FilterBy(Filter::equals(FilterField::Tenant, "t1"))
        );
        let unselected = user(None).with_roles([Role::Admin]);
        assert_eq!(tenant_scoped_admin_write(Some(&unselected)), Decision::Deny);
    }

    #[test]
    fn super_admin_needs_no_selection() {
        let root = Actor::new("root").with_roles([Role::SuperAdmin]);

        for op in [Operation::Read, Operation::Create, Operation::Update, Operation::Delete] {
            assert_eq!(tenant_scoped(&AccessRequest::new(Some(&root), op)), Decision::Allow);
        }
        assert_eq!(field_restricted_to_super_admin(Some(&root)), Decision::Allow);
    }

    #[test]
    fn populate_only_fills_missing_tenant_on_create() {
        let actor = user(Some("t1"));

        let mut fresh = json!({"title": "x"});
        assert_eq!(
            populate_tenant(&mut fresh, "tenant", Some(&actor), Operation::Create),
            Some(TenantId::from("t1"))
        );
        assert_eq!(fresh["tenant"], "t1");

        let mut explicit = json!({"title": "x", "tenant": "t2"});
        assert_eq!(populate_tenant(&mut explicit, "tenant", Some(&actor), Operation::Create), None);
        assert_eq!(explicit["tenant"], "t2");

        let mut update = json!({"title": "y"});
        assert_eq!(populate_tenant(&mut update, "tenant", Some(&actor), Operation::Update), None);
        assert!(update.get("tenant").is_none());
    }

    #[test]
    fn populate_without_active_tenant_leaves_field_unset() {
        let mut data = json!({"title": "x", "tenant": null});
        assert_eq!(populate_tenant(&mut data, "tenant", Some(&user(None)), Operation::Create), None);
        assert!(data["tenant"].is_null());
    }
}
