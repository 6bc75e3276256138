use proptest::prelude::*;
use serde_json::json;

use dog_tenancy::{
    field_restricted_to_super_admin, guard_tenant_field, repair, resolve_active_tenant, AccessRegistry,
    AccessRequest, Actor, ActorPatch, Decision, ErrorKind, Filter, FilterField, Operation, Role,
    TenantId, TenantRef,
};

/// Test factory functions
fn refs(ids: &[String]) -> Vec<TenantRef> {
    ids.iter().map(|id| TenantRef::from(id.as_str())).collect()
}

fn actor_with(roles: Vec<Role>, tenants: &[String], active: Option<String>) -> Actor {
    let actor = Actor::new("subject").with_roles(roles).with_tenants(refs(tenants));
    match active {
        Some(t) => actor.with_active_tenant(t.as_str()),
        None => actor,
    }
}

fn every_request(actor: &Actor) -> Vec<(&'static str, AccessRequest<'_>)> {
    let mut requests = Vec::new();
    for collection in ["pages", "posts", "tags", "biographies", "media", "tenants", "users"] {
        for op in [Operation::Read, Operation::Create, Operation::Update, Operation::Delete] {
            let req = AccessRequest::new(Some(actor), op);
            requests.push((collection, req));
            requests.push((collection, req.with_target("7")));
        }
    }
    requests
}

fn roles_strategy() -> impl Strategy<Value = Vec<Role>> {
    prop::collection::vec(prop::sample::select(Role::ALL.to_vec()), 0..3)
}

fn tenants_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]", 0..5)
}

proptest! {
    /// Super-admins are allowed everything regardless of selection or membership.
    #[test]
    fn super_admin_is_always_allowed(
        tenants in tenants_strategy(),
        active in prop::option::of("[a-g]"),
    ) {
        let root = actor_with(vec![Role::SuperAdmin], &tenants, active);
        let registry = AccessRegistry::with_defaults();

        for (collection, req) in every_request(&root) {
            prop_assert_eq!(registry.decide(collection, &req).unwrap(), Decision::Allow);
        }
        prop_assert_eq!(field_restricted_to_super_admin(Some(&root)), Decision::Allow);
    }

    /// Without an active tenant, non-admin tenant-scoped writes are denied.
    #[test]
    fn unselected_users_cannot_write(tenants in tenants_strategy()) {
        let user = actor_with(vec![Role::User], &tenants, None);
        let registry = AccessRegistry::with_defaults();

        for op in [Operation::Create, Operation::Update, Operation::Delete] {
            let decision = registry.decide("posts", &AccessRequest::new(Some(&user), op)).unwrap();
            prop_assert_eq!(decision, Decision::Deny);
        }
    }

    /// Switching the active tenant changes the filter value, never the kind.
    #[test]
    fn read_filter_tracks_active_tenant(
        roles in roles_strategy().prop_filter("not super-admin", |r| !r.contains(&Role::SuperAdmin)),
        tenants in tenants_strategy(),
        first in "[a-g]",
        second in "[a-g]",
    ) {
        let registry = AccessRegistry::with_defaults();
        let a = actor_with(roles.clone(), &tenants, Some(first.clone()));
        let b = actor_with(roles, &tenants, Some(second.clone()));

        let da = registry.decide("pages", &AccessRequest::new(Some(&a), Operation::Read)).unwrap();
        let db = registry.decide("pages", &AccessRequest::new(Some(&b), Operation::Read)).unwrap();

        prop_assert_eq!(da.kind(), db.kind());
        prop_assert_eq!(da, Decision::FilterBy(Filter::equals(FilterField::Tenant, first)));
        prop_assert_eq!(db, Decision::FilterBy(Filter::equals(FilterField::Tenant, second)));
    }

    /// Running the resolver twice is the same as running it once.
    #[test]
    fn resolver_is_idempotent(
        tenants in tenants_strategy(),
        active in prop::option::of("[a-g]"),
    ) {
        let mut once = actor_with(vec![Role::User], &tenants, active);
        repair(&mut once);
        let mut twice = once.clone();
        let second = repair(&mut twice);

        prop_assert_eq!(&once, &twice);
        prop_assert!(!second.repaired);
    }

    /// Invalid or absent selections always default to the first membership.
    #[test]
    fn resolver_defaults_to_first(
        tenants in prop::collection::vec("[a-e]", 1..5),
        stranger in "[x-z]",
        absent in any::<bool>(),
    ) {
        let list = refs(&tenants);
        let candidate = if absent { None } else { Some(TenantRef::from(stranger.as_str())) };

        for _ in 0..3 {
            let resolved = resolve_active_tenant(&list, candidate.as_ref());
            prop_assert_eq!(resolved, Some(TenantRef::from(tenants[0].as_str())));
        }
    }

    /// Non-super-admins never move a resource between tenants.
    #[test]
    fn tenant_field_is_locked_for_everyone_else(
        roles in roles_strategy().prop_filter("not super-admin", |r| !r.contains(&Role::SuperAdmin)),
        target in "[b-e]",
    ) {
        let tenants = vec!["a".to_string(), target.clone()];
        let actor = actor_with(roles, &tenants, Some("a".to_string()));
        let stored = json!({"tenant": "a"});

        let result = guard_tenant_field(
            Some(&actor),
            "tenant",
            &json!({"tenant": target}),
            Some(&stored),
            Operation::Update,
        );
        prop_assert_eq!(result.unwrap_err().kind, ErrorKind::Forbidden);
    }
}

#[test]
fn revoking_the_active_tenant_moves_to_the_next_membership() {
    let mut actor = Actor::new("u").with_tenants(["t1", "t2", "t3"]).with_active_tenant("t2");

    actor.tenants.retain(|t| t != &TenantRef::from("t2"));
    repair(&mut actor);
    assert_eq!(actor.active_tenant_id(), Some(&TenantId::from("t1")));

    actor.tenants.clear();
    repair(&mut actor);
    assert_eq!(actor.active_tenant, None);
}

#[test]
fn admin_update_outside_active_tenant_matches_nothing() {
    let admin = Actor::new("a")
        .with_roles([Role::Admin])
        .with_tenants(["T1", "T2"])
        .with_active_tenant("T1");
    let registry = AccessRegistry::with_defaults();

    let decision = registry
        .decide("posts", &AccessRequest::new(Some(&admin), Operation::Update))
        .unwrap();

    assert_eq!(decision, Decision::FilterBy(Filter::equals(FilterField::Tenant, "T1")));
    // Zero rows affected: the caller reports not-found, not forbidden.
    assert!(!decision.permits(&json!({"id": "p1", "tenant": "T2"})));
    assert!(decision.enforce(true).is_ok());
}

#[test]
fn actor_without_memberships_cannot_create() {
    let lonely = Actor::new("u");
    let registry = AccessRegistry::with_defaults();

    let decision = registry
        .decide("pages", &AccessRequest::new(Some(&lonely), Operation::Create))
        .unwrap();
    assert_eq!(decision, Decision::Deny);
    assert_eq!(decision.enforce(true).unwrap_err().kind, ErrorKind::Forbidden);
}

#[test]
fn super_admin_updates_any_tenant_without_membership() {
    let root = Actor::new("root").with_roles([Role::SuperAdmin]);
    let registry = AccessRegistry::with_defaults();

    let decision = registry
        .decide("tenants", &AccessRequest::new(Some(&root), Operation::Update).with_target("7"))
        .unwrap();
    assert_eq!(decision, Decision::Allow);
}

#[test]
fn anonymous_callers_get_a_generic_failure() {
    let registry = AccessRegistry::with_defaults();
    let decision = registry
        .decide("posts", &AccessRequest::new(None, Operation::Delete))
        .unwrap();

    let err = decision.enforce(false).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthenticated);
    assert_eq!(err.message, "Not authenticated");
}

#[test]
fn untargeted_tenant_update_decides_for_root_and_anonymous() {
    let root = Actor::new("root").with_roles([Role::SuperAdmin]);
    let registry = AccessRegistry::with_defaults();

    let allowed = registry
        .decide("tenants", &AccessRequest::new(Some(&root), Operation::Update))
        .unwrap();
    let anonymous = registry
        .decide("tenants", &AccessRequest::new(None, Operation::Update))
        .unwrap();

    assert_eq!(allowed, Decision::Allow);
    assert_eq!(anonymous, Decision::Deny);
}

#[test]
fn tenant_update_without_target_is_caller_misuse() {
    let admin = Actor::new("a").with_roles([Role::Admin]).with_tenants(["t1"]);
    let registry = AccessRegistry::with_defaults();

    let err = registry
        .decide("tenants", &AccessRequest::new(Some(&admin), Operation::Update))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadRequest);
}

#[test]
fn self_service_switch_survives_the_write_pipeline() {
    let me = Actor::new("u").with_tenants(["t1", "t2"]).with_active_tenant("t1");
    let mut patch = ActorPatch::new().active_tenant("t2");

    dog_tenancy::guard_actor_write(Some(&me), &patch, Some(&me)).unwrap();
    dog_tenancy::resolve_write(&mut patch, Some(&me));

    let committed = me.merged_with(&patch);
    assert_eq!(committed.active_tenant_id(), Some(&TenantId::from("t2")));
}
