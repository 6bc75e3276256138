//! dog-tenancy: multi-tenant access policy for DogRS.
//!
//! Pure, synchronous decisions over an actor snapshot (`Allow`, `Deny` or a
//! query filter), active-tenant resolution, field guards, and the
//! before-change hooks that wire them into a write pipeline.

pub mod config;
pub mod decision;
pub mod directory;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod hooks;
pub mod identity;
pub mod registry;
pub mod resolver;
pub mod tenant;
pub mod validation;

pub use config::{ConfigSnapshot, ConfigStore, TenancyConfig};
pub use decision::{Constraint, Decision, Filter, FilterField, QueryScope};
pub use directory::{
    actor_directory, actors_read, actors_update, super_admin_only, tenant_directory, tenants_read,
    tenants_update,
};
pub use engine::{
    field_restricted_to_super_admin, populate_tenant, tenant_scoped, tenant_scoped_admin_write,
    tenant_scoped_create, tenant_scoped_read, AccessRequest, Operation,
};
pub use errors::{AccessError, AccessResult, ErrorKind};
pub use guard::{guard_actor_write, guard_tenant_field, restricted_actor_changes};
pub use hooks::{
    actor_hooks, tenant_scoped_hooks, BeforeChangeHook, GuardActorFields, GuardTenantField, HookChain,
    PopulateTenant, ValidateActiveTenant, WriteContext, WriteMethods,
};
pub use identity::{belongs_to_tenant, is_admin, is_super_admin, Actor, ActorId, ActorPatch, Role};
pub use registry::{active_tenant_options, AccessRegistry, ResourceFamily};
pub use resolver::{
    active_tenant_state, repair, resolve_active_tenant, resolve_write, ActiveTenantState, Resolution,
};
pub use tenant::{resolve_tenant_id, tenant_id_from_value, AsTenantId, Tenant, TenantId, TenantRef};
pub use validation::{validate_slug, validate_tenant, FieldErrors};
