//! # Write hooks
//!
//! Before-change hooks that wire the engine into a write pipeline. The
//! framework builds a [`WriteContext`] after merging the incoming data,
//! runs a [`HookChain`], and commits only if every hook returned `Ok`.
//!
//! - Tenant-scoped collections: [`GuardTenantField`] then
//!   [`PopulateTenant`] (see [`tenant_scoped_hooks`]).
//! - The actor collection: [`GuardActorFields`] then
//!   [`ValidateActiveTenant`] (see [`actor_hooks`]). The resolver runs last
//!   so the committed document is never left with an invalid selection.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::engine::{populate_tenant, Operation};
use crate::guard::{guard_actor_write, guard_tenant_field};
use crate::identity::{Actor, ActorPatch};
use crate::resolver::resolve_write;

/// Which write operations a hook applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethods {
    Create,
    Update,
    AllWrites,
}

impl WriteMethods {
    #[inline]
    pub fn matches(&self, operation: Operation) -> bool {
        match self {
            WriteMethods::AllWrites => matches!(operation, Operation::Create | Operation::Update),
            WriteMethods::Create => operation == Operation::Create,
            WriteMethods::Update => operation == Operation::Update,
        }
    }
}

/// Context passed to before-change hooks.
///
/// R = incoming write, E = stored document (same type for plain JSON
/// resources; `ActorPatch` / `Actor` for the actor collection).
#[derive(Debug)]
pub struct WriteContext<R, E = R> {
    pub actor: Option<Actor>,
    pub collection: String,
    pub operation: Operation,
    pub data: R,
    /// The stored document, for updates.
    pub existing: Option<E>,
}

impl<R, E> WriteContext<R, E> {
    pub fn new(actor: Option<Actor>, collection: impl Into<String>, operation: Operation, data: R) -> Self {
        Self {
            actor,
            collection: collection.into(),
            operation,
            data,
            existing: None,
        }
    }

    pub fn with_existing(mut self, existing: E) -> Self {
        self.existing = Some(existing);
        self
    }
}

#[async_trait]
pub trait BeforeChangeHook<R, E = R>: Send + Sync
where
    R: Send + 'static,
    E: Send + 'static,
{
    async fn run(&self, ctx: &mut WriteContext<R, E>) -> Result<()>;
}

/// Runs hooks in registration order, stopping at the first error.
pub struct HookChain<R, E = R>
where
    R: Send + 'static,
    E: Send + 'static,
{
    hooks: Vec<(WriteMethods, Arc<dyn BeforeChangeHook<R, E>>)>,
}

impl<R, E> Default for HookChain<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, E> HookChain<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn push(self, hook: Arc<dyn BeforeChangeHook<R, E>>) -> Self {
        self.push_for(WriteMethods::AllWrites, hook)
    }

    pub fn push_for(mut self, methods: WriteMethods, hook: Arc<dyn BeforeChangeHook<R, E>>) -> Self {
        self.hooks.push((methods, hook));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub async fn run(&self, ctx: &mut WriteContext<R, E>) -> Result<()> {
        for (methods, hook) in &self.hooks {
            if methods.matches(ctx.operation) {
                hook.run(ctx).await?;
            }
        }
        Ok(())
    }
}

/// Fill the tenant field from the actor's active tenant on create.
pub struct PopulateTenant {
    field: String,
}

impl PopulateTenant {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

#[async_trait]
impl BeforeChangeHook<Value> for PopulateTenant {
    async fn run(&self, ctx: &mut WriteContext<Value>) -> Result<()> {
        if let Some(id) = populate_tenant(&mut ctx.data, &self.field, ctx.actor.as_ref(), ctx.operation) {
            debug!("Populated {}.{} with active tenant {}", ctx.collection, self.field, id);
        }
        Ok(())
    }
}

/// Lock the tenant field to super-admins.
pub struct GuardTenantField {
    field: String,
}

impl GuardTenantField {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

#[async_trait]
impl BeforeChangeHook<Value> for GuardTenantField {
    async fn run(&self, ctx: &mut WriteContext<Value>) -> Result<()> {
        guard_tenant_field(
            ctx.actor.as_ref(),
            &self.field,
            &ctx.data,
            ctx.existing.as_ref(),
            ctx.operation,
        )
        .map_err(|e| e.into_anyhow())
    }
}

/// Role-mutation guard for the actor collection.
pub struct GuardActorFields;

#[async_trait]
impl BeforeChangeHook<ActorPatch, Actor> for GuardActorFields {
    async fn run(&self, ctx: &mut WriteContext<ActorPatch, Actor>) -> Result<()> {
        guard_actor_write(ctx.actor.as_ref(), &ctx.data, ctx.existing.as_ref()).map_err(|e| e.into_anyhow())
    }
}

/// Active-tenant resolver, on every actor write.
pub struct ValidateActiveTenant;

#[async_trait]
impl BeforeChangeHook<ActorPatch, Actor> for ValidateActiveTenant {
    async fn run(&self, ctx: &mut WriteContext<ActorPatch, Actor>) -> Result<()> {
        resolve_write(&mut ctx.data, ctx.existing.as_ref());
        Ok(())
    }
}

/// Standard chain for a tenant-scoped collection.
pub fn tenant_scoped_hooks(field: &str) -> HookChain<Value> {
    HookChain::new()
        .push(Arc::new(GuardTenantField::new(field)))
        .push_for(WriteMethods::Create, Arc::new(PopulateTenant::new(field)))
}

/// Standard chain for the actor collection.
pub fn actor_hooks() -> HookChain<ActorPatch, Actor> {
    HookChain::new()
        .push(Arc::new(GuardActorFields))
        .push(Arc::new(ValidateActiveTenant))
}
