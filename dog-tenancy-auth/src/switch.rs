//! Server side of the tenant switch.
//!
//! A switch is an ordinary self-service actor update of `activeTenant`:
//! the actor directory decides, the write hooks guard and resolve, the store
//! commits, and a new token is cut from the committed state. Clients must
//! drop their old token once this returns.

use anyhow::Result;
use dog_tenancy::{
    actor_directory, actor_hooks, AccessError, AccessRequest, Actor, ActorId, ActorPatch, HookChain,
    Operation, TenantId, TenantRef, WriteContext,
};
use tracing::info;

use crate::jwt::SessionIssuer;
use crate::store::ActorStore;

#[derive(Debug, Clone)]
pub struct SwitchOutcome {
    /// The actor as committed.
    pub actor: Actor,
    /// Session token carrying the committed state.
    pub token: String,
    /// Whether the active tenant differs from before the switch.
    pub changed: bool,
}

impl SwitchOutcome {
    pub fn active_tenant(&self) -> Option<&TenantId> {
        self.actor.active_tenant_id()
    }
}

pub struct TenantSwitcher<S: ActorStore> {
    store: S,
    issuer: SessionIssuer,
    collection: String,
    hooks: HookChain<ActorPatch, Actor>,
}

impl<S: ActorStore> TenantSwitcher<S> {
    pub fn new(store: S, issuer: SessionIssuer) -> Self {
        Self {
            store,
            issuer,
            collection: "users".to_string(),
            hooks: actor_hooks(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    /// Switch `actor_id`'s active tenant to `requested`.
    ///
    /// A tenant the actor does not belong to resolves to its first
    /// membership, like any other actor write.
    pub async fn switch(&self, actor_id: &ActorId, requested: impl Into<TenantRef>) -> Result<SwitchOutcome> {
        let stored = self
            .store
            .get(actor_id)
            .await?
            .ok_or_else(|| AccessError::not_found(format!("No record found for id '{}'", actor_id)).into_anyhow())?;

        let decision = actor_directory(&AccessRequest::new(Some(&stored), Operation::Update));
        decision.clone().enforce(true).map_err(AccessError::into_anyhow)?;
        if !decision.permits(&serde_json::to_value(&stored)?) {
            return Err(AccessError::not_found(format!("No record found for id '{}'", actor_id)).into_anyhow());
        }

        let patch = ActorPatch::new().active_tenant(requested);
        let mut ctx = WriteContext::new(Some(stored.clone()), self.collection.clone(), Operation::Update, patch)
            .with_existing(stored.clone());
        self.hooks.run(&mut ctx).await?;

        let committed = self.store.commit(stored.merged_with(&ctx.data)).await?;
        let changed = committed.active_tenant_id() != stored.active_tenant_id();
        let token = self.issuer.issue(&committed)?;

        info!(
            "Actor {} switched active tenant {:?} -> {:?}",
            committed.id,
            stored.active_tenant_id(),
            committed.active_tenant_id()
        );

        Ok(SwitchOutcome {
            actor: committed,
            token,
            changed,
        })
    }

    /// Switch on behalf of the bearer of `token`.
    pub async fn switch_session(&self, token: &str, requested: impl Into<TenantRef>) -> Result<SwitchOutcome> {
        let claims = self.issuer.verify(token)?;
        self.switch(&ActorId::new(claims.sub), requested).await
    }
}
