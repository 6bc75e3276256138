// Persisted actor access.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use dog_tenancy::{Actor, ActorId};

/// Where committed actors live. The store's own write serialization decides
/// which of two racing writes wins.
#[async_trait]
pub trait ActorStore: Send + Sync {
    async fn get(&self, id: &ActorId) -> Result<Option<Actor>>;

    /// Persist `actor` and return the stored document.
    async fn commit(&self, actor: Actor) -> Result<Actor>;
}

/// In-process store, for tests and single-node setups.
#[derive(Debug, Default)]
pub struct MemoryActorStore {
    actors: RwLock<HashMap<ActorId, Actor>>,
}

impl MemoryActorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actors<I: IntoIterator<Item = Actor>>(actors: I) -> Self {
        let map = actors.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self {
            actors: RwLock::new(map),
        }
    }
}

#[async_trait]
impl ActorStore for MemoryActorStore {
    async fn get(&self, id: &ActorId) -> Result<Option<Actor>> {
        let guard = self
            .actors
            .read()
            .map_err(|_| anyhow::anyhow!("actor store lock poisoned"))?;
        Ok(guard.get(id).cloned())
    }

    async fn commit(&self, actor: Actor) -> Result<Actor> {
        let mut guard = self
            .actors
            .write()
            .map_err(|_| anyhow::anyhow!("actor store lock poisoned"))?;
        guard.insert(actor.id.clone(), actor.clone());
        Ok(actor)
    }
}
