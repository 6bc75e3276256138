//! # Tenancy configuration
//!
//! A string key/value store (the same `set` / `get` / `snapshot` shape as
//! the rest of DogRS) plus a typed [`TenancyConfig`] read from a snapshot.
//!
//! ```rust
//! use dog_tenancy::config::{ConfigStore, TenancyConfig};
//!
//! let mut store = ConfigStore::new();
//! store.set("tenancy.tenant_field", "org");
//! store.set("collections.tenant_scoped", "pages, posts");
//!
//! let cfg = TenancyConfig::from_snapshot(&store.snapshot());
//! assert_eq!(cfg.tenant_field, "org");
//! assert_eq!(cfg.tenant_scoped_collections, vec!["pages", "posts"]);
//! ```
//!
//! Environment overrides use `PREFIX__A__B=value` → `a.b`:
//!
//! ```bash
//! export DOG_TENANCY__TENANCY__TENANT_FIELD=org
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const TENANT_FIELD_KEY: &str = "tenancy.tenant_field";
pub const ACTOR_COLLECTION_KEY: &str = "collections.actors";
pub const TENANT_COLLECTION_KEY: &str = "collections.tenants";
pub const TENANT_SCOPED_KEY: &str = "collections.tenant_scoped";

#[derive(Debug, Default)]
pub struct ConfigStore {
    values: HashMap<String, String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Load every `PREFIX__…` variable from the environment.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    pub fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut store = Self::new();
        let head = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(&head) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                store.set(normalized, value);
            }
        }
        store
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            map: self.values.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    /// Comma-separated list, trimmed, empties dropped.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

/// Names the engine needs to know about the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenancyConfig {
    /// Relationship field carrying a resource's tenant.
    pub tenant_field: String,
    pub actor_collection: String,
    pub tenant_collection: String,
    pub tenant_scoped_collections: Vec<String>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            tenant_field: "tenant".to_string(),
            actor_collection: "users".to_string(),
            tenant_collection: "tenants".to_string(),
            tenant_scoped_collections: ["pages", "posts", "tags", "biographies", "media"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl TenancyConfig {
    /// Defaults, overridden by whatever keys the snapshot carries.
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = snapshot.get_string(TENANT_FIELD_KEY) {
            cfg.tenant_field = v;
        }
        if let Some(v) = snapshot.get_string(ACTOR_COLLECTION_KEY) {
            cfg.actor_collection = v;
        }
        if let Some(v) = snapshot.get_string(TENANT_COLLECTION_KEY) {
            cfg.tenant_collection = v;
        }
        if let Some(v) = snapshot.get_list(TENANT_SCOPED_KEY) {
            cfg.tenant_scoped_collections = v;
        }
        cfg
    }
}
