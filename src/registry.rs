//! Agent API-key registry
//!
//! In-memory, append-mostly map from opaque API key to caller identity.
//! The store sits behind a trait so a persistent backend can be swapped in
//! without touching pipeline logic.

use crate::error::{GatewayError, GatewayResult};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A registered API consumer
#[derive(Debug, Clone, Serialize)]
pub struct AgentIdentity {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub registered_at: DateTime<Utc>,
}

/// Key-to-identity storage boundary. Append-mostly: no deletion in scope,
/// concurrent reads under concurrent requests.
pub trait AgentStore: Send + Sync {
    fn insert(&self, key: String, agent: AgentIdentity);
    fn get(&self, key: &str) -> Option<AgentIdentity>;
    fn len(&self) -> usize;
}

#[derive(Default)]
pub struct InMemoryAgentStore {
    agents: DashMap<String, AgentIdentity>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentStore for InMemoryAgentStore {
    fn insert(&self, key: String, agent: AgentIdentity) {
        self.agents.insert(key, agent);
    }

    fn get(&self, key: &str) -> Option<AgentIdentity> {
        self.agents.get(key).map(|a| a.clone())
    }

    fn len(&self) -> usize {
        self.agents.len()
    }
}

pub struct AgentRegistry {
    store: Arc<dyn AgentStore>,
    key_prefix: String,
}

impl AgentRegistry {
    pub fn new(store: Arc<dyn AgentStore>, key_prefix: String) -> Self {
        Self { store, key_prefix }
    }

    /// Issue a fresh opaque API key for a new agent
    pub fn register(&self, name: &str, owner: &str) -> (String, AgentIdentity) {
        let key = format!("{}{}", self.key_prefix, Uuid::new_v4().simple());
        let agent = AgentIdentity {
            id: Uuid::new_v4().simple().to_string()[..8].to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            registered_at: Utc::now(),
        };
        self.store.insert(key.clone(), agent.clone());
        info!(agent = %agent.id, name, "agent registered");
        (key, agent)
    }

    /// Look up the identity behind a presented key
    pub fn authenticate(&self, key: &str) -> GatewayResult<AgentIdentity> {
        self.store.get(key).ok_or(GatewayError::Unauthorized)
    }

    pub fn agent_count(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AgentRegistry {
        AgentRegistry::new(Arc::new(InMemoryAgentStore::new()), "bitswarp_sk_".into())
    }

    #[test]
    fn issued_keys_carry_the_fixed_prefix_and_authenticate() {
        let registry = registry();
        let (key, agent) = registry.register("trading-bot", "alice");
        assert!(key.starts_with("bitswarp_sk_"));
        assert!(key.len() > "bitswarp_sk_".len() + 20);

        let found = registry.authenticate(&key).unwrap();
        assert_eq!(found.id, agent.id);
        assert_eq!(found.name, "trading-bot");
    }

    #[test]
    fn unknown_keys_are_unauthorized() {
        let registry = registry();
        let err = registry.authenticate("bitswarp_sk_missing").unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized));
    }

    #[test]
    fn keys_are_unique_per_registration() {
        let registry = registry();
        let (a, _) = registry.register("one", "o");
        let (b, _) = registry.register("two", "o");
        assert_ne!(a, b);
        assert_eq!(registry.agent_count(), 2);
    }
}
