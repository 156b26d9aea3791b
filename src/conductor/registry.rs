// SPDX-License-Identifier: MIT

use crate::adk::agent::Agent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Agent lookup handed to the executor at call time
#[async_trait]
pub trait AgentRegistry: Send + Sync {
    async fn get(&self, agent_id: &str) -> Option<Arc<Agent>>;
}

#[derive(Clone)]
pub struct InMemoryAgentRegistry {
    agents: Arc<RwLock<HashMap<String, Arc<Agent>>>>,
}

impl InMemoryAgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register under the agent's own id, replacing any earlier entry
    pub async fn register(&self, agent: Arc<Agent>) {
        let mut agents = self.agents.write().await;
        agents.insert(agent.id().to_string(), agent);
    }

    pub async fn ids(&self) -> Vec<String> {
        let agents = self.agents.read().await;
        let mut ids: Vec<String> = agents.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryAgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentRegistry for InMemoryAgentRegistry {
    async fn get(&self, agent_id: &str) -> Option<Arc<Agent>> {
        let agents = self.agents.read().await;
        agents.get(agent_id).cloned()
    }
}
