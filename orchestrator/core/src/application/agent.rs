// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::error::LifecycleError;
use crate::domain::agent::{AgentId, AgentStatusReport, MemoryHubAddress, RegistrationRecord};
use crate::domain::credential::Credential;
use crate::domain::state::AgentState;

/// Result of a successful initialize call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedAgent {
    pub agent_id: AgentId,
    pub memory_hub: MemoryHubAddress,
    /// True only when the call found a ready cache entry. Callers that
    /// joined an in-flight construction see `false`, as does the caller
    /// that ran it.
    pub already_initialized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub response: String,
    pub agent_state: AgentState,
    pub interaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMemorySnapshot {
    pub agent_id: AgentId,
    pub state: AgentState,
    pub last_updated: DateTime<Utc>,
}

#[async_trait]
pub trait AgentLifecycleService: Send + Sync {
    /// Claim `agent_id` in the identity registry for this manager's wallet.
    async fn register(&self, agent_id: &AgentId) -> Result<RegistrationRecord, LifecycleError>;

    /// Construct and cache the agent. Repeat calls return the cached agent
    /// and ignore `description` and `memory_hub`.
    async fn initialize(
        &self,
        agent_id: &AgentId,
        description: &str,
        memory_hub: Option<MemoryHubAddress>,
    ) -> Result<InitializedAgent, LifecycleError>;

    async fn query(
        &self,
        agent_id: &AgentId,
        query: &str,
        context: Option<Map<String, Value>>,
    ) -> Result<QueryOutcome, LifecycleError>;

    /// Never fails; registry trouble reads as "not registered".
    async fn status(&self, agent_id: &AgentId) -> AgentStatusReport;

    async fn memory(&self, agent_id: &AgentId) -> Result<AgentMemorySnapshot, LifecycleError>;

    fn is_initialized(&self, agent_id: &AgentId) -> bool;

    fn wallet_address(&self) -> &Credential;
}
