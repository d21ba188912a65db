// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Conversational State
//!
//! The Memory Hub is the system of record for an agent's conversation. The
//! types here are the *derived* view the lifecycle manager rebuilds from it
//! on every read: raw [`StoredMessage`]s are paired into [`Interaction`]s and
//! wrapped in an [`AgentState`] snapshot. Nothing in this module is ever
//! written back to the hub.
//!
//! The serialized shape (camelCase keys, Unix-second timestamps) is the one
//! clients of the REST surface already consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::agent::AgentId;

/// Version stamped on every reconstructed snapshot.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    #[serde(untagged)]
    Other(String),
}

/// One raw message as held by the Memory Hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: MessageRole,
    pub content: String,
    /// Unix seconds, when the hub recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl StoredMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
            metadata: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A paired user query and agent response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    pub user_query: String,
    pub agent_response: String,
    pub timestamp: i64,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

/// Versioned snapshot of an agent, rebuilt from the Memory Hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub version: u32,
    pub created_at: i64,
    pub updated_at: i64,
    pub membase_id: AgentId,
    pub wallet_address: String,
    pub registered_on_chain: bool,
    pub preferences: Map<String, Value>,
    /// Oldest first.
    pub interaction_history: Vec<Interaction>,
    pub goals: Vec<String>,
    pub learned_summary: String,
    pub memory_hub_connected: bool,
    pub last_sync_timestamp: i64,
}

impl AgentState {
    /// Well-formed state with no history; the shape every degraded read
    /// falls back to.
    pub fn empty(agent_id: AgentId, wallet_address: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::from_interactions(agent_id, wallet_address, Vec::new(), now)
    }

    pub fn from_interactions(
        agent_id: AgentId,
        wallet_address: impl Into<String>,
        interaction_history: Vec<Interaction>,
        now: DateTime<Utc>,
    ) -> Self {
        let ts = now.timestamp();
        Self {
            version: STATE_VERSION,
            created_at: ts,
            updated_at: ts,
            membase_id: agent_id,
            wallet_address: wallet_address.into(),
            registered_on_chain: true,
            preferences: Map::new(),
            interaction_history,
            goals: Vec::new(),
            learned_summary: String::new(),
            memory_hub_connected: true,
            last_sync_timestamp: ts,
        }
    }

    /// Shallow merge; keys from `context` overwrite existing preferences.
    pub fn merge_preferences(&mut self, context: &Map<String, Value>) {
        for (key, value) in context {
            self.preferences.insert(key.clone(), value.clone());
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.timestamp();
        self.last_sync_timestamp = now.timestamp();
    }
}

/// Pair raw messages strictly in sequence: message `i` with `i + 1`, stepping
/// by two. Only a `user` message followed by an `assistant` message becomes
/// an [`Interaction`]; mismatched pairs and a trailing odd message are
/// dropped.
pub fn pair_interactions(messages: &[StoredMessage], now: DateTime<Utc>) -> Vec<Interaction> {
    messages
        .chunks_exact(2)
        .filter_map(|pair| match (&pair[0].role, &pair[1].role) {
            (MessageRole::User, MessageRole::Assistant) => Some(Interaction {
                id: Uuid::new_v4().to_string(),
                user_query: pair[0].content.clone(),
                agent_response: pair[1].content.clone(),
                timestamp: pair[0].timestamp.unwrap_or_else(|| now.timestamp()),
                context: Some(pair[0].metadata.clone().unwrap_or_default()),
            }),
            _ => None,
        })
        .collect()
}
