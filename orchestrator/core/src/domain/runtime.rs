// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Runtime
//!
//! Capability boundary between the lifecycle manager and whatever actually
//! hosts an agent's conversation (Memory Hub session + reasoning engine).
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Abstracts agent construction, memory reads and response
//!   generation so the application layer can be tested with fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::agent::AgentSpec;
use crate::domain::state::StoredMessage;

/// Number of recent messages the engine is allowed to consider as history.
pub const DEFAULT_RECENCY_BOUND: usize = 16;

/// One response request handed to an agent session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRequest {
    pub query: String,
    pub use_history: bool,
    pub recency_bound: usize,
    pub allow_tools: bool,
}

impl ResponseRequest {
    /// History-aware, tool-enabled request used by the query flow.
    pub fn conversational(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            use_history: true,
            recency_bound: DEFAULT_RECENCY_BOUND,
            allow_tools: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Memory hub unreachable: {0}")]
    MemoryHubUnavailable(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Memory hub unreachable: {0}")]
    Unavailable(String),
    #[error("Conversation not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Provider(String),
    #[error("Failed to persist conversation: {0}")]
    Memory(#[from] MemoryError),
}

/// Builds agent sessions bound to a Memory Hub.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Construct a new, not yet initialized session for `spec`.
    async fn create_session(&self, spec: &AgentSpec) -> Result<Arc<dyn AgentSession>, RuntimeError>;
}

/// A single agent's live session.
#[async_trait]
pub trait AgentSession: Send + Sync {
    /// One-time initialization against the Memory Hub.
    async fn initialize(&self) -> Result<(), RuntimeError>;

    /// Most recent `limit` messages of the agent's conversation, oldest
    /// first.
    async fn fetch_recent_messages(&self, limit: usize) -> Result<Vec<StoredMessage>, MemoryError>;

    /// Produce a reply; the session records both sides of the exchange.
    async fn respond(&self, request: &ResponseRequest) -> Result<String, EngineError>;
}
