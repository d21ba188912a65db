// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::credential::{Credential, TransactionHash};
use crate::domain::runtime::AgentSession;

/// Memory Hub endpoint used when neither the config nor the caller names one.
pub const DEFAULT_MEMORY_HUB_ADDRESS: &str = "54.169.29.193:8081";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentIdError {
    #[error("agent_id cannot be empty")]
    Empty,
}

/// Name an agent is registered and cached under.
///
/// Case-sensitive and otherwise unconstrained beyond being non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, AgentIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(AgentIdError::Empty);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AgentId {
    type Error = AgentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AgentId> for String {
    fn from(value: AgentId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryHubAddressError {
    #[error("memory hub address cannot be empty or whitespace only")]
    Empty,

    #[error("memory hub address must have format 'host:port', got: {0}")]
    Format(String),

    #[error("memory hub address host cannot be empty")]
    EmptyHost,

    #[error("memory hub address port must be a valid number, got: {0}")]
    PortNotNumeric(String),

    #[error("memory hub address port must be between 1 and 65535, got: {0}")]
    PortOutOfRange(u32),
}

/// `host:port` endpoint of a Memory Hub deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryHubAddress(String);

impl MemoryHubAddress {
    /// Strict `host:port` parse used when validating configuration.
    pub fn parse(raw: &str) -> Result<Self, MemoryHubAddressError> {
        if raw.trim().is_empty() {
            return Err(MemoryHubAddressError::Empty);
        }
        let parts: Vec<&str> = raw.split(':').collect();
        let [host, port] = parts.as_slice() else {
            return Err(MemoryHubAddressError::Format(raw.to_string()));
        };
        if host.trim().is_empty() {
            return Err(MemoryHubAddressError::EmptyHost);
        }
        let port: u32 = port
            .parse()
            .map_err(|_| MemoryHubAddressError::PortNotNumeric(port.to_string()))?;
        if !(1..=65535).contains(&port) {
            return Err(MemoryHubAddressError::PortOutOfRange(port));
        }
        Ok(Self(raw.to_string()))
    }

    /// Accept a caller-supplied endpoint verbatim; the Memory Hub client is
    /// the authority on whether it is reachable.
    pub fn unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MemoryHubAddress {
    fn default() -> Self {
        Self(DEFAULT_MEMORY_HUB_ADDRESS.to_string())
    }
}

impl fmt::Display for MemoryHubAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a runtime needs to construct an agent session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub id: AgentId,
    pub description: String,
    pub memory_hub: MemoryHubAddress,
}

/// A live, initialized agent held by the lifecycle manager's cache.
///
/// Handles are shared as `Arc<AgentHandle>` and never mutated once cached;
/// two lookups for the same id yield pointer-equal handles.
pub struct AgentHandle {
    pub id: AgentId,
    pub description: String,
    pub memory_hub: MemoryHubAddress,
    pub initialized: bool,
    pub created_at: DateTime<Utc>,
    session: Arc<dyn AgentSession>,
}

impl AgentHandle {
    pub fn new(spec: AgentSpec, session: Arc<dyn AgentSession>) -> Self {
        Self {
            id: spec.id,
            description: spec.description,
            memory_hub: spec.memory_hub,
            initialized: true,
            created_at: Utc::now(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<dyn AgentSession> {
        &self.session
    }
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("memory_hub", &self.memory_hub)
            .field("initialized", &self.initialized)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentActivity {
    Active,
    Inactive,
}

impl AgentActivity {
    pub fn from_initialized(initialized: bool) -> Self {
        if initialized {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

impl fmt::Display for AgentActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// Combined cache + registry view of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatusReport {
    pub agent_id: AgentId,
    pub status: AgentActivity,
    pub registered: bool,
    pub wallet_address: String,
    pub memory_hub_connected: bool,
}

/// Successful result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub transaction_hash: TransactionHash,
    pub agent_id: AgentId,
    pub wallet_address: Credential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_rejects_empty() {
        assert_eq!(AgentId::parse(""), Err(AgentIdError::Empty));
        assert_eq!(AgentId::parse(" ").unwrap().as_str(), " ");
    }

    #[test]
    fn test_agent_id_is_case_sensitive() {
        assert_ne!(AgentId::parse("Agent").unwrap(), AgentId::parse("agent").unwrap());
    }

    #[test]
    fn test_agent_id_deserialize_validates() {
        let parsed: Result<AgentId, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
        let parsed: AgentId = serde_json::from_str("\"agentA\"").unwrap();
        assert_eq!(parsed.as_str(), "agentA");
    }

    #[test]
    fn test_memory_hub_address_validation() {
        assert!(MemoryHubAddress::parse("54.169.29.193:8081").is_ok());
        assert_eq!(MemoryHubAddress::parse("   "), Err(MemoryHubAddressError::Empty));
        assert!(matches!(
            MemoryHubAddress::parse("localhost"),
            Err(MemoryHubAddressError::Format(_))
        ));
        assert!(matches!(
            MemoryHubAddress::parse("a:b:c"),
            Err(MemoryHubAddressError::Format(_))
        ));
        assert_eq!(
            MemoryHubAddress::parse(":8081"),
            Err(MemoryHubAddressError::EmptyHost)
        );
        assert!(matches!(
            MemoryHubAddress::parse("host:http"),
            Err(MemoryHubAddressError::PortNotNumeric(_))
        ));
        assert_eq!(
            MemoryHubAddress::parse("host:0"),
            Err(MemoryHubAddressError::PortOutOfRange(0))
        );
        assert_eq!(
            MemoryHubAddress::parse("host:70000"),
            Err(MemoryHubAddressError::PortOutOfRange(70000))
        );
    }

    #[test]
    fn test_activity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AgentActivity::from_initialized(true)).unwrap(),
            "\"active\""
        );
        assert_eq!(AgentActivity::from_initialized(false).to_string(), "inactive");
    }
}
