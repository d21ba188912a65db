// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lifecycle error taxonomy.
//!
//! Every failure the lifecycle manager reports is one of these variants. The
//! stable [`LifecycleError::code`] is what the REST layer puts on the wire,
//! and [`LifecycleError::is_retryable`] tells callers whether repeating the
//! same request can succeed without an external action first.
//!
//! Errors are `Clone` because a failed in-flight initialization is handed to
//! every caller that was waiting on it.

use thiserror::Error;

use crate::domain::agent::AgentId;
use crate::domain::registry::{classify_registration_failure, RegistrationFailureKind};

/// Registry-layer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryFailure {
    #[error("Failed to connect to identity registry: {0}")]
    Connection(String),

    #[error("Agent {agent_id} is already registered to {owner}")]
    RegistrationConflict { agent_id: AgentId, owner: String },

    #[error("Insufficient funds for registration: {0}")]
    InsufficientFunds(String),

    #[error("Gas estimation failed: {0}")]
    GasEstimation(String),

    #[error("Registration transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Blockchain error: {0}")]
    Generic(String),
}

impl RegistryFailure {
    /// Map a failed registration write onto its failure kind.
    pub fn from_write_error(message: impl Into<String>) -> Self {
        let message = message.into();
        match classify_registration_failure(&message) {
            RegistrationFailureKind::InsufficientFunds => Self::InsufficientFunds(message),
            RegistrationFailureKind::GasEstimation => Self::GasEstimation(message),
            RegistrationFailureKind::Reverted => Self::TransactionReverted(message),
            RegistrationFailureKind::Generic => Self::Generic(message),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection(_) | Self::Generic(_) => "BLOCKCHAIN_ERROR",
            Self::RegistrationConflict { .. } => "AGENT_ALREADY_REGISTERED",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::GasEstimation(_) => "GAS_ESTIMATION_FAILED",
            Self::TransactionReverted(_) => "TRANSACTION_REVERTED",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Generic(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Registry(#[from] RegistryFailure),

    #[error("Failed to initialize agent {agent_id}: {reason}")]
    AgentInitialization { agent_id: AgentId, reason: String },

    #[error("Agent {0} not initialized")]
    NotInitialized(AgentId),

    #[error("Query processing failed for agent {agent_id}: {reason}")]
    QueryProcessing { agent_id: AgentId, reason: String },
}

impl LifecycleError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIG_MISSING",
            Self::Registry(failure) => failure.code(),
            Self::AgentInitialization { .. } => "AGENT_INITIALIZATION_ERROR",
            Self::NotInitialized(_) => "AGENT_NOT_FOUND",
            Self::QueryProcessing { .. } => "QUERY_PROCESSING_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration(_) | Self::NotInitialized(_) => false,
            Self::Registry(failure) => failure.is_retryable(),
            Self::AgentInitialization { .. } | Self::QueryProcessing { .. } => true,
        }
    }
}
