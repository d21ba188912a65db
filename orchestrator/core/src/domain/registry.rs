// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity Registry
//!
//! Domain interface for the on-chain agent identity registry, plus the pure
//! classification of registration failures.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption layer over the chain client. Implementations
//!   live in `infrastructure/`.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::credential::RegistryBinding;

/// Errors surfaced by a registry client. Messages are kept verbatim because
/// registration failures are classified from their text.
#[derive(Debug, Clone, Error)]
pub enum RegistryClientError {
    #[error("{0}")]
    Connection(String),
    #[error("{0}")]
    Lookup(String),
    #[error("{0}")]
    Write(String),
}

/// Read/write handle on the identity registry.
#[async_trait]
pub trait IdentityRegistry: Send + Sync {
    /// Owner address for `name`. Unregistered names yield an empty string or
    /// the all-zero sentinel address.
    async fn lookup_owner(&self, name: &str) -> Result<String, RegistryClientError>;

    /// Register `name` under the bound wallet; returns the raw transaction
    /// hash as reported by the chain client.
    async fn register(&self, name: &str) -> Result<String, RegistryClientError>;
}

/// Opens registry clients for a wallet/network binding.
#[async_trait]
pub trait IdentityRegistryConnector: Send + Sync {
    async fn connect(
        &self,
        binding: &RegistryBinding,
    ) -> Result<Arc<dyn IdentityRegistry>, RegistryClientError>;
}

/// Category of a failed registration write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationFailureKind {
    InsufficientFunds,
    GasEstimation,
    Reverted,
    Generic,
}

/// Classify a registration failure from the client's error text.
///
/// Rules are checked in order, case-insensitively; the first match wins.
pub fn classify_registration_failure(message: &str) -> RegistrationFailureKind {
    let lowered = message.to_lowercase();
    if lowered.contains("insufficient funds") || lowered.contains("insufficient balance") {
        RegistrationFailureKind::InsufficientFunds
    } else if lowered.contains("gas")
        && (lowered.contains("required") || lowered.contains("exceeds"))
    {
        RegistrationFailureKind::GasEstimation
    } else if lowered.contains("revert") {
        RegistrationFailureKind::Reverted
    } else {
        RegistrationFailureKind::Generic
    }
}
