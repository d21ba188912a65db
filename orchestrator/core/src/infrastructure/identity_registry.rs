// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Identity Registry
//!
//! Process-local stand-in for the on-chain agent identity registry, used by
//! the development daemon and by tests.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Implements `IdentityRegistry` / `IdentityRegistryConnector`
//! - **Pattern:** Adapter (Hexagonal Architecture)
//!
//! One [`InMemoryIdentityLedger`] holds the name → owner table. Every client
//! produced by [`InMemoryRegistryConnector`] writes on behalf of the wallet it
//! was connected with, so several managers with different wallets can share a
//! ledger and observe each other's registrations.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::domain::credential::{ChainNetwork, Credential, RegistryBinding, UNOWNED_SENTINEL};
use crate::domain::registry::{IdentityRegistry, RegistryClientError, IdentityRegistryConnector};

/// Shared name → owner table.
#[derive(Clone, Default)]
pub struct InMemoryIdentityLedger {
    owners: Arc<DashMap<String, String>>,
    nonce: Arc<AtomicU64>,
}

impl InMemoryIdentityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner of `name`, or the unowned sentinel.
    pub fn owner_of(&self, name: &str) -> String {
        self.owners
            .get(name)
            .map(|owner| owner.value().clone())
            .unwrap_or_else(|| UNOWNED_SENTINEL.to_string())
    }

    /// Record `owner` for `name` unconditionally.
    pub fn assign(&self, name: impl Into<String>, owner: impl Into<String>) {
        self.owners.insert(name.into(), owner.into());
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Claim `name` for `owner` if nobody holds it. Returns the raw hash of
    /// the simulated transaction, without the `0x` prefix.
    fn claim(&self, name: &str, owner: &Credential, network: ChainNetwork) -> Result<String, RegistryClientError> {
        match self.owners.entry(name.to_string()) {
            Entry::Occupied(entry) => Err(RegistryClientError::Write(format!(
                "execution reverted: agent '{}' already registered to {}",
                name,
                entry.get()
            ))),
            Entry::Vacant(entry) => {
                let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
                let mut hasher = Sha256::new();
                hasher.update(network.as_str().as_bytes());
                hasher.update(name.as_bytes());
                hasher.update(owner.as_str().to_ascii_lowercase().as_bytes());
                hasher.update(nonce.to_be_bytes());
                entry.insert(owner.as_str().to_string());
                Ok(hex::encode(hasher.finalize()))
            }
        }
    }
}

/// Registry client bound to one wallet.
pub struct InMemoryIdentityRegistry {
    ledger: InMemoryIdentityLedger,
    wallet: Credential,
    network: ChainNetwork,
}

#[async_trait]
impl IdentityRegistry for InMemoryIdentityRegistry {
    async fn lookup_owner(&self, name: &str) -> Result<String, RegistryClientError> {
        Ok(self.ledger.owner_of(name))
    }

    async fn register(&self, name: &str) -> Result<String, RegistryClientError> {
        let tx = self.ledger.claim(name, &self.wallet, self.network)?;
        debug!(name = %name, wallet = %self.wallet, tx = %tx, "Recorded registration");
        Ok(tx)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRegistryConnector {
    ledger: InMemoryIdentityLedger,
}

impl InMemoryRegistryConnector {
    pub fn new(ledger: InMemoryIdentityLedger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &InMemoryIdentityLedger {
        &self.ledger
    }
}

#[async_trait]
impl IdentityRegistryConnector for InMemoryRegistryConnector {
    async fn connect(
        &self,
        binding: &RegistryBinding,
    ) -> Result<Arc<dyn IdentityRegistry>, RegistryClientError> {
        debug!(
            network = %binding.network,
            contract = %binding.contract_address,
            "Opening in-memory registry client"
        );
        Ok(Arc::new(InMemoryIdentityRegistry {
            ledger: self.ledger.clone(),
            wallet: binding.wallet.clone(),
            network: binding.network,
        }))
    }
}
