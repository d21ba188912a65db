// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::agent::{
    AgentLifecycleService, AgentMemorySnapshot, InitializedAgent, QueryOutcome,
};
use crate::application::agent_cache::{Admission, AgentCache};
use crate::application::error::{LifecycleError, RegistryFailure};
use crate::application::state_sync::{
    load_state_or_default, reconcile_after_query, CompletedExchange, STATE_WINDOW,
};
use crate::domain::agent::{
    AgentActivity, AgentHandle, AgentId, AgentSpec, AgentStatusReport, MemoryHubAddress,
    RegistrationRecord,
};
use crate::domain::credential::{
    owner_from_lookup, ChainNetwork, Credential, RegistryBinding, TransactionHash,
};
use crate::domain::registry::{IdentityRegistry, IdentityRegistryConnector};
use crate::domain::runtime::{AgentRuntime, ResponseRequest, DEFAULT_RECENCY_BOUND};

/// Identity strings a manager is constructed from. Validated by
/// [`StandardAgentLifecycleService::connect`].
#[derive(Clone)]
pub struct ManagerIdentity {
    pub wallet_address: String,
    pub secret_key: String,
    pub membase_id: String,
}

impl fmt::Debug for ManagerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerIdentity")
            .field("wallet_address", &self.wallet_address)
            .field("secret_key", &"**********")
            .field("membase_id", &self.membase_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// Used for agents initialized without an explicit hub.
    pub default_memory_hub: MemoryHubAddress,
    pub network: ChainNetwork,
    /// Wait between a response and the post-query re-read.
    pub settle_delay: Duration,
    pub state_window: usize,
    pub recency_bound: usize,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            default_memory_hub: MemoryHubAddress::default(),
            network: ChainNetwork::default(),
            settle_delay: Duration::from_millis(500),
            state_window: STATE_WINDOW,
            recency_bound: DEFAULT_RECENCY_BOUND,
        }
    }
}

pub struct StandardAgentLifecycleService {
    wallet: Credential,
    membase_id: String,
    settings: LifecycleSettings,
    registry: Arc<dyn IdentityRegistry>,
    runtime: Arc<dyn AgentRuntime>,
    cache: AgentCache,
}

impl StandardAgentLifecycleService {
    /// Validate the identity, connect to the registry for the configured
    /// network and probe it once.
    pub async fn connect(
        identity: ManagerIdentity,
        settings: LifecycleSettings,
        connector: Arc<dyn IdentityRegistryConnector>,
        runtime: Arc<dyn AgentRuntime>,
    ) -> Result<Self, LifecycleError> {
        let wallet = Credential::parse(&identity.wallet_address).map_err(|e| {
            error!("Invalid MEMBASE_ACCOUNT: {}", e);
            LifecycleError::Configuration(format!("MEMBASE_ACCOUNT: {}", e))
        })?;
        if identity.secret_key.trim().is_empty() {
            error!("MEMBASE_SECRET_KEY is not set");
            return Err(LifecycleError::Configuration(
                "MEMBASE_SECRET_KEY environment variable is required".to_string(),
            ));
        }
        if identity.membase_id.trim().is_empty() {
            error!("MEMBASE_ID is not set");
            return Err(LifecycleError::Configuration(
                "MEMBASE_ID environment variable is required".to_string(),
            ));
        }

        let binding = RegistryBinding::new(wallet.clone(), identity.secret_key, settings.network);
        info!(
            network = %binding.network,
            rpc_endpoint = %binding.rpc_endpoint,
            contract = %binding.contract_address,
            wallet = %binding.wallet,
            "Connecting to identity registry"
        );

        let registry = connector.connect(&binding).await.map_err(|e| {
            error!("Failed to connect to identity registry: {}", e);
            RegistryFailure::Connection(e.to_string())
        })?;

        // The probe name never exists; only the round trip matters.
        let probe = format!("test_connection_{}", &Uuid::new_v4().simple().to_string()[..8]);
        match registry.lookup_owner(&probe).await {
            Ok(_) => debug!(probe = %probe, "Registry probe answered"),
            Err(e) => debug!(probe = %probe, error = %e, "Registry probe failed"),
        }

        info!(
            wallet = %wallet,
            membase_id = %identity.membase_id,
            "Agent lifecycle manager ready"
        );

        Ok(Self {
            wallet,
            membase_id: identity.membase_id,
            settings,
            registry,
            runtime,
            cache: AgentCache::new(),
        })
    }

    pub fn membase_id(&self) -> &str {
        &self.membase_id
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// The live cached handle, if `agent_id` is initialized.
    pub fn cached_handle(&self, agent_id: &AgentId) -> Option<Arc<AgentHandle>> {
        self.cache.get(agent_id)
    }

    pub fn initialized_count(&self) -> usize {
        self.cache.len()
    }

    fn require_handle(&self, agent_id: &AgentId) -> Result<Arc<AgentHandle>, LifecycleError> {
        self.cache
            .get(agent_id)
            .ok_or_else(|| LifecycleError::NotInitialized(agent_id.clone()))
    }
}

#[async_trait]
impl AgentLifecycleService for StandardAgentLifecycleService {
    async fn register(&self, agent_id: &AgentId) -> Result<RegistrationRecord, LifecycleError> {
        info!(agent_id = %agent_id, "Registering agent on-chain");

        match self.registry.lookup_owner(agent_id.as_str()).await {
            Ok(raw) => {
                if let Some(owner) = owner_from_lookup(&raw) {
                    if !self.wallet.matches(owner) {
                        warn!(agent_id = %agent_id, owner = %owner, "Agent is registered to another wallet");
                        return Err(RegistryFailure::RegistrationConflict {
                            agent_id: agent_id.clone(),
                            owner: owner.to_string(),
                        }
                        .into());
                    }
                    info!(agent_id = %agent_id, "Agent already registered to this wallet");
                    return Ok(RegistrationRecord {
                        transaction_hash: TransactionHash::placeholder(),
                        agent_id: agent_id.clone(),
                        wallet_address: self.wallet.clone(),
                    });
                }
            }
            Err(e) => {
                // Lookups of unknown names may fail outright.
                info!(agent_id = %agent_id, error = %e, "Owner lookup failed, proceeding with registration");
            }
        }

        let raw = self.registry.register(agent_id.as_str()).await.map_err(|e| {
            let failure = RegistryFailure::from_write_error(e.to_string());
            error!(agent_id = %agent_id, code = failure.code(), "Agent registration failed: {}", e);
            failure
        })?;

        let transaction_hash = TransactionHash::normalize(&raw).map_err(|e| {
            error!(agent_id = %agent_id, "Invalid transaction hash returned from registry: {}", e);
            RegistryFailure::Generic(format!("Invalid transaction hash returned from blockchain: {}", e))
        })?;

        info!(
            agent_id = %agent_id,
            transaction_hash = %transaction_hash,
            wallet = %self.wallet,
            "Agent registered successfully"
        );

        Ok(RegistrationRecord {
            transaction_hash,
            agent_id: agent_id.clone(),
            wallet_address: self.wallet.clone(),
        })
    }

    async fn initialize(
        &self,
        agent_id: &AgentId,
        description: &str,
        memory_hub: Option<MemoryHubAddress>,
    ) -> Result<InitializedAgent, LifecycleError> {
        let spec = AgentSpec {
            id: agent_id.clone(),
            description: description.to_string(),
            memory_hub: memory_hub.unwrap_or_else(|| self.settings.default_memory_hub.clone()),
        };
        let runtime = self.runtime.clone();

        let admission = self
            .cache
            .get_or_try_init(agent_id, move || async move {
                info!(
                    agent_id = %spec.id,
                    memory_hub = %spec.memory_hub,
                    description = %spec.description,
                    "Initializing agent"
                );
                let failed = |reason: String| LifecycleError::AgentInitialization {
                    agent_id: spec.id.clone(),
                    reason,
                };

                let session = runtime
                    .create_session(&spec)
                    .await
                    .map_err(|e| failed(e.to_string()))?;
                session.initialize().await.map_err(|e| failed(e.to_string()))?;

                info!(agent_id = %spec.id, memory_hub = %spec.memory_hub, "Agent initialized successfully");
                Ok::<_, LifecycleError>(Arc::new(AgentHandle::new(spec, session)))
            })
            .await
            .map_err(|e| {
                error!(agent_id = %agent_id, "Agent initialization failed: {}", e);
                e
            })?;

        let already_initialized = matches!(admission, Admission::Cached(_));
        if already_initialized {
            info!(agent_id = %agent_id, "Agent already initialized");
        }
        let handle = admission.into_handle();

        Ok(InitializedAgent {
            agent_id: handle.id.clone(),
            memory_hub: handle.memory_hub.clone(),
            already_initialized,
        })
    }

    async fn query(
        &self,
        agent_id: &AgentId,
        query: &str,
        context: Option<Map<String, Value>>,
    ) -> Result<QueryOutcome, LifecycleError> {
        let handle = self.require_handle(agent_id)?;
        let interaction_id = Uuid::new_v4().to_string();
        let preview: String = query.chars().take(100).collect();
        info!(agent_id = %agent_id, interaction_id = %interaction_id, query = %preview, "Processing query");

        let previous =
            load_state_or_default(&handle, self.wallet.as_str(), self.settings.state_window).await;

        let request = ResponseRequest {
            query: query.to_string(),
            use_history: true,
            recency_bound: self.settings.recency_bound,
            allow_tools: true,
        };
        let response = handle.session().respond(&request).await.map_err(|e| {
            error!(agent_id = %agent_id, interaction_id = %interaction_id, "LLM processing failed: {}", e);
            LifecycleError::QueryProcessing {
                agent_id: agent_id.clone(),
                reason: format!("LLM API error: {}", e),
            }
        })?;
        debug!(agent_id = %agent_id, response_len = response.len(), "Response generated");

        let agent_state = reconcile_after_query(
            &handle,
            self.wallet.as_str(),
            self.settings.state_window,
            self.settings.settle_delay,
            previous,
            CompletedExchange {
                interaction_id: &interaction_id,
                query,
                response: &response,
                context: context.as_ref(),
            },
        )
        .await;

        info!(agent_id = %agent_id, interaction_id = %interaction_id, "Query processed successfully");

        Ok(QueryOutcome {
            response,
            agent_state,
            interaction_id,
        })
    }

    async fn status(&self, agent_id: &AgentId) -> AgentStatusReport {
        let initialized = self.cache.contains(agent_id);

        // The sentinel is reported as-is; only a failed or empty lookup falls
        // back to this manager's wallet.
        let looked_up = match self.registry.lookup_owner(agent_id.as_str()).await {
            Ok(raw) => Some(raw.trim().to_string()).filter(|owner| !owner.is_empty()),
            Err(e) => {
                debug!(agent_id = %agent_id, error = %e, "Owner lookup failed, reporting unregistered");
                None
            }
        };
        let registered = looked_up
            .as_deref()
            .and_then(owner_from_lookup)
            .is_some();

        AgentStatusReport {
            agent_id: agent_id.clone(),
            status: AgentActivity::from_initialized(initialized),
            registered,
            wallet_address: looked_up.unwrap_or_else(|| self.wallet.to_string()),
            memory_hub_connected: initialized,
        }
    }

    async fn memory(&self, agent_id: &AgentId) -> Result<AgentMemorySnapshot, LifecycleError> {
        let handle = self.require_handle(agent_id)?;
        let state =
            load_state_or_default(&handle, self.wallet.as_str(), self.settings.state_window).await;
        debug!(
            agent_id = %agent_id,
            interactions = state.interaction_history.len(),
            "Retrieved agent memory"
        );

        Ok(AgentMemorySnapshot {
            agent_id: agent_id.clone(),
            state,
            last_updated: Utc::now(),
        })
    }

    fn is_initialized(&self, agent_id: &AgentId) -> bool {
        self.cache.contains(agent_id)
    }

    fn wallet_address(&self) -> &Credential {
        &self.wallet
    }
}
