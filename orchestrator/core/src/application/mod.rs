// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent;
pub mod agent_cache;
pub mod error;
pub mod lifecycle;
pub mod state_sync;

pub use agent::{AgentLifecycleService, AgentMemorySnapshot, InitializedAgent, QueryOutcome};
pub use error::{LifecycleError, RegistryFailure};
pub use lifecycle::{LifecycleSettings, ManagerIdentity, StandardAgentLifecycleService};
