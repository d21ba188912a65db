// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod identity_registry;
pub mod llm;
pub mod local_runtime;

pub use identity_registry::{InMemoryIdentityLedger, InMemoryIdentityRegistry, InMemoryRegistryConnector};
pub use local_runtime::{ConversationLog, LocalAgentRuntime};
