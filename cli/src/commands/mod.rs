// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the agent-host CLI

pub mod agent;
pub mod config;

pub use self::agent::AgentCommand;
pub use self::config::ConfigCommand;
