// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value objects, derived agent state and the capability interfaces the
//! lifecycle manager depends on.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and traits; no I/O

pub mod agent;
pub mod credential;
pub mod host_config;
pub mod llm;
pub mod registry;
pub mod runtime;
pub mod state;
