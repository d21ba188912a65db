// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent host core
//!
//! Manages the lifecycle of AI agents on behalf of one operator wallet:
//! on-chain identity registration, Memory Hub sessions, query processing
//! and agent state reconstruction.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, lifecycle service, adapters and REST surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
