// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`agent-host-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. Handlers only parse, delegate to
//! [`crate::application::agent::AgentLifecycleService`] and render.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Agent lifecycle REST endpoints |

pub mod api;
