// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon mode implementation
//!
//! Handles:
//! - Building the lifecycle manager from configuration
//! - Serving the REST API with graceful shutdown
//! - HTTP health checks and the operator client

use anyhow::Result;
use std::time::Duration;

pub mod client;
pub mod server;

pub use client::DaemonClient;
pub use server::{build_lifecycle_service, start_daemon};

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonStatus {
    Running { service: String },
    Stopped,
    Unhealthy { error: String },
}

/// `http://host:port`, keeping an explicit scheme if one was given.
pub fn base_url(host: &str, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host.trim_end_matches('/'), port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// Check whether a daemon answers on `host:port` via its health endpoint.
pub async fn check_daemon_running(host: &str, port: u16) -> Result<DaemonStatus> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500)) // Fast timeout for local checks
        .build()?;

    let health_url = format!("{}/health", base_url(host, port));

    match client.get(&health_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let service = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v["service"].as_str().map(str::to_string))
                .unwrap_or_default();
            Ok(DaemonStatus::Running { service })
        }
        Ok(resp) => Ok(DaemonStatus::Unhealthy {
            error: format!("HTTP {}", resp.status()),
        }),
        Err(e) if e.is_connect() || e.is_timeout() => Ok(DaemonStatus::Stopped),
        Err(e) => Ok(DaemonStatus::Unhealthy {
            error: e.to_string(),
        }),
    }
}
