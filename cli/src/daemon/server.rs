// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon HTTP server implementation

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use agent_host_core::{
    application::{
        agent::AgentLifecycleService,
        lifecycle::{LifecycleSettings, ManagerIdentity, StandardAgentLifecycleService},
    },
    domain::{agent::MemoryHubAddress, host_config::HostConfigManifest, llm::GenerationOptions},
    infrastructure::{
        identity_registry::InMemoryRegistryConnector,
        llm::provider_from_config,
        local_runtime::{ConversationLog, LocalAgentRuntime},
    },
    presentation::api,
};

/// Wire the lifecycle manager from a validated configuration.
pub async fn build_lifecycle_service(
    config: &HostConfigManifest,
) -> Result<Arc<dyn AgentLifecycleService>> {
    let spec = &config.spec;

    let (llm, options) = match &spec.llm {
        Some(llm_config) => {
            let (provider, options) = provider_from_config(llm_config)
                .context("Failed to initialize LLM provider")?;
            if let Err(e) = provider.health_check().await {
                warn!("LLM provider health check failed: {}", e);
            }
            (Some(provider), options)
        }
        None => {
            warn!("No spec.llm configured; queries will fail until one is set");
            (None, GenerationOptions::default())
        }
    };
    let runtime = LocalAgentRuntime::new(ConversationLog::new(), llm, options);

    let identity = ManagerIdentity {
        wallet_address: spec.identity.wallet_address.clone(),
        secret_key: config
            .secret_key()
            .context("Failed to resolve spec.identity.secret_key")?,
        membase_id: spec.identity.membase_id.clone(),
    };
    let settings = LifecycleSettings {
        default_memory_hub: MemoryHubAddress::parse(&spec.memory_hub.address)
            .context("Invalid spec.memory_hub.address")?,
        network: config.network(),
        settle_delay: Duration::from_millis(spec.memory_hub.settle_delay_ms),
        ..LifecycleSettings::default()
    };

    let service = StandardAgentLifecycleService::connect(
        identity,
        settings,
        Arc::new(InMemoryRegistryConnector::default()),
        Arc::new(runtime),
    )
    .await
    .context("Failed to initialize agent lifecycle manager")?;

    Ok(Arc::new(service))
}

pub async fn start_daemon(config: HostConfigManifest, port_override: Option<u16>) -> Result<()> {
    info!("agent-host daemon starting (PID: {})", std::process::id());

    config
        .validate()
        .context("Configuration validation failed")?;

    info!(
        "Configuration loaded: {}",
        serde_json::to_string(&config.display_masked().spec).unwrap_or_default()
    );

    let service = build_lifecycle_service(&config).await?;
    let app = api::app(service);

    let port = port_override.unwrap_or(config.spec.api.port);
    let addr = format!("{}:{}", config.spec.api.bind_address, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Daemon listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Daemon shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
