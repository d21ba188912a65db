// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # agent-host
//!
//! The `agent-host` binary runs the agent lifecycle manager behind its REST
//! API and doubles as an operator client for a running instance.
//!
//! ## Commands
//!
//! - `agent-host serve` - Run the HTTP daemon in the foreground
//! - `agent-host agent register|init|query|status|memory` - Talk to a running daemon
//! - `agent-host config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use agent_host::commands::{self, AgentCommand, ConfigCommand};
use agent_host::daemon;
use agent_host_core::domain::host_config::HostConfigManifest;

/// agent-host - register, initialize and query AI agents
#[derive(Parser)]
#[command(name = "agent-host")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AGENT_HOST_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (default: spec.api.port, 5000)
    #[arg(long, global = true, env = "AGENT_HOST_PORT")]
    port: Option<u16>,

    /// Daemon host for client commands
    #[arg(long, global = true, env = "AGENT_HOST_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AGENT_HOST_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP daemon in the foreground
    #[command(name = "serve")]
    Serve,

    /// Agent lifecycle operations against a running daemon
    #[command(name = "agent")]
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = HostConfigManifest::load_or_default(cli.config.clone())
                .context("Failed to load configuration")?;
            let logging = config
                .spec
                .observability
                .as_ref()
                .and_then(|o| o.logging.clone())
                .unwrap_or_default();
            let level = cli.log_level.as_deref().unwrap_or(&logging.level);
            init_logging(level, &logging.format)?;

            info!("Starting agent-host daemon");
            daemon::start_daemon(config, cli.port).await
        }
        Commands::Agent { command } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
            let port = cli.port.unwrap_or(daemon::DEFAULT_PORT);
            commands::agent::handle_command(command, &cli.host, port).await
        }
        Commands::Config { command } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "text")?;
            commands::config::handle_command(command, cli.config).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
