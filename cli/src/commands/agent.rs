// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent lifecycle commands, delegated to a running daemon
//!
//! Commands: register, init, query, status, memory

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::{Map, Value};

use crate::daemon::{check_daemon_running, DaemonClient, DaemonStatus};

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Register an agent name on-chain under the daemon's wallet
    Register {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,
    },

    /// Initialize an agent against its Memory Hub
    Init {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,

        /// What the agent does; used as its system prompt
        #[arg(short, long)]
        description: String,

        /// Memory Hub `host:port` (default: daemon's spec.memory_hub.address)
        #[arg(long, value_name = "HOST:PORT")]
        memory_hub: Option<String>,
    },

    /// Send a query to an initialized agent
    Query {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,

        #[arg(value_name = "QUERY")]
        query: String,

        /// JSON object merged into the agent's preferences
        #[arg(long, value_name = "JSON")]
        context: Option<String>,
    },

    /// Show registration and initialization status
    Status {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,
    },

    /// Show the agent's reconstructed state
    Memory {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,

        /// Print the raw state as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(command: AgentCommand, host: &str, port: u16) -> Result<()> {
    match check_daemon_running(host, port).await {
        Ok(DaemonStatus::Running { .. }) => {}
        Ok(DaemonStatus::Unhealthy { error }) => {
            println!("{}", format!("⚠ Daemon is reachable but unhealthy: {}", error).yellow());
            return Ok(());
        }
        _ => {
            println!("{}", "Agent commands require a running daemon.".red());
            println!("Run 'agent-host serve' to start it.");
            return Ok(());
        }
    }

    let client = DaemonClient::new(host, port)?;

    match command {
        AgentCommand::Register { agent_id } => register(&client, &agent_id).await,
        AgentCommand::Init {
            agent_id,
            description,
            memory_hub,
        } => init(&client, &agent_id, &description, memory_hub.as_deref()).await,
        AgentCommand::Query {
            agent_id,
            query,
            context,
        } => {
            let context = context.as_deref().map(parse_context).transpose()?;
            run_query(&client, &agent_id, &query, context).await
        }
        AgentCommand::Status { agent_id } => status(&client, &agent_id).await,
        AgentCommand::Memory { agent_id, json } => memory(&client, &agent_id, json).await,
    }
}

/// Parse `--context` into a JSON object.
pub fn parse_context(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("--context must be valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("--context must be a JSON object, got: {}", other),
    }
}

async fn register(client: &DaemonClient, agent_id: &str) -> Result<()> {
    let response = client.register(agent_id).await?;

    println!("{}", format!("✓ Agent {} registered", response.agent_id).green());
    println!("  Wallet:      {}", response.wallet_address);
    if response.transaction_hash.trim_start_matches("0x").chars().all(|c| c == '0') {
        println!("  Transaction: {}", "(already registered)".dimmed());
    } else {
        println!("  Transaction: {}", response.transaction_hash);
    }
    Ok(())
}

async fn init(
    client: &DaemonClient,
    agent_id: &str,
    description: &str,
    memory_hub: Option<&str>,
) -> Result<()> {
    let response = client.initialize(agent_id, description, memory_hub).await?;
    println!(
        "{}",
        format!("✓ Agent {} {}", response.agent_id, response.status).green()
    );
    Ok(())
}

async fn run_query(
    client: &DaemonClient,
    agent_id: &str,
    query: &str,
    context: Option<Map<String, Value>>,
) -> Result<()> {
    let response = client.query(agent_id, query, context).await?;

    println!("{}", response.response);
    println!();
    println!(
        "{}",
        format!(
            "interaction {} · {} interactions in memory",
            response.interaction_id,
            response.agent_state.interaction_history.len()
        )
        .dimmed()
    );
    Ok(())
}

async fn status(client: &DaemonClient, agent_id: &str) -> Result<()> {
    let report = client.status(agent_id).await?;

    let status = report.status.to_string();
    let status = if status == "active" {
        status.green()
    } else {
        status.yellow()
    };

    println!("{}", format!("Agent {}", report.agent_id).bold());
    println!("  Status:     {}", status);
    println!("  Registered: {}", report.registered);
    println!("  Wallet:     {}", report.wallet_address);
    println!("  Memory Hub: {}", if report.memory_hub_connected { "connected" } else { "not connected" });
    Ok(())
}

async fn memory(client: &DaemonClient, agent_id: &str, as_json: bool) -> Result<()> {
    let snapshot = client.memory(agent_id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&snapshot.state)?);
        return Ok(());
    }

    let state = &snapshot.state;
    println!("{}", format!("Agent {}", snapshot.agent_id).bold());
    println!("  Last updated: {}", snapshot.last_updated);
    println!("  Interactions: {}", state.interaction_history.len());
    if !state.preferences.is_empty() {
        println!("  Preferences:  {}", Value::Object(state.preferences.clone()));
    }
    for interaction in &state.interaction_history {
        println!();
        println!("  {} {}", "user:".cyan(), interaction.user_query);
        println!("  {} {}", "agent:".magenta(), interaction.agent_response);
    }
    Ok(())
}
