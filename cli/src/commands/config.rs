// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use agent_host_core::domain::host_config::HostConfigManifest;

pub const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
pub const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration (secrets masked)
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./agent-host.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = HostConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. AGENT_HOST_CONFIG_PATH: {}",
            std::env::var("AGENT_HOST_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./agent-host.yaml");
        println!("  4. ~/.agent-host/config.yaml");
        println!("  5. /etc/agent-host/config.yaml");
        println!();
    }

    let masked = config.display_masked();
    let spec = &masked.spec;

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Identity:".bold());
    println!("  Wallet: {}", or_unset(&spec.identity.wallet_address));
    println!("  Membase ID: {}", or_unset(&spec.identity.membase_id));
    println!("  Secret key: {}", or_unset(&spec.identity.secret_key));
    println!();

    println!("{}", "Chain:".bold());
    println!("  Network: {} ({})", spec.chain.network, masked.network().as_str());
    println!("  RPC endpoint: {}", masked.network().rpc_endpoint());
    println!();

    println!("{}", "Memory Hub:".bold());
    println!("  Default address: {}", spec.memory_hub.address);
    println!("  Settle delay: {}ms", spec.memory_hub.settle_delay_ms);
    println!();

    println!("{}", "LLM:".bold());
    match &spec.llm {
        Some(llm) => {
            println!("  Type: {:?}", llm.provider_type);
            println!("  Endpoint: {}", llm.endpoint);
            println!("  Model: {}", llm.model);
        }
        None => println!("  {}", "(not configured)".dimmed()),
    }
    println!();

    println!("{}", "API:".bold());
    println!("  Listen: {}:{}", spec.api.bind_address, spec.api.port);
    println!();

    Ok(())
}

fn or_unset(value: &str) -> String {
    if value.is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        value.to_string()
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = HostConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
