// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each provider adapter translates between the domain `LLMProvider`
// interface and an external chat API.

pub mod ollama;
pub mod openai;

use std::sync::Arc;
use tracing::info;

use crate::domain::host_config::{resolve_env_reference, LlmConfig, LlmProviderType};
use crate::domain::llm::{GenerationOptions, LLMProvider};

pub use ollama::OllamaAdapter;
pub use openai::OpenAIAdapter;

/// Build the configured provider together with its generation options.
pub fn provider_from_config(
    config: &LlmConfig,
) -> anyhow::Result<(Arc<dyn LLMProvider>, GenerationOptions)> {
    let api_key = match &config.api_key {
        Some(key) => resolve_env_reference(key)?,
        None => String::new(), // For local providers without auth
    };

    info!(
        provider = ?config.provider_type,
        endpoint = %config.endpoint,
        model = %config.model,
        "Initializing LLM provider"
    );

    let provider: Arc<dyn LLMProvider> = match config.provider_type {
        LlmProviderType::Openai => {
            if api_key.is_empty() {
                anyhow::bail!("spec.llm.api_key is required for provider type 'openai'");
            }
            Arc::new(OpenAIAdapter::new(
                config.endpoint.clone(),
                api_key,
                config.model.clone(),
            ))
        }
        LlmProviderType::OpenaiCompatible => Arc::new(OpenAIAdapter::compatible(
            config.endpoint.clone(),
            api_key,
            config.model.clone(),
        )),
        LlmProviderType::Ollama => Arc::new(OllamaAdapter::new(
            config.endpoint.clone(),
            config.model.clone(),
        )),
    };

    let defaults = GenerationOptions::default();
    let options = GenerationOptions {
        max_tokens: config.max_tokens.or(defaults.max_tokens),
        temperature: config.temperature.or(defaults.temperature),
    };

    Ok((provider, options))
}
