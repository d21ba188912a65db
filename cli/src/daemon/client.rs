// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for communicating with daemon API

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use agent_host_core::domain::agent::AgentStatusReport;
use agent_host_core::presentation::api::{
    InitializeResponse, MemoryResponse, QueryResponse, RegisterResponse,
};

use super::base_url;

/// Error envelope returned by the daemon.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    retryable: bool,
}

#[derive(Debug, Clone)]
pub struct DaemonClient {
    client: Client,
    base_url: String,
}

impl DaemonClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let client = Client::builder()
            // Queries wait on the LLM; no global timeout
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url(host, port),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn register(&self, agent_id: &str) -> Result<RegisterResponse> {
        let response = self
            .client
            .post(format!("{}/agent/register", self.base_url))
            .json(&json!({ "agent_id": agent_id }))
            .send()
            .await
            .context("Failed to register agent")?;

        decode(response, "register agent").await
    }

    pub async fn initialize(
        &self,
        agent_id: &str,
        description: &str,
        memory_hub_address: Option<&str>,
    ) -> Result<InitializeResponse> {
        let mut body = json!({
            "agent_id": agent_id,
            "description": description,
        });
        if let Some(address) = memory_hub_address {
            body["memory_hub_address"] = json!(address);
        }

        let response = self
            .client
            .post(format!("{}/agent/initialize", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Failed to initialize agent")?;

        decode(response, "initialize agent").await
    }

    pub async fn query(
        &self,
        agent_id: &str,
        query: &str,
        user_context: Option<Map<String, Value>>,
    ) -> Result<QueryResponse> {
        let mut body = json!({
            "agent_id": agent_id,
            "query": query,
        });
        if let Some(context) = user_context {
            body["user_context"] = Value::Object(context);
        }

        let response = self
            .client
            .post(format!("{}/agent/query", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Failed to query agent")?;

        decode(response, "query agent").await
    }

    pub async fn status(&self, agent_id: &str) -> Result<AgentStatusReport> {
        let response = self
            .client
            .get(format!("{}/agent/status/{}", self.base_url, agent_id))
            .send()
            .await
            .context("Failed to get agent status")?;

        decode(response, "get agent status").await
    }

    pub async fn memory(&self, agent_id: &str) -> Result<MemoryResponse> {
        let response = self
            .client
            .get(format!("{}/agent/memory/{}", self.base_url, agent_id))
            .send()
            .await
            .context("Failed to get agent memory")?;

        decode(response, "get agent memory").await
    }
}

async fn decode<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&error_text) {
            Ok(envelope) => {
                let hint = if envelope.error.retryable {
                    " (retryable)"
                } else {
                    ""
                };
                anyhow::bail!(
                    "Failed to {}: {} {}{}",
                    action,
                    envelope.error.code,
                    envelope.error.message,
                    hint
                );
            }
            Err(_) => anyhow::bail!("Failed to {}: HTTP {}: {}", action, status, error_text),
        }
    }

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", action))
}
