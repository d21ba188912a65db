// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! State synchronisation against the Memory Hub.
//!
//! [`try_reconstruct_state`] is the only fallible read. The degrade-to-default
//! policy lives at the call sites ([`load_state_or_default`] and
//! [`reconcile_after_query`]) so it stays visible and testable.

use chrono::Utc;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::agent::AgentHandle;
use crate::domain::runtime::MemoryError;
use crate::domain::state::{pair_interactions, AgentState, Interaction};

/// Number of recent messages considered when rebuilding state.
pub const STATE_WINDOW: usize = 100;

/// Rebuild an agent's state from its most recent `window` messages.
pub async fn try_reconstruct_state(
    handle: &AgentHandle,
    wallet_address: &str,
    window: usize,
) -> Result<AgentState, MemoryError> {
    let messages = handle.session().fetch_recent_messages(window).await?;
    let now = Utc::now();
    let interactions = pair_interactions(&messages, now);
    debug!(
        agent_id = %handle.id,
        messages = messages.len(),
        interactions = interactions.len(),
        "Reconstructed agent state"
    );
    Ok(AgentState::from_interactions(
        handle.id.clone(),
        wallet_address,
        interactions,
        now,
    ))
}

/// Like [`try_reconstruct_state`], but any failure yields the empty state.
pub async fn load_state_or_default(
    handle: &AgentHandle,
    wallet_address: &str,
    window: usize,
) -> AgentState {
    match try_reconstruct_state(handle, wallet_address, window).await {
        Ok(state) => state,
        Err(e) => {
            warn!(agent_id = %handle.id, error = %e, "Failed to load agent state, using empty state");
            AgentState::empty(handle.id.clone(), wallet_address, Utc::now())
        }
    }
}

/// The exchange just produced by the reasoning engine.
#[derive(Debug, Clone)]
pub struct CompletedExchange<'a> {
    pub interaction_id: &'a str,
    pub query: &'a str,
    pub response: &'a str,
    pub context: Option<&'a Map<String, Value>>,
}

/// Post-query reconciliation.
///
/// Waits `settle_delay` for the hub to record the exchange, then re-reads.
/// If the re-read fails, the exchange is appended to `previous` instead so
/// it is not lost. Either way timestamps are bumped and the caller's context
/// is merged into the preferences.
pub async fn reconcile_after_query(
    handle: &AgentHandle,
    wallet_address: &str,
    window: usize,
    settle_delay: Duration,
    previous: AgentState,
    exchange: CompletedExchange<'_>,
) -> AgentState {
    if !settle_delay.is_zero() {
        tokio::time::sleep(settle_delay).await;
    }

    let now = Utc::now();
    let mut state = match try_reconstruct_state(handle, wallet_address, window).await {
        Ok(state) => state,
        Err(e) => {
            warn!(
                agent_id = %handle.id,
                interaction_id = exchange.interaction_id,
                error = %e,
                "Failed to re-read agent state after query, appending exchange locally"
            );
            let mut state = previous;
            state.interaction_history.push(Interaction {
                id: exchange.interaction_id.to_string(),
                user_query: exchange.query.to_string(),
                agent_response: exchange.response.to_string(),
                timestamp: now.timestamp(),
                context: exchange.context.cloned(),
            });
            state
        }
    };

    state.touch(now);
    if let Some(context) = exchange.context {
        state.merge_preferences(context);
    }
    state
}
