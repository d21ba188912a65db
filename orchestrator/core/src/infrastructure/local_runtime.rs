// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Agent Runtime
//!
//! In-process agent runtime: a [`ConversationLog`] stands in for the Memory
//! Hub and replies come from the configured [`LLMProvider`].
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Implements `AgentRuntime` / `AgentSession`
//! - **Pattern:** Adapter (Hexagonal Architecture)

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::agent::{AgentId, AgentSpec};
use crate::domain::llm::{ChatTurn, GenerationOptions, LLMProvider};
use crate::domain::runtime::{
    AgentRuntime, AgentSession, EngineError, MemoryError, ResponseRequest, RuntimeError,
};
use crate::domain::state::StoredMessage;

/// Per-agent message lists, oldest first.
#[derive(Clone, Default)]
pub struct ConversationLog {
    conversations: Arc<DashMap<AgentId, Vec<StoredMessage>>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the agent's conversation if it does not exist yet.
    pub fn open(&self, agent_id: &AgentId) {
        self.conversations.entry(agent_id.clone()).or_default();
    }

    pub fn append(&self, agent_id: &AgentId, messages: impl IntoIterator<Item = StoredMessage>) -> Result<(), MemoryError> {
        let mut conversation = self
            .conversations
            .get_mut(agent_id)
            .ok_or_else(|| MemoryError::NotFound(agent_id.to_string()))?;
        conversation.extend(messages);
        Ok(())
    }

    /// The newest `limit` messages, oldest first.
    pub fn recent(&self, agent_id: &AgentId, limit: usize) -> Result<Vec<StoredMessage>, MemoryError> {
        let conversation = self
            .conversations
            .get(agent_id)
            .ok_or_else(|| MemoryError::NotFound(agent_id.to_string()))?;
        let start = conversation.len().saturating_sub(limit);
        Ok(conversation[start..].to_vec())
    }

    pub fn len(&self, agent_id: &AgentId) -> usize {
        self.conversations.get(agent_id).map(|c| c.len()).unwrap_or(0)
    }
}

pub struct LocalAgentRuntime {
    log: ConversationLog,
    llm: Option<Arc<dyn LLMProvider>>,
    options: GenerationOptions,
}

impl LocalAgentRuntime {
    pub fn new(log: ConversationLog, llm: Option<Arc<dyn LLMProvider>>, options: GenerationOptions) -> Self {
        Self { log, llm, options }
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }
}

#[async_trait]
impl AgentRuntime for LocalAgentRuntime {
    async fn create_session(&self, spec: &AgentSpec) -> Result<Arc<dyn AgentSession>, RuntimeError> {
        Ok(Arc::new(LocalAgentSession {
            spec: spec.clone(),
            log: self.log.clone(),
            llm: self.llm.clone(),
            options: self.options.clone(),
        }))
    }
}

pub struct LocalAgentSession {
    spec: AgentSpec,
    log: ConversationLog,
    llm: Option<Arc<dyn LLMProvider>>,
    options: GenerationOptions,
}

impl LocalAgentSession {
    fn build_turns(&self, request: &ResponseRequest) -> Result<Vec<ChatTurn>, MemoryError> {
        let mut turns = Vec::new();
        if !self.spec.description.trim().is_empty() {
            turns.push(ChatTurn::system(self.spec.description.clone()));
        }
        if request.use_history {
            let history = self.log.recent(&self.spec.id, request.recency_bound)?;
            turns.extend(history.iter().filter_map(ChatTurn::from_stored));
        }
        turns.push(ChatTurn::user(request.query.clone()));
        Ok(turns)
    }
}

#[async_trait]
impl AgentSession for LocalAgentSession {
    async fn initialize(&self) -> Result<(), RuntimeError> {
        self.log.open(&self.spec.id);
        info!(
            agent_id = %self.spec.id,
            memory_hub = %self.spec.memory_hub,
            "Opened local conversation log"
        );
        Ok(())
    }

    async fn fetch_recent_messages(&self, limit: usize) -> Result<Vec<StoredMessage>, MemoryError> {
        self.log.recent(&self.spec.id, limit)
    }

    async fn respond(&self, request: &ResponseRequest) -> Result<String, EngineError> {
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| EngineError::Provider("no LLM provider configured (spec.llm)".into()))?;

        if request.allow_tools {
            debug!(agent_id = %self.spec.id, "Tool use is not available in the local runtime");
        }

        let turns = self.build_turns(request)?;
        let generated = llm
            .generate(&turns, &self.options)
            .await
            .map_err(|e| EngineError::Provider(e.to_string()))?;

        debug!(
            agent_id = %self.spec.id,
            provider = %generated.provider,
            model = %generated.model,
            total_tokens = generated.usage.total_tokens,
            "Generated response"
        );

        let now = Utc::now().timestamp();
        self.log.append(
            &self.spec.id,
            [
                StoredMessage::user(request.query.clone()).at(now),
                StoredMessage::assistant(generated.text.clone()).at(now),
            ],
        )?;

        Ok(generated.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::MemoryHubAddress;
    use crate::domain::llm::{GenerationResponse, LLMError, TokenUsage};
    use std::sync::Mutex;

    /// Echoes the last user turn and records what it was sent.
    #[derive(Default)]
    struct EchoProvider {
        seen: Mutex<Vec<Vec<ChatTurn>>>,
    }

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn generate(
            &self,
            turns: &[ChatTurn],
            _options: &GenerationOptions,
        ) -> Result<GenerationResponse, LLMError> {
            self.seen.lock().unwrap().push(turns.to_vec());
            let last = turns.last().map(|t| t.content.clone()).unwrap_or_default();
            Ok(GenerationResponse {
                text: format!("echo: {}", last),
                usage: TokenUsage::default(),
                provider: "echo".into(),
                model: "echo".into(),
            })
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    fn spec() -> AgentSpec {
        AgentSpec {
            id: AgentId::parse("agentA").unwrap(),
            description: "A helpful agent".into(),
            memory_hub: MemoryHubAddress::default(),
        }
    }

    #[tokio::test]
    async fn test_respond_appends_exchange() {
        let provider = Arc::new(EchoProvider::default());
        let runtime = LocalAgentRuntime::new(
            ConversationLog::new(),
            Some(provider.clone()),
            GenerationOptions::default(),
        );
        let session = runtime.create_session(&spec()).await.unwrap();
        session.initialize().await.unwrap();

        let reply = session
            .respond(&ResponseRequest::conversational("hello"))
            .await
            .unwrap();

        assert_eq!(reply, "echo: hello");
        let messages = session.fetch_recent_messages(100).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], StoredMessage::user("hello").at(messages[0].timestamp.unwrap()));
        assert_eq!(messages[1].content, "echo: hello");
    }

    #[tokio::test]
    async fn test_history_is_bounded_by_recency() {
        let provider = Arc::new(EchoProvider::default());
        let runtime = LocalAgentRuntime::new(
            ConversationLog::new(),
            Some(provider.clone()),
            GenerationOptions::default(),
        );
        let session = runtime.create_session(&spec()).await.unwrap();
        session.initialize().await.unwrap();

        for i in 0..3 {
            session
                .respond(&ResponseRequest::conversational(format!("q{}", i)))
                .await
                .unwrap();
        }
        let mut request = ResponseRequest::conversational("last");
        request.recency_bound = 2;
        session.respond(&request).await.unwrap();

        let seen = provider.seen.lock().unwrap();
        let turns = seen.last().unwrap();
        // system + 2 history + query
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0], ChatTurn::system("A helpful agent"));
        assert_eq!(turns[1], ChatTurn::user("q2"));
        assert_eq!(turns[3], ChatTurn::user("last"));
    }

    #[tokio::test]
    async fn test_respond_without_provider_fails_and_records_nothing() {
        let log = ConversationLog::new();
        let runtime = LocalAgentRuntime::new(log.clone(), None, GenerationOptions::default());
        let session = runtime.create_session(&spec()).await.unwrap();
        session.initialize().await.unwrap();

        let err = session
            .respond(&ResponseRequest::conversational("hello"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no LLM provider"));
        assert_eq!(log.len(&spec().id), 0);
    }

    #[tokio::test]
    async fn test_fetch_before_initialize_is_not_found() {
        let runtime = LocalAgentRuntime::new(ConversationLog::new(), None, GenerationOptions::default());
        let session = runtime.create_session(&spec()).await.unwrap();
        assert!(matches!(
            session.fetch_recent_messages(10).await,
            Err(MemoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_recent_returns_newest_oldest_first() {
        let log = ConversationLog::new();
        let id = AgentId::parse("agentB").unwrap();
        log.open(&id);
        log.append(&id, (0..5).map(|i| StoredMessage::user(format!("m{}", i))))
            .unwrap();

        let recent = log.recent(&id, 2).unwrap();
        assert_eq!(recent[0].content, "m3");
        assert_eq!(recent[1].content, "m4");
        assert_eq!(log.recent(&id, 50).unwrap().len(), 5);
    }
}
