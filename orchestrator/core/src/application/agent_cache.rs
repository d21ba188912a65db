// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-process agent cache with single-flight admission.
//!
//! One slot per [`AgentId`], either `Ready` with a live handle or `Pending`
//! with the shared future of the construction currently in flight. The first
//! caller for an id installs the pending slot; every concurrent caller for the
//! same id awaits that same future. Shard guards are released before any
//! `.await`, so unrelated ids never wait on each other.
//!
//! A failed construction removes its own pending slot and leaves the cache as
//! it was before the attempt.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::LifecycleError;
use crate::domain::agent::{AgentHandle, AgentId};

type InitResult = Result<Arc<AgentHandle>, LifecycleError>;
type InitFuture = Shared<BoxFuture<'static, InitResult>>;

enum CacheSlot {
    Ready(Arc<AgentHandle>),
    Pending { attempt: Uuid, future: InitFuture },
}

/// How a caller obtained its handle.
#[derive(Debug, Clone)]
pub enum Admission {
    /// Already cached; no work was done.
    Cached(Arc<AgentHandle>),
    /// Awaited a construction started by another caller.
    Joined(Arc<AgentHandle>),
    /// This caller started the construction.
    Created(Arc<AgentHandle>),
}

impl Admission {
    pub fn handle(&self) -> &Arc<AgentHandle> {
        match self {
            Self::Cached(h) | Self::Joined(h) | Self::Created(h) => h,
        }
    }

    pub fn into_handle(self) -> Arc<AgentHandle> {
        match self {
            Self::Cached(h) | Self::Joined(h) | Self::Created(h) => h,
        }
    }
}

#[derive(Default)]
pub struct AgentCache {
    slots: DashMap<AgentId, CacheSlot>,
}

impl AgentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialized handle for `id`; pending constructions are not visible.
    pub fn get(&self, id: &AgentId) -> Option<Arc<AgentHandle>> {
        self.slots.get(id).and_then(|slot| match slot.value() {
            CacheSlot::Ready(handle) => Some(handle.clone()),
            CacheSlot::Pending { .. } => None,
        })
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.get(id).is_some()
    }

    /// Number of initialized agents.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.value(), CacheSlot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached handle for `id`, or run `init` at most once across
    /// all concurrent callers for that id.
    ///
    /// `init` only builds the future; it runs after the shard guard is
    /// released.
    pub async fn get_or_try_init<F, Fut>(&self, id: &AgentId, init: F) -> Result<Admission, LifecycleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = InitResult> + Send + 'static,
    {
        let (attempt, future, leader) = match self.slots.entry(id.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                CacheSlot::Ready(handle) => return Ok(Admission::Cached(handle.clone())),
                CacheSlot::Pending { attempt, future } => (*attempt, future.clone(), false),
            },
            Entry::Vacant(entry) => {
                let attempt = Uuid::new_v4();
                let future = init().boxed().shared();
                entry.insert(CacheSlot::Pending {
                    attempt,
                    future: future.clone(),
                });
                (attempt, future, true)
            }
        };

        let result = future.await;
        self.settle(id, attempt, &result);

        let handle = result?;
        Ok(if leader {
            Admission::Created(handle)
        } else {
            Admission::Joined(handle)
        })
    }

    /// Resolve the pending slot of `attempt`. Every waiter calls this; only
    /// the first to arrive changes anything.
    fn settle(&self, id: &AgentId, attempt: Uuid, result: &InitResult) {
        let is_attempt =
            |slot: &CacheSlot| matches!(slot, CacheSlot::Pending { attempt: a, .. } if *a == attempt);

        match result {
            Ok(handle) => {
                if let Some(mut slot) = self.slots.get_mut(id) {
                    if is_attempt(slot.value()) {
                        *slot.value_mut() = CacheSlot::Ready(handle.clone());
                    }
                }
            }
            Err(_) => {
                self.slots.remove_if(id, |_, slot| is_attempt(slot));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentSpec, MemoryHubAddress};
    use crate::domain::runtime::{AgentSession, EngineError, MemoryError, ResponseRequest, RuntimeError};
    use crate::domain::state::StoredMessage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NullSession;

    #[async_trait]
    impl AgentSession for NullSession {
        async fn initialize(&self) -> Result<(), RuntimeError> {
            Ok(())
        }

        async fn fetch_recent_messages(&self, _limit: usize) -> Result<Vec<StoredMessage>, MemoryError> {
            Ok(Vec::new())
        }

        async fn respond(&self, _request: &ResponseRequest) -> Result<String, EngineError> {
            Ok(String::new())
        }
    }

    fn id(raw: &str) -> AgentId {
        AgentId::parse(raw).unwrap()
    }

    fn handle(raw: &str) -> Arc<AgentHandle> {
        Arc::new(AgentHandle::new(
            AgentSpec {
                id: id(raw),
                description: "test".into(),
                memory_hub: MemoryHubAddress::default(),
            },
            Arc::new(NullSession),
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_construction() {
        let cache = Arc::new(AgentCache::new());
        let constructions = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let constructions = constructions.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_try_init(&id("agentA"), move || async move {
                        constructions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(handle("agentA"))
                    })
                    .await
                    .unwrap()
                    .into_handle()
            }));
        }

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
    }

    #[tokio::test]
    async fn test_cached_id_skips_init() {
        let cache = AgentCache::new();
        let first = cache
            .get_or_try_init(&id("agentA"), || async { Ok(handle("agentA")) })
            .await
            .unwrap();
        assert!(matches!(first, Admission::Created(_)));

        let second = cache
            .get_or_try_init(&id("agentA"), || async {
                Err(LifecycleError::Configuration("init must not run".into()))
            })
            .await
            .unwrap();

        assert!(matches!(second, Admission::Cached(_)));
        assert!(Arc::ptr_eq(first.handle(), second.handle()));
    }

    #[tokio::test]
    async fn test_failed_construction_leaves_cache_unmodified() {
        let cache = AgentCache::new();
        let err = cache
            .get_or_try_init(&id("agentA"), || async {
                Err(LifecycleError::AgentInitialization {
                    agent_id: AgentId::parse("agentA").unwrap(),
                    reason: "hub unreachable".into(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "AGENT_INITIALIZATION_ERROR");
        assert!(!cache.contains(&id("agentA")));
        assert!(cache.is_empty());

        // A later attempt starts fresh.
        let retry = cache
            .get_or_try_init(&id("agentA"), || async { Ok(handle("agentA")) })
            .await
            .unwrap();
        assert!(matches!(retry, Admission::Created(_)));
        assert!(cache.contains(&id("agentA")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiters_observe_the_same_failure() {
        let cache = Arc::new(AgentCache::new());
        let constructions = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let constructions = constructions.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_try_init(&id("agentB"), move || async move {
                        constructions.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err(LifecycleError::Configuration("boom".into()))
                    })
                    .await
            }));
        }

        for task in tasks {
            assert!(task.await.unwrap().is_err());
        }
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_pending_slot_is_not_initialized() {
        let cache = Arc::new(AgentCache::new());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let background = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_try_init(&id("agentC"), move || async move {
                        let _ = release_rx.await;
                        Ok(handle("agentC"))
                    })
                    .await
            })
        };

        tokio::task::yield_now().await;
        assert!(!cache.contains(&id("agentC")));

        release_tx.send(()).unwrap();
        background.await.unwrap().unwrap();
        assert!(cache.contains(&id("agentC")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_distinct_ids_do_not_wait_on_each_other() {
        let cache = Arc::new(AgentCache::new());
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let blocked = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_try_init(&id("agentA"), move || async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Ok(handle("agentA"))
                    })
                    .await
            })
        };
        started_rx.await.unwrap();

        let other = tokio::time::timeout(
            Duration::from_secs(1),
            cache.get_or_try_init(&id("agentB"), || async { Ok(handle("agentB")) }),
        )
        .await
        .expect("agentB waited on agentA's construction")
        .unwrap();

        assert!(matches!(other, Admission::Created(_)));
        assert!(cache.contains(&id("agentB")));
        assert!(!cache.contains(&id("agentA")));

        release_tx.send(()).unwrap();
        blocked.await.unwrap().unwrap();
        assert!(cache.contains(&id("agentA")));
    }
}
