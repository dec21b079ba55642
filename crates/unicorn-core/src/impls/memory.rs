//! In-memory collaborators (開発用・テスト用)
//!
//! # 実装詳細
//! - 呼び出し回数を常に数える（失敗モードでも）
//! - `set_failing(true)` 以降はすべての呼び出しが `MirrorError::Rejected` を返す
//! - 判定は順序（order）をキーに保持する。ミラー呼び出しは順不同で届きうるため

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AnalyticsEvent, ClassificationResult, Decision, MirrorError, SessionId};
use crate::ports::{EventSink, SessionStore, StoredSession};

/// Per-operation call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub create: usize,
    pub record: usize,
    pub complete: usize,
}

struct Row {
    decisions: BTreeMap<usize, Decision>,
    result: Option<ClassificationResult>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Row {
    fn to_stored(&self, id: SessionId) -> StoredSession {
        StoredSession {
            id,
            decisions: self.decisions.values().cloned().collect(),
            result: self.result.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<SessionId, Row>,
    calls: StoreCalls,
}

#[derive(Default)]
pub struct InMemorySessionStore {
    inner: Mutex<StoreInner>,
    failing: AtomicBool,
    create_delay: Duration,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every call.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    /// Make `create_session` take `delay` before answering (a slow remote).
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    pub fn calls(&self) -> StoreCalls {
        self.lock().calls
    }

    pub fn fetch(&self, id: SessionId) -> Option<StoredSession> {
        self.lock().sessions.get(&id).map(|row| row.to_stored(id))
    }

    fn check(&self) -> Result<(), MirrorError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(MirrorError::Rejected("store is in failing mode".to_string()));
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(
        &self,
        id: SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<(), MirrorError> {
        self.lock().calls.create += 1;
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        self.check()?;
        self.lock().sessions.insert(
            id,
            Row {
                decisions: BTreeMap::new(),
                result: None,
                created_at,
                completed_at: None,
            },
        );
        Ok(())
    }

    async fn record_decision(
        &self,
        id: SessionId,
        decision: &Decision,
        order: usize,
    ) -> Result<(), MirrorError> {
        self.lock().calls.record += 1;
        self.check()?;
        let mut inner = self.lock();
        let row = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| MirrorError::NotFound(id.to_string()))?;
        row.decisions.insert(order, decision.clone());
        Ok(())
    }

    async fn complete_session(
        &self,
        id: SessionId,
        result: &ClassificationResult,
        completed_at: DateTime<Utc>,
    ) -> Result<(), MirrorError> {
        self.lock().calls.complete += 1;
        self.check()?;
        let mut inner = self.lock();
        let row = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| MirrorError::NotFound(id.to_string()))?;
        row.result = Some(result.clone());
        row.completed_at = Some(completed_at);
        Ok(())
    }

    async fn fetch_session(&self, id: SessionId) -> Result<StoredSession, MirrorError> {
        self.check()?;
        self.fetch(id)
            .ok_or_else(|| MirrorError::NotFound(id.to_string()))
    }
}

/// Collects tracked events.
#[derive(Default)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<AnalyticsEvent>>,
    failing: AtomicBool,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects (and drops) every event.
    pub fn failing() -> Self {
        let sink = Self::new();
        sink.failing.store(true, Ordering::Release);
        sink
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.lock().iter().map(AnalyticsEvent::name).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AnalyticsEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn track(&self, event: &AnalyticsEvent) -> Result<(), MirrorError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(MirrorError::Rejected("sink is in failing mode".to_string()));
        }
        self.lock().push(event.clone());
        Ok(())
    }
}
