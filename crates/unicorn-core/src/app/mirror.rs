//! SessionMirror - セッションのリモートミラー（ベストエフォート）
//!
//! # 方針
//! - 各呼び出しは tokio に spawn して結果を待たない（fire-and-forget）
//! - 失敗は `warn!` に残して捨てる。リトライしない
//! - セッション作成に失敗したらローカル専用モード（`None`）になり、以降の呼び出しはすべてスキップ
//!
//! spawn したタスクは `JoinSet` で保持し、終了時やテストでは `drain()` で待てる。
//! `SessionMirror` を drop すると未完了のタスクは中断される。

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::{AnalyticsEvent, ClassificationResult, Decision, MirrorError, SessionId};
use crate::ports::{EventSink, IdGenerator, SessionStore};

/// Default bound on a single remote call.
pub const DEFAULT_MIRROR_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SessionMirror {
    store: Option<Arc<dyn SessionStore>>,
    events: Option<Arc<dyn EventSink>>,
    ids: Arc<dyn IdGenerator>,
    timeout: Duration,
    pending: Mutex<JoinSet<()>>,
}

impl SessionMirror {
    pub fn new(
        store: Option<Arc<dyn SessionStore>>,
        events: Option<Arc<dyn EventSink>>,
        ids: Arc<dyn IdGenerator>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            events,
            ids,
            timeout,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Mirror with no collaborators: every session is local-only.
    pub fn local_only(ids: Arc<dyn IdGenerator>) -> Self {
        Self::new(None, None, ids, DEFAULT_MIRROR_TIMEOUT)
    }

    /// Create the remote session.
    ///
    /// Returns `None` (local-only mode) when there is no store or creation fails.
    pub async fn open(&self, created_at: DateTime<Utc>) -> Option<SessionId> {
        let store = self.store.as_ref()?;
        let id = self.ids.generate_session_id();

        let outcome = tokio::time::timeout(self.timeout, store.create_session(id, created_at))
            .await
            .unwrap_or(Err(MirrorError::Timeout(self.timeout)));
        match outcome {
            Ok(()) => {
                info!(session_id = %id, "remote session created");
                Some(id)
            }
            Err(err) => {
                warn!(error = %err, "session creation failed; continuing in local-only mode");
                None
            }
        }
    }

    pub fn record_decision(&self, session: Option<SessionId>, decision: &Decision, order: usize) {
        let Some(id) = session else {
            return;
        };
        if let Some(store) = &self.store {
            let store = Arc::clone(store);
            let decision = decision.clone();
            self.spawn("record_decision", async move {
                store.record_decision(id, &decision, order).await
            });
        }
        self.track(AnalyticsEvent::Swipe {
            session_id: id,
            item_id: decision.item_id,
            direction: decision.direction,
            order,
        });
    }

    pub fn complete(
        &self,
        session: Option<SessionId>,
        result: &ClassificationResult,
        completed_at: DateTime<Utc>,
    ) {
        let Some(id) = session else {
            return;
        };
        if let Some(store) = &self.store {
            let store = Arc::clone(store);
            let result = result.clone();
            self.spawn("complete_session", async move {
                store.complete_session(id, &result, completed_at).await
            });
        }
        self.track(AnalyticsEvent::SessionCompleted {
            session_id: id,
            bucket: result.bucket,
            investment_rate: result.summary.investment_rate,
        });
    }

    pub fn track(&self, event: AnalyticsEvent) {
        let Some(sink) = &self.events else {
            return;
        };
        let sink = Arc::clone(sink);
        self.spawn("track_event", async move { sink.track(&event).await });
    }

    /// Whether sessions can be mirrored at all.
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Run `task` in the background alongside the mirror calls.
    ///
    /// `drain()` waits for it like any other call.
    pub fn detach<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending();
        // 終わったタスクは回収しておく
        while pending.try_join_next().is_some() {}
        pending.spawn(task);
    }

    /// Wait for every call spawned so far, including calls spawned while waiting.
    pub async fn drain(&self) {
        loop {
            let mut set = std::mem::take(&mut *self.pending());
            if set.is_empty() {
                break;
            }
            while set.join_next().await.is_some() {}
        }
    }

    /// Calls spawned and not yet reaped.
    pub fn pending_len(&self) -> usize {
        self.pending().len()
    }

    fn spawn<F>(&self, op: &'static str, call: F)
    where
        F: Future<Output = Result<(), MirrorError>> + Send + 'static,
    {
        let timeout = self.timeout;
        let task = async move {
            let outcome = tokio::time::timeout(timeout, call)
                .await
                .unwrap_or(Err(MirrorError::Timeout(timeout)));
            match outcome {
                Ok(()) => debug!(op, "mirror call succeeded"),
                Err(err) => warn!(op, error = %err, "mirror call failed; ignoring"),
            }
        };

        self.detach(task);
    }

    fn pending(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
