//! SwipeCollector - スワイプの受付とセッションのライフサイクル
//!
//! # フロー
//! 1. `start()` / `reset()`: デッキを取得してすぐにセッションを作る。
//!    リモートセッションの作成はバックグラウンドで行い、届いた時点で id を紐付ける
//! 2. `submit()`: カーソル位置のアイテムに対して Decision を追加（同期）
//! 3. N 件目の `submit()`: 固定の分類結果を同じロック内で確定し、ハンドオフに置く。
//!    生成器があれば拡充を spawn して待つ（呼び出し側が future を捨てても走り切る）
//!
//! # 不変条件
//! - 同時に保留できる `submit` は 1 つだけ（in-flight ガード）
//! - `start`/`reset` のたびに epoch を進め、古い epoch で得た非同期結果は捨てる
//! - ミラー呼び出しは待たない。失敗しても進行には影響しない
//! - id が届く前の判定は、紐付け時にまとめて再送する

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::classifier::ArchetypeClassifier;
use super::handoff::{HandoffSlot, SwipeResults};
use super::mirror::SessionMirror;
use crate::domain::{
    AnalyticsEvent, ClassificationResult, Decision, Direction, Item, Progress, Session, SessionId,
    SessionStatus, SwipeError, classify_fixed,
};
use crate::ports::{Clock, DeckProvider};

/// Canonical deck size.
pub const DECK_SIZE: usize = 10;

/// What the card area should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentItem {
    /// No deck loaded yet (or the last load failed).
    Loading,
    /// The next item to decide on.
    Item(Item),
    /// Every item has been decided.
    Finished,
}

#[derive(Default)]
struct CollectorState {
    session: Option<Session>,
    /// Remote id that arrived before the deck did.
    pending_id: Option<SessionId>,
    result: Option<ClassificationResult>,
    /// The result is final and has been handed to the mirror.
    finalized: bool,
    completed_at: Option<DateTime<Utc>>,
    last_error: Option<SwipeError>,
}

impl CollectorState {
    /// Bind a freshly created remote session and replay what it missed.
    fn attach(&mut self, id: SessionId, mirror: &SessionMirror) {
        let Some(session) = self.session.as_mut() else {
            self.pending_id = Some(id);
            return;
        };
        if !session.attach_id(id) {
            return;
        }
        for (order, decision) in session.decisions().iter().enumerate() {
            mirror.record_decision(Some(id), decision, order);
        }
        info!(
            session_id = %id,
            replayed = session.decisions().len(),
            "remote session attached"
        );
        if let (true, Some(result), Some(at)) = (self.finalized, &self.result, self.completed_at) {
            mirror.complete(Some(id), result, at);
        }
    }

    fn finalize(&mut self, mirror: &SessionMirror, at: DateTime<Utc>) {
        self.finalized = true;
        self.completed_at = Some(at);
        let Some(result) = &self.result else {
            return;
        };
        info!(
            bucket = %result.bucket,
            title = %result.archetype.title,
            source = ?result.source,
            investment_rate = result.summary.investment_rate,
            "session complete"
        );
        mirror.complete(self.session.as_ref().and_then(Session::id), result, at);
    }
}

/// State reachable from background tasks.
#[derive(Default)]
struct Shared {
    state: Mutex<CollectorState>,
    epoch: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SwipeError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| SwipeError::SubmitInFlight)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SwipeCollector {
    deck_provider: Arc<dyn DeckProvider>,
    classifier: ArchetypeClassifier,
    mirror: Arc<SessionMirror>,
    clock: Arc<dyn Clock>,
    deck_size: usize,
    handoff: Arc<HandoffSlot>,
    shared: Arc<Shared>,
    in_flight: AtomicBool,
}

impl SwipeCollector {
    /// Use `CollectorBuilder` unless every collaborator is already at hand.
    pub fn new(
        deck_provider: Arc<dyn DeckProvider>,
        classifier: ArchetypeClassifier,
        mirror: SessionMirror,
        clock: Arc<dyn Clock>,
        deck_size: usize,
    ) -> Self {
        Self {
            deck_provider,
            classifier,
            mirror: Arc::new(mirror),
            clock,
            deck_size,
            handoff: Arc::new(HandoffSlot::new()),
            shared: Arc::new(Shared::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Initial load.
    pub async fn start(&self) -> Result<Progress, SwipeError> {
        info!(deck_size = self.deck_size, "starting swipe session");
        self.load().await
    }

    /// Drop the current run and start over with a fresh deck.
    pub async fn reset(&self) -> Result<Progress, SwipeError> {
        info!("resetting swipe session");
        self.handoff.clear();
        self.load().await
    }

    async fn load(&self) -> Result<Progress, SwipeError> {
        let epoch = self.shared.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        *self.shared.lock() = CollectorState::default();

        let created_at = self.clock.now();
        self.open_remote(epoch, created_at);
        let deck = self.deck_provider.fetch_deck(self.deck_size).await;

        let mut state = self.shared.lock();
        if !self.shared.is_current(epoch) {
            debug!(epoch, "load superseded by a newer reset");
            return Err(SwipeError::Superseded);
        }

        let deck = deck.unwrap_or_else(|err| {
            warn!(error = %err, "deck provider failed");
            Vec::new()
        });
        match Session::new(None, deck, self.deck_size, created_at) {
            Ok(session) => {
                let progress = session.progress();
                info!(items = session.deck().len(), "session ready");
                state.session = Some(session);
                if let Some(id) = state.pending_id.take() {
                    state.attach(id, &self.mirror);
                }
                Ok(progress)
            }
            Err(err) => {
                warn!(error = %err, "cannot start session");
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Create the remote session without holding up the load.
    fn open_remote(&self, epoch: u64, created_at: DateTime<Utc>) {
        if !self.mirror.has_store() {
            return;
        }
        let mirror = Arc::clone(&self.mirror);
        let shared = Arc::clone(&self.shared);
        self.mirror.detach(async move {
            let Some(id) = mirror.open(created_at).await else {
                return;
            };
            let mut state = shared.lock();
            if !shared.is_current(epoch) {
                debug!(session_id = %id, "discarding remote session of a superseded load");
                return;
            }
            state.attach(id, &mirror);
        });
    }

    /// Record one decision against the current item.
    ///
    /// `SessionAlreadyComplete` and `SubmitInFlight` leave everything unchanged
    /// and can be ignored by the caller.
    pub async fn submit(&self, direction: Direction) -> Result<Progress, SwipeError> {
        let _guard = InFlight::acquire(&self.in_flight)?;

        let (epoch, decision, progress, session_id, enrichment) = {
            let mut state = self.shared.lock();
            let epoch = self.shared.epoch.load(Ordering::Acquire);
            let session = state.session.as_mut().ok_or(SwipeError::NotReady)?;
            let (decision, progress) = session
                .submit(direction, self.clock.now())
                .inspect_err(|err| debug!(error = %err, "submission ignored"))?;
            let session_id = session.id();

            let mut enrichment = None;
            if session.is_complete() {
                let decisions = session.decisions().to_vec();
                let deck = session.deck().to_vec();
                state.result = Some(classify_fixed(&decisions, deck.len())?);
                self.handoff.put(SwipeResults {
                    session_id,
                    decisions: decisions.clone(),
                    deck: deck.clone(),
                });
                if self.classifier.has_generator() {
                    enrichment = Some((decisions, deck));
                } else {
                    state.finalize(&self.mirror, self.clock.now());
                }
            }
            (epoch, decision, progress, session_id, enrichment)
        };

        debug!(
            item_id = %decision.item_id,
            direction = %decision.direction,
            completed = progress.completed,
            remaining = progress.remaining,
            "decision recorded"
        );
        self.mirror
            .record_decision(session_id, &decision, progress.completed - 1);

        if let Some((decisions, deck)) = enrichment {
            self.enrich(epoch, decisions, deck).await?;
        }
        Ok(progress)
    }

    /// Replace the fixed result with the generated one.
    ///
    /// Runs as its own task so a dropped `submit` cannot cut it short.
    async fn enrich(
        &self,
        epoch: u64,
        decisions: Vec<Decision>,
        deck: Vec<Item>,
    ) -> Result<(), SwipeError> {
        let task = tokio::spawn(enrich_in_background(
            self.classifier.clone(),
            Arc::clone(&self.shared),
            Arc::clone(&self.mirror),
            Arc::clone(&self.clock),
            epoch,
            decisions,
            deck,
        ));
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "enrichment task failed; keeping the fixed result");
                let mut state = self.shared.lock();
                if self.shared.is_current(epoch) && !state.finalized {
                    state.finalize(&self.mirror, self.clock.now());
                }
                Ok(())
            }
        }
    }

    /// The item under the cursor. Never mutates state.
    pub fn current_item(&self) -> CurrentItem {
        match &self.shared.lock().session {
            None => CurrentItem::Loading,
            Some(session) => match session.current_item() {
                Some(item) => CurrentItem::Item(item.clone()),
                None => CurrentItem::Finished,
            },
        }
    }

    /// Up to `n` undecided items (top card first).
    pub fn upcoming(&self, n: usize) -> Vec<Item> {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|s| s.upcoming(n).to_vec())
            .unwrap_or_default()
    }

    pub fn progress(&self) -> Option<Progress> {
        self.shared.lock().session.as_ref().map(Session::progress)
    }

    /// `None` while no deck is loaded.
    pub fn status(&self) -> Option<SessionStatus> {
        self.shared.lock().session.as_ref().map(Session::status)
    }

    /// `None` in local-only mode and until the remote session is created.
    pub fn session_id(&self) -> Option<SessionId> {
        self.shared.lock().session.as_ref().and_then(Session::id)
    }

    /// Copy of the current session for read-only consumers.
    pub fn snapshot(&self) -> Option<Session> {
        self.shared.lock().session.clone()
    }

    /// Classification of the completed session, once available.
    ///
    /// Holds the fixed result while a generated one is still pending.
    pub fn result(&self) -> Option<ClassificationResult> {
        self.shared.lock().result.clone()
    }

    /// Why the last load failed, if it did.
    pub fn last_error(&self) -> Option<SwipeError> {
        self.shared.lock().last_error.clone()
    }

    pub fn deck_size(&self) -> usize {
        self.deck_size
    }

    pub fn handoff(&self) -> Arc<HandoffSlot> {
        Arc::clone(&self.handoff)
    }

    pub fn mirror(&self) -> &SessionMirror {
        &self.mirror
    }

    pub fn classifier(&self) -> &ArchetypeClassifier {
        &self.classifier
    }

    /// Record that the result screen was shown.
    pub fn result_viewed(&self) {
        let state = self.shared.lock();
        if let (Some(session_id), Some(result)) = (
            state.session.as_ref().and_then(Session::id),
            state.result.as_ref(),
        ) {
            self.mirror.track(AnalyticsEvent::ResultViewed {
                session_id,
                bucket: result.bucket,
            });
        }
    }

    /// Record that the result was shared to `platform`.
    pub fn result_shared(&self, platform: impl Into<String>) {
        if let Some(session_id) = self.session_id() {
            self.mirror.track(AnalyticsEvent::ResultShared {
                session_id,
                platform: platform.into(),
            });
        }
    }
}

async fn enrich_in_background(
    classifier: ArchetypeClassifier,
    shared: Arc<Shared>,
    mirror: Arc<SessionMirror>,
    clock: Arc<dyn Clock>,
    epoch: u64,
    decisions: Vec<Decision>,
    deck: Vec<Item>,
) -> Result<(), SwipeError> {
    let result = classifier.classify(&decisions, &deck).await?;

    let mut state = shared.lock();
    if !shared.is_current(epoch) {
        debug!(epoch, "discarding classification of a superseded session");
        return Err(SwipeError::Superseded);
    }
    state.result = Some(result);
    state.finalize(&mirror, clock.now());
    Ok(())
}
