//! SessionStore port - セッションの永続化先（リモート）
//!
//! 正本はローカルのセッション。ここへの書き込みはベストエフォートのミラーで、
//! 失敗しても進行は止めない（呼び出しは `app::mirror` 経由）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClassificationResult, Decision, MirrorError, SessionId};

/// A session as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: SessionId,
    pub decisions: Vec<Decision>,
    pub result: Option<ClassificationResult>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        id: SessionId,
        created_at: DateTime<Utc>,
    ) -> Result<(), MirrorError>;

    /// `order` is the 0-based position of the decision in the deck.
    async fn record_decision(
        &self,
        id: SessionId,
        decision: &Decision,
        order: usize,
    ) -> Result<(), MirrorError>;

    async fn complete_session(
        &self,
        id: SessionId,
        result: &ClassificationResult,
        completed_at: DateTime<Utc>,
    ) -> Result<(), MirrorError>;

    async fn fetch_session(&self, id: SessionId) -> Result<StoredSession, MirrorError>;
}
