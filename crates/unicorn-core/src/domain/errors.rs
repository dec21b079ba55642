//! Errors - エラー型と分類
//!
//! ユーザーに見せるのは `SwipeError::DeckUnavailable` のみ。
//! それ以外は構造的に到達しないか、ログに残して吸収する。

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the swipe collector and classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwipeError {
    /// The deck provider returned nothing usable. Retry / reset is the way out.
    #[error("deck unavailable: expected {expected} items, received {received}")]
    DeckUnavailable { expected: usize, received: usize },

    /// `submit` after the last item. Ignored by callers.
    #[error("session already complete")]
    SessionAlreadyComplete,

    /// Classification requested before every item was decided.
    #[error("incomplete session: {actual}/{expected} decisions")]
    IncompleteSession { expected: usize, actual: usize },

    /// Another submission is still pending.
    #[error("a submission is already in flight")]
    SubmitInFlight,

    /// No deck has been loaded yet.
    #[error("collector is not ready (no deck loaded)")]
    NotReady,

    /// A reset happened while this call was suspended; its result was discarded.
    #[error("superseded by a newer session")]
    Superseded,
}

impl SwipeError {
    /// Only deck failures are shown to the user.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, SwipeError::DeckUnavailable { .. })
    }
}

/// Deck provider failures.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("deck request failed: {0}")]
    Transport(String),

    #[error("deck response could not be decoded: {0}")]
    Decode(String),
}

/// Failures of the persistence / analytics collaborators.
///
/// These are always caught, logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("remote rejected the write: {0}")]
    Rejected(String),

    #[error("remote transport error: {0}")]
    Transport(String),

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("session not found: {0}")]
    NotFound(String),
}

/// Failures of the generative enrichment step. Always replaced by the fixed fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generator request failed: {0}")]
    Transport(String),

    #[error("generator returned an empty response")]
    EmptyResponse,

    #[error("generator output is invalid: {0}")]
    InvalidShape(String),

    #[error("generator timed out after {0:?}")]
    Timeout(Duration),
}
