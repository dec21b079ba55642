//! Events - 分析用イベント
//!
//! EventSink に送るイベント。ローカル専用モードでは送信されない。

use serde::{Deserialize, Serialize};

use super::archetype::Bucket;
use super::decision::Direction;
use super::ids::SessionId;
use super::item::ItemId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    Swipe {
        session_id: SessionId,
        item_id: ItemId,
        direction: Direction,
        order: usize,
    },
    SessionCompleted {
        session_id: SessionId,
        bucket: Bucket,
        investment_rate: f64,
    },
    ResultViewed {
        session_id: SessionId,
        bucket: Bucket,
    },
    ResultShared {
        session_id: SessionId,
        platform: String,
    },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::Swipe { .. } => "swipe",
            AnalyticsEvent::SessionCompleted { .. } => "session_completed",
            AnalyticsEvent::ResultViewed { .. } => "result_viewed",
            AnalyticsEvent::ResultShared { .. } => "result_shared",
        }
    }

    pub fn session_id(&self) -> SessionId {
        match self {
            AnalyticsEvent::Swipe { session_id, .. }
            | AnalyticsEvent::SessionCompleted { session_id, .. }
            | AnalyticsEvent::ResultViewed { session_id, .. }
            | AnalyticsEvent::ResultShared { session_id, .. } => *session_id,
        }
    }

    /// Event body without the tag and session id.
    pub fn payload(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(map) = value.as_object_mut() {
            map.remove("event");
            map.remove("session_id");
        }
        value
    }
}
