//! EventSink port - 分析イベントの送信先
//!
//! 失敗はログに残して無視する（リトライしない）。

use async_trait::async_trait;

use crate::domain::{AnalyticsEvent, MirrorError};

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn track(&self, event: &AnalyticsEvent) -> Result<(), MirrorError>;
}
