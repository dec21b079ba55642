//! TopUpDeckProvider - 足りないデッキを生成ピッチで埋める
//!
//! 元のデッキ供給元が `count` 件未満しか返さなかったとき、
//! 不足分を `PitchGenerator` で並行に生成して末尾に足す。
//! 生成に失敗・タイムアウトしたピッチは固定の文言で埋める（デッキは必ず埋まる）。
//! 元の供給元のエラーはそのまま返す。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::domain::{DeckError, GenerationError, Item};
use crate::ports::{DeckProvider, PitchGenerator};

/// Pitch used when generation fails.
pub const FALLBACK_PITCH: &str = "An AI that generates startup ideas for lazy founders.";

pub struct TopUpDeckProvider {
    base: Arc<dyn DeckProvider>,
    pitches: Arc<dyn PitchGenerator>,
    timeout: Duration,
}

impl TopUpDeckProvider {
    pub fn new(
        base: Arc<dyn DeckProvider>,
        pitches: Arc<dyn PitchGenerator>,
        timeout: Duration,
    ) -> Self {
        Self {
            base,
            pitches,
            timeout,
        }
    }

    async fn generate(&self, missing: usize) -> Vec<String> {
        let mut tasks = JoinSet::new();
        for slot in 0..missing {
            let pitches = Arc::clone(&self.pitches);
            let timeout = self.timeout;
            tasks.spawn(async move {
                let outcome = tokio::time::timeout(timeout, pitches.generate_pitch())
                    .await
                    .unwrap_or(Err(GenerationError::Timeout(timeout)));
                (slot, outcome)
            });
        }

        let mut texts = vec![FALLBACK_PITCH.to_string(); missing];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, Ok(text))) if !text.trim().is_empty() => texts[slot] = text,
                Ok((slot, Ok(_))) => {
                    warn!(slot, "generated pitch was empty; using fallback");
                }
                Ok((slot, Err(err))) => {
                    warn!(slot, error = %err, "pitch generation failed; using fallback");
                }
                Err(err) => warn!(error = %err, "pitch task failed; using fallback"),
            }
        }
        texts
    }
}

#[async_trait]
impl DeckProvider for TopUpDeckProvider {
    async fn fetch_deck(&self, count: usize) -> Result<Vec<Item>, DeckError> {
        let mut deck = self.base.fetch_deck(count).await?;
        if deck.len() >= count {
            return Ok(deck);
        }

        let missing = count - deck.len();
        debug!(have = deck.len(), missing, "topping up deck with generated pitches");
        let next_id = deck.iter().map(|item| item.id.0).max().unwrap_or(0) + 1;
        let generated = self.generate(missing).await;
        deck.extend(
            generated
                .into_iter()
                .zip(next_id..)
                .map(|(text, id)| Item::new(id, text)),
        );
        Ok(deck)
    }
}
