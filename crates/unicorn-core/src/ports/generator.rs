//! Generator ports - 生成によるアーキタイプ拡充とピッチ補充
//!
//! `ArchetypeGenerator` は生のモデル出力（文字列）を返すだけ。検証は
//! `domain::GeneratedProfile::parse` が行い、失敗時は固定の記述にフォールバックする。
//! `PitchGenerator` はデッキが足りないときの補充用。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Bucket, Decision, Direction, GenerationError, Item, SwipeSummary};

/// Context handed to a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub bucket: Bucket,
    pub summary: SwipeSummary,
    /// Texts of the items the user invested in, in deck order.
    pub invested: Vec<String>,
    /// Texts of the rejected items, in deck order.
    pub rejected: Vec<String>,
}

impl GenerationRequest {
    pub fn new(bucket: Bucket, summary: SwipeSummary, decisions: &[Decision], deck: &[Item]) -> Self {
        let text_of = |direction: Direction| -> Vec<String> {
            decisions
                .iter()
                .filter(|d| d.direction == direction)
                .filter_map(|d| deck.iter().find(|item| item.id == d.item_id))
                .map(|item| item.text.clone())
                .collect()
        };
        Self {
            bucket,
            summary,
            invested: text_of(Direction::Invest),
            rejected: text_of(Direction::Reject),
        }
    }
}

#[async_trait]
pub trait ArchetypeGenerator: Send + Sync {
    /// Raw model output for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Source of fresh pitch texts for topping up a short deck.
#[async_trait]
pub trait PitchGenerator: Send + Sync {
    /// One pitch sentence, trimmed.
    async fn generate_pitch(&self) -> Result<String, GenerationError>;
}
