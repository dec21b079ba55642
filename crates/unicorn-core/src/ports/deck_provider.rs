//! DeckProvider port - デッキ（スワイプ対象）の供給元
//!
//! 返す件数は `count` 以下。足りない場合の扱いは呼び出し側（collector）が決める。

use async_trait::async_trait;

use crate::domain::{DeckError, Item};

#[async_trait]
pub trait DeckProvider: Send + Sync {
    /// Up to `count` items, in presentation order.
    async fn fetch_deck(&self, count: usize) -> Result<Vec<Item>, DeckError>;
}
