//! StaticDeckProvider - 組み込みのサンプルデッキ
//!
//! リモートのデッキ供給元が無いときのデフォルト。
//! 固定の 10 件のピッチをシャッフルして返す。

use async_trait::async_trait;

use super::shuffle::Shuffler;
use crate::domain::{DeckError, Item};
use crate::ports::DeckProvider;

/// Built-in seed pitches.
pub const SAMPLE_PITCHES: [(u32, &str); 10] = [
    (1, "An AI that drafts cold emails based on LinkedIn profiles."),
    (2, "Uber for blood donations, matching hospitals to nearby donors in real-time."),
    (3, "A Chrome extension that replaces LinkedIn buzzwords with insults."),
    (4, "Subscription service for pre-cooked, bodybuilder-approved meals by top fitness influencers."),
    (5, "A tool that reverse-engineers viral tweets and suggests edits to your posts."),
    (6, "SaaS that generates pitch decks based on your Notion doc."),
    (7, "A co-founder matching platform based on MBTI and founder trauma."),
    (8, "Zoom plugin that adds 'boredom detection' to your face during calls."),
    (9, "An app that lets friends invest in your personal goals like a mini-VC."),
    (10, "Generative AI for YouTube thumbnails that guarantee clicks or your money back."),
];

/// Serves a fixed list of items, shuffled per fetch unless `unshuffled()`.
///
/// # 使用例
/// ```ignore
/// let provider = StaticDeckProvider::sample().with_seed(7);
/// let deck = provider.fetch_deck(10).await?;
/// ```
#[derive(Debug)]
pub struct StaticDeckProvider {
    items: Vec<Item>,
    shuffler: Option<Shuffler>,
}

impl StaticDeckProvider {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            shuffler: Some(Shuffler::from_entropy()),
        }
    }

    pub fn sample() -> Self {
        Self::new(
            SAMPLE_PITCHES
                .iter()
                .map(|&(id, text)| Item::seed(id, text))
                .collect(),
        )
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffler = Some(Shuffler::seeded(seed));
        self
    }

    /// Keep the given order.
    pub fn unshuffled(mut self) -> Self {
        self.shuffler = None;
        self
    }
}

#[async_trait]
impl DeckProvider for StaticDeckProvider {
    async fn fetch_deck(&self, count: usize) -> Result<Vec<Item>, DeckError> {
        let mut deck = self.items.clone();
        if let Some(shuffler) = &self.shuffler {
            shuffler.shuffle(&mut deck);
        }
        deck.truncate(count);
        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemId;

    #[tokio::test]
    async fn sample_deck_has_ten_seed_items() {
        let deck = StaticDeckProvider::sample()
            .unshuffled()
            .fetch_deck(10)
            .await
            .unwrap();

        assert_eq!(deck.len(), 10);
        assert!(deck.iter().all(|item| item.is_seed));
        assert_eq!(deck[0].id, ItemId(1));
        assert_eq!(deck[9].id, ItemId(10));
    }

    #[tokio::test]
    async fn seeded_providers_agree() {
        let a = StaticDeckProvider::sample().with_seed(3);
        let b = StaticDeckProvider::sample().with_seed(3);

        let left = a.fetch_deck(10).await.unwrap();
        let right = b.fetch_deck(10).await.unwrap();

        assert_eq!(left, right);
    }

    #[tokio::test]
    async fn short_list_is_returned_as_is() {
        let provider = StaticDeckProvider::new(vec![Item::new(1, "a"), Item::new(2, "b")]);

        let deck = provider.fetch_deck(10).await.unwrap();

        assert_eq!(deck.len(), 2);
    }

    #[tokio::test]
    async fn long_list_is_truncated() {
        let deck = StaticDeckProvider::sample().fetch_deck(4).await.unwrap();
        assert_eq!(deck.len(), 4);
    }
}
