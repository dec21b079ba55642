//! Deck items: the short pitches a user swipes on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item, unique within one deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// A single deck entry.
///
/// Items are issued by a `DeckProvider` and never mutated afterwards;
/// sessions hold them by value and only ever read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,

    /// The pitch text shown on the card.
    #[serde(alias = "pitch")]
    pub text: String,

    /// Curated seed content (as opposed to generated pitches).
    #[serde(default)]
    pub is_seed: bool,
}

impl Item {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            text: text.into(),
            is_seed: false,
        }
    }

    pub fn seed(id: u32, text: impl Into<String>) -> Self {
        Self {
            is_seed: true,
            ..Self::new(id, text)
        }
    }
}
