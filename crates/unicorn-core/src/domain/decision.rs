//! Decision model: one binary choice bound to one deck item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ItemId;

/// Swipe direction.
///
/// Serialized as `reject` / `invest`; the older `left` / `right` wire names
/// are still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[serde(alias = "left")]
    Reject,
    #[serde(alias = "right")]
    Invest,
}

impl Direction {
    pub fn is_invest(self) -> bool {
        matches!(self, Direction::Invest)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Reject => "reject",
            Direction::Invest => "invest",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded swipe.
///
/// Created exactly once per accepted submission and never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(alias = "pitch_id")]
    pub item_id: ItemId,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    pub fn new(item_id: ItemId, direction: Direction, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id,
            direction,
            timestamp,
        }
    }
}

/// Number of `Invest` decisions in a sequence.
pub fn invested_count(decisions: &[Decision]) -> usize {
    decisions.iter().filter(|d| d.direction.is_invest()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_uses_new_names_and_accepts_legacy_aliases() {
        assert_eq!(serde_json::to_string(&Direction::Invest).unwrap(), "\"invest\"");
        assert_eq!(serde_json::to_string(&Direction::Reject).unwrap(), "\"reject\"");

        let right: Direction = serde_json::from_str("\"right\"").unwrap();
        let left: Direction = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(right, Direction::Invest);
        assert_eq!(left, Direction::Reject);
    }

    #[test]
    fn legacy_decision_rows_decode() {
        let row = serde_json::json!({
            "pitch_id": 7,
            "direction": "right",
            "timestamp": "2024-05-01T10:00:00Z"
        });

        let decision: Decision = serde_json::from_value(row).unwrap();
        assert_eq!(decision.item_id, ItemId(7));
        assert!(decision.direction.is_invest());
    }
}
