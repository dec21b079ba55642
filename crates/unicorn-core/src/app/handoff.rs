//! Result handoff between the collector and the result presenter.
//!
//! A completed run is parked here until the presenter picks it up. The slot
//! lives in memory only; nothing survives a process restart.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::classifier::ArchetypeClassifier;
use crate::domain::{ClassificationResult, Decision, Item, SessionId, SwipeError};

/// Everything the presenter needs to rebuild the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeResults {
    pub session_id: Option<SessionId>,
    pub decisions: Vec<Decision>,
    pub deck: Vec<Item>,
}

impl SwipeResults {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Recompute the classification from the handed-off decisions.
    pub async fn classify_with(
        &self,
        classifier: &ArchetypeClassifier,
    ) -> Result<ClassificationResult, SwipeError> {
        classifier.classify(&self.decisions, &self.deck).await
    }
}

/// Holds at most one pending `SwipeResults`.
#[derive(Debug, Default)]
pub struct HandoffSlot {
    inner: Mutex<Option<SwipeResults>>,
}

impl HandoffSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is parked with `results`.
    pub fn put(&self, results: SwipeResults) {
        *self.lock() = Some(results);
    }

    /// Consume the parked results. `None` means the presenter should start a new run.
    pub fn take(&self) -> Option<SwipeResults> {
        self.lock().take()
    }

    pub fn peek(&self) -> Option<SwipeResults> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Option<SwipeResults>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bucket, Direction};
    use chrono::Utc;

    fn results(invested: usize) -> SwipeResults {
        let deck: Vec<Item> = (1..=10).map(|i| Item::seed(i, format!("pitch {i}"))).collect();
        let now = Utc::now();
        let decisions = deck
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let direction = if i < invested {
                    Direction::Invest
                } else {
                    Direction::Reject
                };
                Decision::new(item.id, direction, now)
            })
            .collect();
        SwipeResults {
            session_id: None,
            decisions,
            deck,
        }
    }

    #[test]
    fn take_consumes_the_slot() {
        let slot = HandoffSlot::new();
        assert!(slot.take().is_none());

        slot.put(results(4));
        assert!(slot.peek().is_some());
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
    }

    #[test]
    fn handoff_survives_json() {
        let original = results(6);
        let back = SwipeResults::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(back, original);
    }

    #[tokio::test]
    async fn presenter_recomputes_the_same_bucket() {
        let handed_off = results(7);
        let classifier = ArchetypeClassifier::fixed();

        let first = handed_off.classify_with(&classifier).await.unwrap();
        let second = handed_off.classify_with(&classifier).await.unwrap();

        assert_eq!(first.bucket, Bucket::High);
        assert_eq!(first, second);
    }
}
