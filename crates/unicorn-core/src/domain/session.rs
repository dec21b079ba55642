//! Session state machine.
//!
//! State transitions:
//! - Collecting --submit (n < N-1)--> Collecting
//! - Collecting --submit (n == N-1)--> Complete
//! - Complete --submit--> Complete (rejected, nothing recorded)
//!
//! Reset is not a transition of this type: the collector drops the session
//! and builds a new one, so nothing from the previous run stays reachable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::{Decision, Direction, invested_count};
use super::errors::SwipeError;
use super::ids::SessionId;
use super::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Collecting,
    Complete,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Complete)
    }
}

/// Progress snapshot returned after each accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub remaining: usize,
    pub invested_count: usize,
}

impl Progress {
    pub fn rejected_count(&self) -> usize {
        self.completed - self.invested_count
    }

    pub fn total(&self) -> usize {
        self.completed + self.remaining
    }

    /// Completion percentage (0..=100) for a progress bar.
    pub fn percent(&self) -> u8 {
        match self.total() {
            0 => 0,
            total => ((self.completed * 100) / total) as u8,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

/// One survey run: a fixed deck and the positional decisions made against it.
///
/// Invariants:
/// - `decisions.len() <= deck.len()`
/// - `decisions[i].item_id == deck[i].id`
/// - `status == Complete` iff `decisions.len() == deck.len()`
///
/// Serialize only: a session is built through `new` and advanced through `submit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// `None` means local-only mode (remote creation failed or was skipped).
    id: Option<SessionId>,
    deck: Vec<Item>,
    decisions: Vec<Decision>,
    status: SessionStatus,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Start a session over exactly `size` items.
    ///
    /// A short deck is `DeckUnavailable`; a longer one is cut to `size`.
    pub fn new(
        id: Option<SessionId>,
        mut deck: Vec<Item>,
        size: usize,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SwipeError> {
        if size == 0 || deck.len() < size {
            return Err(SwipeError::DeckUnavailable {
                expected: size,
                received: deck.len(),
            });
        }
        deck.truncate(size);
        Ok(Self {
            id,
            deck,
            decisions: Vec::with_capacity(size),
            status: SessionStatus::Collecting,
            created_at,
        })
    }

    pub fn id(&self) -> Option<SessionId> {
        self.id
    }

    /// Bind the remote id once it is known. An already bound id is kept.
    ///
    /// Returns whether `id` was bound.
    pub fn attach_id(&mut self, id: SessionId) -> bool {
        if self.id.is_some() {
            return false;
        }
        self.id = Some(id);
        true
    }

    pub fn deck(&self) -> &[Item] {
        &self.deck
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    /// The next undecided item, if any.
    pub fn current_item(&self) -> Option<&Item> {
        self.deck.get(self.decisions.len())
    }

    /// Up to `n` undecided items starting at the cursor.
    pub fn upcoming(&self, n: usize) -> &[Item] {
        let start = self.decisions.len();
        let end = (start + n).min(self.deck.len());
        &self.deck[start..end]
    }

    pub fn progress(&self) -> Progress {
        let completed = self.decisions.len();
        Progress {
            completed,
            remaining: self.deck.len() - completed,
            invested_count: invested_count(&self.decisions),
        }
    }

    /// Record a decision against the item under the cursor.
    ///
    /// Returns the recorded decision and the progress after it. A complete
    /// session rejects the call and stays unchanged.
    pub fn submit(
        &mut self,
        direction: Direction,
        at: DateTime<Utc>,
    ) -> Result<(Decision, Progress), SwipeError> {
        if self.status.is_terminal() {
            return Err(SwipeError::SessionAlreadyComplete);
        }
        let item_id = self
            .current_item()
            .map(|item| item.id)
            .ok_or(SwipeError::SessionAlreadyComplete)?;

        let decision = Decision::new(item_id, direction, at);
        self.decisions.push(decision.clone());
        if self.decisions.len() == self.deck.len() {
            self.status = SessionStatus::Complete;
        }
        Ok((decision, self.progress()))
    }
}
