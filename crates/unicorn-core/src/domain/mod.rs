//! Domain model (ids, items, decisions, sessions, archetypes, ...).
//!
//! このモジュールは純粋な型とロジックのみ。I/O や async は持たない。

pub mod archetype;
pub mod decision;
pub mod errors;
pub mod events;
pub mod generated;
pub mod ids;
pub mod item;
pub mod session;

pub use archetype::{
    Archetype, Bucket, ClassificationResult, HIGH_THRESHOLD, MID_THRESHOLD, Pack, ResultSource,
    SwipeSummary, classify_fixed, investment_rate,
};
pub use decision::{Decision, Direction, invested_count};
pub use errors::{DeckError, GenerationError, MirrorError, SwipeError};
pub use events::AnalyticsEvent;
pub use generated::GeneratedProfile;
pub use ids::SessionId;
pub use item::{Item, ItemId};
pub use session::{Progress, Session, SessionStatus};
