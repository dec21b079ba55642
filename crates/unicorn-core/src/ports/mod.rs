//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（デッキ供給元、永続化先、分析基盤、生成モデル）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - コアはグローバルなクライアントを持たない。起動時に構築して注入する
//! - 永続化・分析はベストエフォート（失敗してもスワイプは進む）

pub mod clock;
pub mod deck_provider;
pub mod event_sink;
pub mod generator;
pub mod id_generator;
pub mod session_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::deck_provider::DeckProvider;
pub use self::event_sink::EventSink;
pub use self::generator::{ArchetypeGenerator, GenerationRequest, PitchGenerator};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::session_store::{SessionStore, StoredSession};
