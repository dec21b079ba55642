//! App - アプリケーション層
//!
//! ports を組み合わせてスワイプセッションを進行させます。
//!
//! # 主要コンポーネント
//! - **CollectorBuilder**: コレクタの構築とワイヤリング
//! - **SwipeCollector**: デッキ読み込み・スワイプ受付・完了処理
//! - **ArchetypeClassifier**: 固定の分類 + 生成による拡充（フォールバックあり）
//! - **SessionMirror**: 永続化・分析へのベストエフォートなミラー
//! - **HandoffSlot**: 完了結果を表示側へ渡す

pub mod builder;
pub mod classifier;
pub mod collector;
pub mod handoff;
pub mod mirror;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, CollectorBuilder};
pub use self::classifier::{ArchetypeClassifier, DEFAULT_GENERATION_TIMEOUT};
pub use self::collector::{CurrentItem, DECK_SIZE, SwipeCollector};
pub use self::handoff::{HandoffSlot, SwipeResults};
pub use self::mirror::{DEFAULT_MIRROR_TIMEOUT, SessionMirror};
