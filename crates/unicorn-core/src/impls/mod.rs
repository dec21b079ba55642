//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **StaticDeckProvider**: 組み込みサンプルデッキ（デフォルト）
//! - **InMemorySessionStore / InMemoryEventSink**: 開発用・テスト用
//! - **RestSessionStore / RestDeckProvider / RestEventSink**: PostgREST（Supabase）
//! - **ChatGenerator**: OpenAI 互換の chat completions
//! - **TopUpDeckProvider**: 足りないデッキを生成ピッチで補充
//! - **Shuffler**: シード指定可能なシャッフル

pub mod chat;
pub mod memory;
pub mod rest;
pub mod shuffle;
pub mod static_deck;
pub mod topup;

// 主要な型を再エクスポート
pub use self::chat::ChatGenerator;
pub use self::memory::{InMemoryEventSink, InMemorySessionStore, StoreCalls};
pub use self::rest::{RestClient, RestDeckProvider, RestEventSink, RestSessionStore};
pub use self::shuffle::Shuffler;
pub use self::static_deck::{SAMPLE_PITCHES, StaticDeckProvider};
pub use self::topup::{FALLBACK_PITCH, TopUpDeckProvider};
