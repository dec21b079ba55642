//! unicorn-core
//!
//! Core building blocks for the swipe-to-invest personality quiz.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, item, decision, session, archetype, generated, events, errors）
//! - **ports**: 抽象化レイヤー（DeckProvider, SessionStore, EventSink, ArchetypeGenerator, など）
//! - **app**: アプリケーションロジック（builder, collector, classifier, mirror, handoff）
//! - **impls**: 実装（StaticDeckProvider, InMemory*, REST クライアント, ChatGenerator）
//! - **config**: 設定の読み込み（TOML + 環境変数）

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
pub mod config;
