//! CollectorBuilder - コレクタの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - 依存（DeckProvider など）は起動時に一度だけ構築して注入する
//! - build() 時に必須の依存と設定値をチェックし、不足があれば BuildError を返す

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::classifier::{ArchetypeClassifier, DEFAULT_GENERATION_TIMEOUT};
use super::collector::{DECK_SIZE, SwipeCollector};
use super::mirror::{DEFAULT_MIRROR_TIMEOUT, SessionMirror};
use crate::config::SwipeConfig;
use crate::ports::{
    ArchetypeGenerator, Clock, DeckProvider, EventSink, IdGenerator, SessionStore, SystemClock,
    UlidGenerator,
};

/// BuildError はコレクタ構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("no deck provider configured")]
    MissingDeckProvider,

    #[error("deck size must be at least 1")]
    ZeroDeckSize,

    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// # 使用例
/// ```ignore
/// let collector = CollectorBuilder::new()
///     .deck_provider(Arc::new(StaticDeckProvider::sample()))
///     .session_store(store)
///     .build()?;
/// ```
pub struct CollectorBuilder {
    deck_provider: Option<Arc<dyn DeckProvider>>,
    session_store: Option<Arc<dyn SessionStore>>,
    event_sink: Option<Arc<dyn EventSink>>,
    generator: Option<Arc<dyn ArchetypeGenerator>>,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    deck_size: usize,
    generation_timeout: Duration,
    mirror_timeout: Duration,
}

impl CollectorBuilder {
    pub fn new() -> Self {
        Self {
            deck_provider: None,
            session_store: None,
            event_sink: None,
            generator: None,
            clock: Arc::new(SystemClock),
            ids: None,
            deck_size: DECK_SIZE,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            mirror_timeout: DEFAULT_MIRROR_TIMEOUT,
        }
    }

    /// Take deck size and timeouts from `config`.
    pub fn config(mut self, config: &SwipeConfig) -> Self {
        self.deck_size = config.deck_size;
        self.generation_timeout = config.generation_timeout();
        self.mirror_timeout = config.mirror_timeout();
        self
    }

    pub fn deck_provider(mut self, provider: Arc<dyn DeckProvider>) -> Self {
        self.deck_provider = Some(provider);
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn ArchetypeGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn deck_size(mut self, deck_size: usize) -> Self {
        self.deck_size = deck_size;
        self
    }

    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    pub fn mirror_timeout(mut self, timeout: Duration) -> Self {
        self.mirror_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SwipeCollector, BuildError> {
        let deck_provider = self.deck_provider.ok_or(BuildError::MissingDeckProvider)?;
        if self.deck_size == 0 {
            return Err(BuildError::ZeroDeckSize);
        }
        if self.deck_size != DECK_SIZE {
            warn!(
                deck_size = self.deck_size,
                canonical = DECK_SIZE,
                "non-canonical deck size; bucket thresholds assume the canonical size"
            );
        }
        if self.generation_timeout.is_zero() {
            return Err(BuildError::ZeroTimeout("generation"));
        }
        if self.mirror_timeout.is_zero() {
            return Err(BuildError::ZeroTimeout("mirror"));
        }

        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(SystemClock)),
        };
        let classifier = match self.generator {
            Some(generator) => ArchetypeClassifier::with_generator(generator, self.generation_timeout),
            None => ArchetypeClassifier::fixed(),
        };
        let mirror = SessionMirror::new(
            self.session_store,
            self.event_sink,
            ids,
            self.mirror_timeout,
        );

        Ok(SwipeCollector::new(
            deck_provider,
            classifier,
            mirror,
            self.clock,
            self.deck_size,
        ))
    }
}

impl Default for CollectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::StaticDeckProvider;

    #[test]
    fn build_requires_a_deck_provider() {
        let result = CollectorBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingDeckProvider)));
    }

    #[test]
    fn build_rejects_zero_values() {
        let provider: Arc<dyn DeckProvider> = Arc::new(StaticDeckProvider::sample());

        let zero_deck = CollectorBuilder::new()
            .deck_provider(provider.clone())
            .deck_size(0)
            .build();
        assert!(matches!(zero_deck, Err(BuildError::ZeroDeckSize)));

        let zero_timeout = CollectorBuilder::new()
            .deck_provider(provider)
            .mirror_timeout(Duration::ZERO)
            .build();
        assert!(matches!(zero_timeout, Err(BuildError::ZeroTimeout("mirror"))));
    }

    #[test]
    fn build_applies_config() {
        let config = SwipeConfig {
            deck_size: 5,
            ..SwipeConfig::default()
        };
        let collector = CollectorBuilder::new()
            .deck_provider(Arc::new(StaticDeckProvider::sample()))
            .config(&config)
            .build()
            .unwrap();

        assert_eq!(collector.deck_size(), 5);
        assert!(!collector.classifier().has_generator());
    }
}
