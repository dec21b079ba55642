//! End-to-end runs through the public API.

use std::sync::Arc;

use unicorn_core::app::{CollectorBuilder, CurrentItem, SwipeResults};
use unicorn_core::config::SwipeConfig;
use unicorn_core::domain::{Bucket, Direction, ResultSource, SessionStatus, SwipeError};
use unicorn_core::impls::{InMemoryEventSink, InMemorySessionStore, StaticDeckProvider};
use unicorn_core::ports::SessionStore;

fn directions(pattern: &str) -> Vec<Direction> {
    pattern
        .chars()
        .map(|c| if c == 'I' { Direction::Invest } else { Direction::Reject })
        .collect()
}

#[tokio::test]
async fn full_session_is_classified_mirrored_and_handed_off() {
    let store = Arc::new(InMemorySessionStore::new());
    let sink = Arc::new(InMemoryEventSink::new());
    let collector = CollectorBuilder::new()
        .config(&SwipeConfig::default())
        .deck_provider(Arc::new(StaticDeckProvider::sample().with_seed(11)))
        .session_store(store.clone())
        .event_sink(sink.clone())
        .build()
        .unwrap();

    collector.start().await.unwrap();
    // リモートセッションはバックグラウンドで作られる
    collector.mirror().drain().await;
    let session_id = collector.session_id().expect("remote session");

    for direction in directions("IIRIIRIIRI") {
        assert!(matches!(collector.current_item(), CurrentItem::Item(_)));
        collector.submit(direction).await.unwrap();
    }
    collector.result_viewed();
    collector.mirror().drain().await;

    let result = collector.result().unwrap();
    assert_eq!(result.bucket, Bucket::High);
    assert_eq!(result.archetype.title, "The Hype Founder");
    assert_eq!(result.source, ResultSource::Fixed);
    assert_eq!(result.summary.investment_rate, 70.0);
    assert_eq!(collector.status(), Some(SessionStatus::Complete));

    let stored = store.fetch_session(session_id).await.unwrap();
    assert_eq!(stored.decisions.len(), 10);
    assert_eq!(stored.result.unwrap().bucket, Bucket::High);

    let names = sink.names();
    assert_eq!(names.iter().filter(|n| **n == "swipe").count(), 10);
    assert!(names.contains(&"session_completed"));
    assert!(names.contains(&"result_viewed"));

    // 表示側: JSON を経由しても同じ結果を再計算できる
    let handoff = collector.handoff().take().unwrap();
    let restored = SwipeResults::from_json(&handoff.to_json().unwrap()).unwrap();
    let recomputed = restored.classify_with(collector.classifier()).await.unwrap();
    assert_eq!(recomputed, result);
    assert!(collector.handoff().take().is_none());
}

#[tokio::test]
async fn unreachable_store_leaves_the_session_local() {
    let store = Arc::new(InMemorySessionStore::failing());
    let collector = CollectorBuilder::new()
        .deck_provider(Arc::new(StaticDeckProvider::sample()))
        .session_store(store.clone())
        .build()
        .unwrap();

    collector.start().await.unwrap();
    for direction in directions("RRRRRRIIII") {
        collector.submit(direction).await.unwrap();
    }
    collector.mirror().drain().await;

    assert_eq!(collector.session_id(), None);
    assert_eq!(collector.result().unwrap().bucket, Bucket::Mid);
    assert_eq!(store.calls().record, 0);
    assert_eq!(
        collector.submit(Direction::Invest).await,
        Err(SwipeError::SessionAlreadyComplete)
    );
}

#[tokio::test]
async fn reset_mid_session_starts_from_zero() {
    let collector = CollectorBuilder::new()
        .deck_provider(Arc::new(StaticDeckProvider::sample()))
        .deck_size(5)
        .build()
        .unwrap();

    collector.start().await.unwrap();
    for direction in directions("III") {
        collector.submit(direction).await.unwrap();
    }
    let progress = collector.reset().await.unwrap();

    assert_eq!(progress.completed, 0);
    assert_eq!(progress.remaining, 5);
    assert!(collector.result().is_none());

    for direction in directions("RRRRR") {
        collector.submit(direction).await.unwrap();
    }
    assert_eq!(collector.result().unwrap().bucket, Bucket::Low);
}
