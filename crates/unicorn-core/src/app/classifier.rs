//! ArchetypeClassifier - 完了したセッションをアーキタイプに分類する
//!
//! # フロー
//! 1. invested 件数から investment_rate を計算し、バケットを決定（純粋関数）
//! 2. generator があれば timeout 付きで生成を試みる
//! 3. 失敗・タイムアウト・不正な出力はすべて固定の記述にフォールバック
//!
//! バケットは 1 で確定し、2 以降で変わることはない。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{
    ClassificationResult, Decision, GeneratedProfile, GenerationError, Item, SwipeError,
    classify_fixed,
};
use crate::ports::{ArchetypeGenerator, GenerationRequest};

/// Default bound on a generative call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct ArchetypeClassifier {
    generator: Option<Arc<dyn ArchetypeGenerator>>,
    timeout: Duration,
}

impl ArchetypeClassifier {
    /// Classifier that only uses the fixed descriptors.
    pub fn fixed() -> Self {
        Self {
            generator: None,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_generator(generator: Arc<dyn ArchetypeGenerator>, timeout: Duration) -> Self {
        Self {
            generator: Some(generator),
            timeout,
        }
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Classify a completed decision sequence.
    ///
    /// Fails only with `IncompleteSession`; enrichment failures never surface.
    pub async fn classify(
        &self,
        decisions: &[Decision],
        deck: &[Item],
    ) -> Result<ClassificationResult, SwipeError> {
        let fixed = classify_fixed(decisions, deck.len())?;
        let Some(generator) = &self.generator else {
            return Ok(fixed);
        };

        let request = GenerationRequest::new(fixed.bucket, fixed.summary, decisions, deck);
        match self.enrich(generator.as_ref(), &request).await {
            Ok(profile) => {
                debug!(bucket = %fixed.bucket, title = %profile.archetype.title, "generated archetype");
                Ok(profile.into_result(fixed.bucket, fixed.summary))
            }
            Err(err) => {
                warn!(bucket = %fixed.bucket, error = %err, "archetype generation failed; using fixed descriptor");
                Ok(fixed)
            }
        }
    }

    async fn enrich(
        &self,
        generator: &dyn ArchetypeGenerator,
        request: &GenerationRequest,
    ) -> Result<GeneratedProfile, GenerationError> {
        let raw = tokio::time::timeout(self.timeout, generator.generate(request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;
        if raw.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        GeneratedProfile::parse(&raw)
    }
}

impl Default for ArchetypeClassifier {
    fn default() -> Self {
        Self::fixed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bucket, Direction, ResultSource};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn deck() -> Vec<Item> {
        (1..=10).map(|i| Item::new(i, format!("pitch {i}"))).collect()
    }

    fn decisions(invested: usize) -> Vec<Decision> {
        let now = Utc::now();
        deck()
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
            .collect()
    }

    /// 生成器のテストダブル
    struct ScriptedGenerator {
        output: Result<String, GenerationError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(output: Result<String, GenerationError>) -> Self {
            Self {
                output,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ArchetypeGenerator for ScriptedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.output.clone()
        }
    }

    const GENERATED: &str = r#"{"archetype": {"title": "The AI Maximalist",
        "description": "Everything must have AI.", "traits": ["Hyped"],
        "emoji": "🤖", "color": "bg-gradient-to-br from-cyan-400 to-blue-600"},
        "startup_pack": {"company_name": "GPTeverything", "user_persona": "Everyone",
        "tagline": "AI For Literally Anything", "viral_growth_hack": "Ship a chatbot",
        "slogan": "🔥 Find Hot Startups Nearby."}}"#;

    #[tokio::test]
    async fn fixed_classifier_uses_bucket_descriptor() {
        let result = ArchetypeClassifier::fixed()
            .classify(&decisions(7), &deck())
            .await
            .unwrap();

        assert_eq!(result.bucket, Bucket::High);
        assert_eq!(result.archetype, Bucket::High.archetype());
        assert_eq!(result.source, ResultSource::Fixed);
    }

    #[tokio::test]
    async fn incomplete_sequence_is_a_precondition_violation() {
        let err = ArchetypeClassifier::fixed()
            .classify(&decisions(7)[..9], &deck())
            .await
            .unwrap_err();
        assert!(matches!(err, SwipeError::IncompleteSession { actual: 9, .. }));
    }

    #[tokio::test]
    async fn valid_generation_replaces_content_but_not_bucket() {
        let generator = Arc::new(ScriptedGenerator::new(Ok(GENERATED.to_string())));
        let classifier = ArchetypeClassifier::with_generator(generator.clone(), Duration::from_secs(1));

        let result = classifier.classify(&decisions(3), &deck()).await.unwrap();

        assert_eq!(result.bucket, Bucket::Low);
        assert_eq!(result.archetype.title, "The AI Maximalist");
        assert_eq!(result.source, ResultSource::Generated);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generator_failure_falls_back() {
        let generator = Arc::new(ScriptedGenerator::new(Err(GenerationError::Transport(
            "connection refused".into(),
        ))));
        let classifier = ArchetypeClassifier::with_generator(generator, Duration::from_secs(1));

        let result = classifier.classify(&decisions(5), &deck()).await.unwrap();

        assert_eq!(result.bucket, Bucket::Mid);
        assert_eq!(result.archetype, Bucket::Mid.archetype());
        assert_eq!(result.source, ResultSource::Fixed);
    }

    #[tokio::test]
    async fn invalid_output_falls_back() {
        for output in ["", "{\"archetype\": {}}", "sorry, I cannot help"] {
            let generator = Arc::new(ScriptedGenerator::new(Ok(output.to_string())));
            let classifier = ArchetypeClassifier::with_generator(generator, Duration::from_secs(1));

            let result = classifier.classify(&decisions(8), &deck()).await.unwrap();
            assert_eq!(result.source, ResultSource::Fixed, "output: {output:?}");
            assert_eq!(result.bucket, Bucket::High);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generator_times_out_to_fallback() {
        let generator = Arc::new(ScriptedGenerator {
            delay: Duration::from_secs(60),
            ..ScriptedGenerator::new(Ok(GENERATED.to_string()))
        });
        let classifier = ArchetypeClassifier::with_generator(generator, Duration::from_millis(100));

        let result = classifier.classify(&decisions(10), &deck()).await.unwrap();

        assert_eq!(result.source, ResultSource::Fixed);
        assert_eq!(result.bucket, Bucket::High);
    }
}
