//! Archetype model: the classification derived from a completed session.
//!
//! The bucket is a pure function of the invested *count*. Which items were
//! invested in never changes it; a generative step may only swap the
//! descriptive content attached to the bucket.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::decision::{Decision, invested_count};
use super::errors::SwipeError;

/// Rates at or above this are "high".
pub const HIGH_THRESHOLD: f64 = 70.0;

/// Rates at or above this (and below `HIGH_THRESHOLD`) are "mid".
pub const MID_THRESHOLD: f64 = 40.0;

/// Slogan shared by every pack.
pub const SLOGAN: &str = "🔥 Find Hot Startups Nearby.";

/// Discrete classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    High,
    Mid,
    Low,
}

impl Bucket {
    /// Select a bucket by inclusive lower bound.
    pub fn for_rate(rate: f64) -> Self {
        if rate >= HIGH_THRESHOLD {
            Bucket::High
        } else if rate >= MID_THRESHOLD {
            Bucket::Mid
        } else {
            Bucket::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::High => "high",
            Bucket::Mid => "mid",
            Bucket::Low => "low",
        }
    }

    /// The fixed archetype for this bucket.
    pub fn archetype(self) -> Archetype {
        match self {
            Bucket::High => Archetype {
                title: "The Hype Founder".into(),
                description: "You're drawn to shiny objects and viral potential. Every startup sounds like the next big thing to you, and you're not afraid to take risks on bold ideas.".into(),
                traits: traits(&["Risk-Taker", "Optimistic", "Trend-Spotter", "Ambitious"]),
                emoji: "🚀".into(),
                color: "bg-gradient-to-br from-orange-400 to-red-600".into(),
            },
            Bucket::Mid => Archetype {
                title: "The Balanced Visionary".into(),
                description: "You have a keen eye for practical innovation. You can spot real potential while avoiding the obvious traps, making you a thoughtful investor.".into(),
                traits: traits(&["Strategic", "Analytical", "Visionary", "Prudent"]),
                emoji: "🎯".into(),
                color: "bg-gradient-to-br from-blue-400 to-purple-600".into(),
            },
            Bucket::Low => Archetype {
                title: "The Skeptical Sage".into(),
                description: "You're incredibly selective and see through the hype. Most ideas don't impress you, but when you invest, it's usually gold. Your standards are sky-high.".into(),
                traits: traits(&["Discerning", "Realistic", "Critical", "Perfectionist"]),
                emoji: "🧙\u{200d}♂️".into(),
                color: "bg-gradient-to-br from-gray-400 to-gray-700".into(),
            },
        }
    }

    /// The fixed companion pack for this bucket.
    pub fn pack(self) -> Pack {
        let (company_name, persona, tagline, growth_hack) = match self {
            Bucket::High => (
                "TrendFlow",
                "Early adopters and tech enthusiasts seeking the latest innovations",
                "Catch Tomorrow's Trends Today",
                "Create FOMO with limited beta access and countdown timers",
            ),
            Bucket::Mid => (
                "SmartBridge",
                "Business professionals looking for efficient, proven solutions",
                "Smart Solutions, Real Results",
                "Partner with industry leaders for credible endorsements",
            ),
            Bucket::Low => (
                "CoreLogic",
                "Conservative investors and established business owners",
                "Proven. Reliable. Essential.",
                "Focus on word-of-mouth from satisfied enterprise clients",
            ),
        };
        Pack {
            company_name: company_name.into(),
            persona: persona.into(),
            tagline: tagline.into(),
            growth_hack: growth_hack.into(),
            slogan: SLOGAN.into(),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn traits(values: &[&str]) -> Vec<String> {
    values.iter().map(|t| t.to_string()).collect()
}

/// Descriptive label attached to a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub title: String,
    pub description: String,
    pub traits: Vec<String>,
    pub emoji: String,
    pub color: String,
}

/// Generated companion content attached to a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub company_name: String,
    #[serde(alias = "user_persona")]
    pub persona: String,
    pub tagline: String,
    #[serde(alias = "viral_growth_hack")]
    pub growth_hack: String,
    pub slogan: String,
}

/// Aggregate counts behind a classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwipeSummary {
    pub total_swipes: usize,
    pub invested_count: usize,
    pub rejected_count: usize,
    pub investment_rate: f64,
}

impl SwipeSummary {
    pub fn from_decisions(decisions: &[Decision]) -> Self {
        let total_swipes = decisions.len();
        let invested = invested_count(decisions);
        Self {
            total_swipes,
            invested_count: invested,
            rejected_count: total_swipes - invested,
            investment_rate: investment_rate(invested, total_swipes),
        }
    }
}

/// `100 * invested / total`, multiplied first so round counts stay exact.
pub fn investment_rate(invested: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (invested * 100) as f64 / total as f64
}

/// Where the descriptive content of a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Fixed,
    Generated,
}

/// Output of the archetype classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub bucket: Bucket,
    pub archetype: Archetype,
    pub pack: Pack,
    pub summary: SwipeSummary,
    pub source: ResultSource,
}

impl ClassificationResult {
    /// Result built from the fixed descriptors of `bucket`.
    pub fn fixed(bucket: Bucket, summary: SwipeSummary) -> Self {
        Self {
            bucket,
            archetype: bucket.archetype(),
            pack: bucket.pack(),
            summary,
            source: ResultSource::Fixed,
        }
    }
}

/// Deterministic minimal classification.
///
/// `expected` is the deck size; anything other than a full sequence is
/// `IncompleteSession`.
pub fn classify_fixed(
    decisions: &[Decision],
    expected: usize,
) -> Result<ClassificationResult, SwipeError> {
    if expected == 0 || decisions.len() != expected {
        return Err(SwipeError::IncompleteSession {
            expected,
            actual: decisions.len(),
        });
    }
    let summary = SwipeSummary::from_decisions(decisions);
    let bucket = Bucket::for_rate(summary.investment_rate);
    Ok(ClassificationResult::fixed(bucket, summary))
}
