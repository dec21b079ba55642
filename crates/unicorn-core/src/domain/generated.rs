//! Strict parsing of generative enrichment output.
//!
//! Model output is loosely shaped JSON. It is accepted only when every
//! required field is present and non-blank; partial output is an error and
//! the caller falls back to the fixed descriptor.

use serde::Deserialize;

use super::archetype::{Archetype, Bucket, ClassificationResult, Pack, ResultSource, SwipeSummary};
use super::errors::GenerationError;

#[derive(Debug, Deserialize)]
struct RawProfile {
    archetype: RawArchetype,
    #[serde(alias = "pack")]
    startup_pack: RawPack,
}

#[derive(Debug, Deserialize)]
struct RawArchetype {
    title: String,
    description: String,
    traits: Vec<String>,
    emoji: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct RawPack {
    company_name: String,
    #[serde(alias = "persona")]
    user_persona: String,
    tagline: String,
    #[serde(alias = "growth_hack")]
    viral_growth_hack: String,
    slogan: String,
}

/// Validated archetype + pack produced by a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProfile {
    pub archetype: Archetype,
    pub pack: Pack,
}

impl GeneratedProfile {
    /// Parse raw model text into a profile.
    ///
    /// Surrounding prose and markdown code fences are tolerated; the first
    /// `{` through the last `}` is decoded.
    pub fn parse(raw: &str) -> Result<Self, GenerationError> {
        let body = extract_json_object(raw)
            .ok_or_else(|| GenerationError::InvalidShape("no JSON object found".into()))?;
        let profile: RawProfile = serde_json::from_str(body)
            .map_err(|e| GenerationError::InvalidShape(format!("json decode: {e}")))?;

        let a = profile.archetype;
        let p = profile.startup_pack;

        let archetype = Archetype {
            title: required("archetype.title", a.title)?,
            description: required("archetype.description", a.description)?,
            traits: normalize_traits(a.traits)?,
            emoji: required("archetype.emoji", a.emoji)?,
            color: required("archetype.color", a.color)?,
        };
        let pack = Pack {
            company_name: required("startup_pack.company_name", p.company_name)?,
            persona: required("startup_pack.user_persona", p.user_persona)?,
            tagline: required("startup_pack.tagline", p.tagline)?,
            growth_hack: required("startup_pack.viral_growth_hack", p.viral_growth_hack)?,
            slogan: required("startup_pack.slogan", p.slogan)?,
        };

        Ok(Self { archetype, pack })
    }

    /// Attach to an already computed bucket. The bucket is never re-derived here.
    pub fn into_result(self, bucket: Bucket, summary: SwipeSummary) -> ClassificationResult {
        ClassificationResult {
            bucket,
            archetype: self.archetype,
            pack: self.pack,
            summary,
            source: ResultSource::Generated,
        }
    }
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn required(field: &str, value: String) -> Result<String, GenerationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::InvalidShape(format!("{field} is blank")));
    }
    Ok(trimmed.to_string())
}

fn normalize_traits(values: Vec<String>) -> Result<Vec<String>, GenerationError> {
    let mut traits: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if value.is_empty() || traits.iter().any(|t| t.eq_ignore_ascii_case(value)) {
            continue;
        }
        traits.push(value.to_string());
    }
    if traits.is_empty() {
        return Err(GenerationError::InvalidShape("archetype.traits is empty".into()));
    }
    Ok(traits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
      "archetype": {
        "title": "The Chaos Goblin",
        "description": "Drawn to cursed ideas.",
        "traits": ["Weird", "Bold", "weird", " "],
        "emoji": "👹",
        "color": "bg-gradient-to-br from-green-400 to-lime-600"
      },
      "startup_pack": {
        "company_name": "CursedCo",
        "user_persona": "People who enjoy chaos",
        "tagline": "Embrace the Weird Today",
        "viral_growth_hack": "Release features only at 3am",
        "slogan": "🔥 Find Hot Startups Nearby."
      }
    }"#;

    #[test]
    fn parses_complete_output_and_cleans_traits() {
        let profile = GeneratedProfile::parse(VALID).unwrap();

        assert_eq!(profile.archetype.title, "The Chaos Goblin");
        assert_eq!(profile.archetype.traits, vec!["Weird", "Bold"]);
        assert_eq!(profile.pack.persona, "People who enjoy chaos");
    }

    #[test]
    fn tolerates_code_fences() {
        let fenced = format!("Here you go:\n```json\n{VALID}\n```");
        assert!(GeneratedProfile::parse(&fenced).is_ok());
    }

    #[test]
    fn rejects_partial_output() {
        let missing_pack = r#"{"archetype": {"title": "x", "description": "y",
            "traits": ["a"], "emoji": "e", "color": "c"}}"#;
        assert!(matches!(
            GeneratedProfile::parse(missing_pack),
            Err(GenerationError::InvalidShape(_))
        ));

        let blank_title = VALID.replace("The Chaos Goblin", "  ");
        let err = GeneratedProfile::parse(&blank_title).unwrap_err();
        assert_eq!(
            err,
            GenerationError::InvalidShape("archetype.title is blank".into())
        );

        assert!(GeneratedProfile::parse("not json at all").is_err());
    }

    #[test]
    fn generated_result_keeps_given_bucket() {
        let summary = SwipeSummary {
            total_swipes: 10,
            invested_count: 8,
            rejected_count: 2,
            investment_rate: 80.0,
        };
        let result = GeneratedProfile::parse(VALID)
            .unwrap()
            .into_result(Bucket::High, summary);

        assert_eq!(result.bucket, Bucket::High);
        assert_eq!(result.source, ResultSource::Generated);
    }
}
