//! Configuration loading.
//!
//! Precedence (highest first): CLI flags (applied by the binary), `UNICORN_*`
//! environment variables, TOML file, compiled defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::DECK_SIZE;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Where decks come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckSource {
    /// Built-in sample pitches.
    #[default]
    Sample,
    /// `startup_pitches` table of the configured store.
    Remote,
}

/// Persistence collaborator (PostgREST-compatible endpoint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
}

/// Generative enrichment (OpenAI-compatible chat completions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_chat_url")]
    pub url: String,
}

fn default_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_chat_url() -> String {
    DEFAULT_CHAT_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    pub deck_size: usize,
    pub deck_source: DeckSource,
    /// Fixed seed for deck shuffling; entropy when unset.
    pub shuffle_seed: Option<u64>,
    pub generation_timeout_ms: u64,
    pub mirror_timeout_ms: u64,
    pub store: Option<StoreConfig>,
    pub generator: Option<GeneratorConfig>,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            deck_size: DECK_SIZE,
            deck_source: DeckSource::Sample,
            shuffle_seed: None,
            generation_timeout_ms: 15_000,
            mirror_timeout_ms: 5_000,
            store: None,
            generator: None,
        }
    }
}

impl SwipeConfig {
    /// Load from `path` (if any) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("UNICORN_DECK_SIZE") {
            self.deck_size = parse("UNICORN_DECK_SIZE", value)?;
        }
        if let Some(value) = lookup("UNICORN_SHUFFLE_SEED") {
            self.shuffle_seed = Some(parse("UNICORN_SHUFFLE_SEED", value)?);
        }
        if let Some(value) = lookup("UNICORN_GENERATION_TIMEOUT_MS") {
            self.generation_timeout_ms = parse("UNICORN_GENERATION_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("UNICORN_MIRROR_TIMEOUT_MS") {
            self.mirror_timeout_ms = parse("UNICORN_MIRROR_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("UNICORN_DECK_SOURCE") {
            self.deck_source = match value.as_str() {
                "sample" => DeckSource::Sample,
                "remote" => DeckSource::Remote,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "UNICORN_DECK_SOURCE",
                        value,
                    });
                }
            };
        }
        if let (Some(url), Some(api_key)) = (lookup("UNICORN_STORE_URL"), lookup("UNICORN_STORE_KEY")) {
            self.store = Some(StoreConfig { url, api_key });
        }
        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            match &mut self.generator {
                Some(generator) => generator.api_key = api_key,
                None => {
                    self.generator = Some(GeneratorConfig {
                        api_key,
                        model: lookup("OPENAI_MODEL_NAME").unwrap_or_else(default_model),
                        url: default_chat_url(),
                    });
                }
            }
        }
        Ok(self)
    }

    /// Whether `deck_size` is the size the bucket thresholds are tuned for.
    ///
    /// Other sizes are accepted (tests, demos) but not offered as a user option.
    pub fn is_canonical_deck_size(&self) -> bool {
        self.deck_size == DECK_SIZE
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_millis(self.mirror_timeout_ms)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = SwipeConfig::from_toml_str("").unwrap();
        assert_eq!(config, SwipeConfig::default());
        assert_eq!(config.deck_size, 10);
        assert_eq!(config.mirror_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn file_values_are_read() {
        let raw = r#"
            deck_size = 6
            deck_source = "remote"
            shuffle_seed = 42

            [store]
            url = "https://example.supabase.co"
            api_key = "anon"

            [generator]
            api_key = "sk-test"
        "#;

        let config = SwipeConfig::from_toml_str(raw).unwrap();

        assert_eq!(config.deck_size, 6);
        assert_eq!(config.deck_source, DeckSource::Remote);
        assert_eq!(config.shuffle_seed, Some(42));
        assert_eq!(config.store.unwrap().api_key, "anon");
        assert_eq!(config.generator.unwrap().model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn env_overrides_file() {
        let config = SwipeConfig::from_toml_str("deck_size = 6")
            .unwrap()
            .with_env(env(&[
                ("UNICORN_DECK_SIZE", "10"),
                ("UNICORN_STORE_URL", "http://localhost:54321"),
                ("UNICORN_STORE_KEY", "key"),
                ("OPENAI_API_KEY", "sk-env"),
            ]))
            .unwrap();

        assert_eq!(config.deck_size, 10);
        assert_eq!(config.store.unwrap().url, "http://localhost:54321");
        assert_eq!(config.generator.unwrap().api_key, "sk-env");
    }

    #[test]
    fn store_needs_both_url_and_key() {
        let config = SwipeConfig::default()
            .with_env(env(&[("UNICORN_STORE_URL", "http://localhost")]))
            .unwrap();
        assert!(config.store.is_none());
    }

    #[rstest]
    #[case::deck_size("UNICORN_DECK_SIZE", "ten")]
    #[case::seed("UNICORN_SHUFFLE_SEED", "-1")]
    #[case::timeout("UNICORN_MIRROR_TIMEOUT_MS", "soon")]
    #[case::source("UNICORN_DECK_SOURCE", "csv")]
    fn invalid_env_values_are_rejected(#[case] key: &str, #[case] value: &str) {
        let err = SwipeConfig::default()
            .with_env(env(&[(key, value)]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: k, .. } if k == key));
    }

    #[test]
    fn only_ten_items_is_canonical() {
        assert!(SwipeConfig::default().is_canonical_deck_size());
        let short = SwipeConfig::from_toml_str("deck_size = 6").unwrap();
        assert!(!short.is_canonical_deck_size());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SwipeConfig::load(Some(Path::new("/nonexistent/unicorn.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
