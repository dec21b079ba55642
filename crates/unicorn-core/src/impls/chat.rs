//! ChatGenerator - OpenAI 互換の chat completions によるアーキタイプ・ピッチ生成
//!
//! 返すのはモデルの生テキストのみ。形の検証とフォールバックは
//! `ArchetypeClassifier` / `TopUpDeckProvider` 側で行う。

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeneratorConfig;
use crate::domain::GenerationError;
use crate::ports::{ArchetypeGenerator, GenerationRequest, PitchGenerator};

const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 800;
const PITCH_TEMPERATURE: f32 = 0.9;
const PITCH_MAX_TOKENS: u32 = 100;
/// Rejected pitches quoted in the prompt.
const REJECTED_IN_PROMPT: usize = 5;

const PITCH_PROMPT: &str = r#"Generate a single, creative startup pitch in one sentence. Make it either:
1. Brilliant and actually viable
2. Absurd but entertaining
3. Cursed and weird

Examples:
- "AI that drafts cold emails based on LinkedIn profiles."
- "Uber for blood donations, matching hospitals to nearby donors in real-time."
- "A Chrome extension that replaces LinkedIn buzzwords with insults."

Return ONLY the pitch sentence, no quotes or extra text."#;

#[derive(Clone)]
pub struct ChatGenerator {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl ChatGenerator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(&config.api_key, &config.model, &config.url)
    }

    fn body(&self, content: String, temperature: f32, max_tokens: u32) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            temperature,
            max_tokens,
        }
    }

    fn archetype_body(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        self.body(build_prompt(request), TEMPERATURE, MAX_TOKENS)
    }

    fn pitch_body(&self) -> ChatCompletionRequest {
        self.body(PITCH_PROMPT.to_string(), PITCH_TEMPERATURE, PITCH_MAX_TOKENS)
    }

    async fn complete(&self, body: &ChatCompletionRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(http_error(status, &text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::InvalidShape(err.to_string()))?;
        extract_content(parsed)
    }
}

#[async_trait]
impl ArchetypeGenerator for ChatGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        debug!(model = %self.model, bucket = %request.bucket, "requesting archetype");
        self.complete(&self.archetype_body(request)).await
    }
}

#[async_trait]
impl PitchGenerator for ChatGenerator {
    async fn generate_pitch(&self) -> Result<String, GenerationError> {
        debug!(model = %self.model, "requesting pitch");
        let raw = self.complete(&self.pitch_body()).await?;
        Ok(raw.trim().to_string())
    }
}

/// Prompt asking for one archetype plus startup pack as strict JSON.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let summary = &request.summary;
    let rejected_shown = request
        .rejected
        .iter()
        .take(REJECTED_IN_PROMPT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");
    let ellipsis = if request.rejected.len() > REJECTED_IN_PROMPT {
        "..."
    } else {
        ""
    };

    format!(
        r#"You are an expert startup psychologist. From a user's swipe decisions on startup pitches, describe their founder archetype and write a matching startup pack.

SWIPE DATA:
- Total swipes: {total}
- Investment rate: {rate:.1}%
- Investor category: {bucket}
- Invested in: {invested}
- Rejected: {rejected}{ellipsis}

Pick a title that fits the investor category. Be creative, insightful and slightly humorous.

Return ONLY a JSON object with exactly this structure:
{{
  "archetype": {{
    "title": "The [Archetype Name]",
    "description": "2-3 sentence personality description",
    "traits": ["trait1", "trait2", "trait3", "trait4"],
    "emoji": "🔥",
    "color": "bg-gradient-to-br from-orange-400 to-red-600"
  }},
  "startup_pack": {{
    "company_name": "Creative startup name",
    "user_persona": "Target customer description",
    "tagline": "Catchy 5-7 word tagline",
    "viral_growth_hack": "Creative growth strategy",
    "slogan": "🔥 Find Hot Startups Nearby."
  }}
}}"#,
        total = summary.total_swipes,
        rate = summary.investment_rate,
        bucket = request.bucket,
        invested = request.invested.join("; "),
        rejected = rejected_shown,
    )
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_content(response: ChatCompletionResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

fn http_error(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());
    GenerationError::Transport(format!("HTTP {}: {message}", status.as_u16()))
}
