//! LLM Client — the single point of entry for all Gemini API calls in CareerIQ.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All LLM interactions MUST go through the `ChatModel` trait implemented here.
//!
//! Failures are surfaced to the caller as-is. There is no retry loop: a rate limit
//! or outage is shown to the user, who decides whether to resubmit.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chat::{Role, Turn};
use crate::config::Config;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Remote service error (status {status:?}): {message}")]
    RemoteService {
        status: Option<u16>,
        message: String,
    },

    #[error("Rate limited by the model provider")]
    RateLimited,

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::RemoteService {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// A completed model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub total_tokens: u64,
}

/// The seam between conversation logic and the hosted model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(
        &self,
        turns: &[Turn],
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<Generation, LlmError>;

    fn model_name(&self) -> &str;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (Gemini generateContent)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub total_token_count: u64,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Converts assembled turns into a Gemini request body.
///
/// The system turn becomes `systemInstruction`. Consecutive turns with the same
/// role are merged so `contents` alternates between `user` and `model`.
fn build_request<'a>(
    turns: &'a [Turn],
    temperature: f32,
    max_output_tokens: u32,
) -> GenerateContentRequest<'a> {
    let mut system_instruction: Option<GeminiContent<'a>> = None;
    let mut contents: Vec<GeminiContent<'a>> = Vec::new();

    for turn in turns {
        let wire_role = match turn.role() {
            Role::System => {
                system_instruction
                    .get_or_insert_with(|| GeminiContent {
                        role: None,
                        parts: Vec::new(),
                    })
                    .parts
                    .push(GeminiPart { text: turn.text() });
                continue;
            }
            Role::User => "user",
            Role::Assistant => "model",
        };

        match contents.last_mut() {
            Some(last) if last.role == Some(wire_role) => {
                last.parts.push(GeminiPart { text: turn.text() });
            }
            _ => contents.push(GeminiContent {
                role: Some(wire_role),
                parts: vec![GeminiPart { text: turn.text() }],
            }),
        }
    }

    GenerateContentRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig {
            temperature,
            max_output_tokens,
        },
    }
}

/// Gemini client shared by all sessions.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!(model = %config.gemini_model_name, "Gemini client initialized");

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            api_base: config.gemini_api_base.clone(),
            model: config.gemini_model_name.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn generate(
        &self,
        turns: &[Turn],
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<Generation, LlmError> {
        let request_body = build_request(turns, temperature, max_output_tokens);
        let started = std::time::Instant::now();

        debug!(
            model = %self.model,
            turns = turns.len(),
            temperature,
            max_output_tokens,
            "Gemini API request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini API rate limited the request");
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Gemini API returned {status}: {message}");
            return Err(LlmError::RemoteService {
                status: Some(status.as_u16()),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

        let text = parsed.text().ok_or_else(|| {
            let reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            warn!(finish_reason = reason, "Gemini returned no text");
            LlmError::EmptyContent
        })?;
        let total_tokens = parsed
            .usage_metadata
            .map(|u| u.total_token_count)
            .unwrap_or(0);

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            tokens = total_tokens,
            "Gemini response OK"
        );

        Ok(Generation { text, total_tokens })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
