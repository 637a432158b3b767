use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};

use crate::config::{GENERATION_MODEL, TEMPERATURE};
use crate::error::{Result, VocabError};
use crate::prompt::Prompt;

const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct LLMConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: GENERATION_MODEL.to_string(),
            temperature: TEMPERATURE,
            max_output_tokens: None,
        }
    }
}

/// Text produced for one prompt plus token accounting when the service
/// reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub prompt_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

impl Generation {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Hosted text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<Generation>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: u32,
    message: String,
    status: String,
}

/// Gemini `generateContent` over REST. One request per call, no retries.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: LLMConfig,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, config: LLMConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(VocabError::MissingCredential);
        }

        let client = Client::builder()
            .user_agent(concat!("vocab-rag/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(GeminiClient {
            client,
            api_key,
            config,
            base_url: GEMINI_API_BASE_URL.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.config.model)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &Prompt) -> Result<Generation> {
        let request = build_request(prompt, &self.config)?;
        let start_time = Instant::now();

        debug!(
            "Requesting {} (system {} chars, user {} chars)",
            self.config.model,
            prompt.system.len(),
            prompt.user.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(
            "Gemini responded {} in {}ms ({} bytes)",
            status,
            start_time.elapsed().as_millis(),
            body.len()
        );

        if !status.is_success() {
            error!("Gemini API error - Status: {}, Response: {}", status, body);
            return Err(error_for_status(status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| VocabError::Generation(format!("failed to parse API response: {e}")))?;
        parse_generation(parsed)
    }
}

fn build_request(prompt: &Prompt, config: &LLMConfig) -> Result<GenerateContentRequest> {
    if prompt.user.trim().is_empty() {
        return Err(VocabError::Generation("query cannot be empty".to_string()));
    }

    Ok(GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: prompt.system.clone(),
            }],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: prompt.user.clone(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        },
    })
}

/// Joins the text parts of the first candidate. Anything else in the reply
/// is ignored.
fn parse_generation(response: GenerateContentResponse) -> Result<Generation> {
    let usage = response.usage_metadata;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(VocabError::Generation(format!("empty response: {reason}")));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "no text".to_string());
        return Err(VocabError::Generation(format!("empty response: {reason}")));
    }

    Ok(Generation {
        prompt_tokens: usage.as_ref().and_then(|u| u.prompt_token_count),
        output_tokens: usage.as_ref().and_then(|u| u.candidates_token_count),
        ..Generation::from_text(text)
    })
}

fn error_for_status(status: u16, body: &str) -> VocabError {
    let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) else {
        return VocabError::Generation(format!("HTTP {status} - {body}"));
    };

    let detail = format!(
        "Gemini API error ({}): {} - {}",
        error_response.error.code, error_response.error.status, error_response.error.message
    );
    let message = match status {
        400 => format!("Bad request: {detail}"),
        401 => format!("Authentication failed - check GEMINI_API_KEY: {detail}"),
        403 => format!("Permission denied - check API key permissions: {detail}"),
        429 => format!("Rate limit exceeded - please retry later: {detail}"),
        500..=599 => format!("Gemini API server error: {detail}"),
        _ => format!("Unexpected API error: {detail}"),
    };
    VocabError::Generation(message)
}
