use crate::http::build_client;
use crate::llm::TextGenerator;
use crate::settings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: settings::text("GEMINI_ENDPOINT")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".into()),
            api_key: settings::text("GEMINI_API_KEY"),
            model: settings::text("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("missing GEMINI_API_KEY")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub struct GeminiClient {
    http: Client,
    config: LlmConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        Ok(Self {
            http: build_client(),
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| LlmError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::Http(format!("HTTP {}", response.status())));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;

        if let Some(usage) = &payload.usage_metadata {
            tracing::debug!(
                target = "listing.llm",
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "gemini_usage"
            );
        }

        payload
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .find_map(|part| part.text)
            .ok_or_else(|| LlmError::InvalidResponse("missing text".into()))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    #[serde(default)]
    content: ResponseContent,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}
