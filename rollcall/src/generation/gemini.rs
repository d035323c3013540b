//! Google Gemini adapter (`models/{model}:generateContent`).

use super::{GenerationError, Generate, ModelRequest, ensure_slash, http_client};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: Url, api_key: String, model: String, request_timeout: Duration) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http_client(request_timeout)?,
            base_url,
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> Result<Url, GenerationError> {
        Ok(ensure_slash(&self.base_url).join(&format!("models/{}:generateContent", self.model))?)
    }

    /// Request body for a single-turn, non-streaming call.
    ///
    /// Documents go first as `inlineData`, followed by the instruction text.
    fn request_body(request: &ModelRequest) -> Value {
        let parts = match request {
            ModelRequest::Text { prompt } => vec![json!({ "text": prompt })],
            ModelRequest::Document { prompt, attachment } => vec![
                json!({
                    "inlineData": {
                        "mimeType": attachment.mime_type,
                        "data": STANDARD.encode(&attachment.data),
                    }
                }),
                json!({ "text": prompt }),
            ],
        };

        json!({
            "contents": [{ "role": "user", "parts": parts }]
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    /// Thinking models emit reasoning parts that are not part of the answer
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate.
    fn into_text(self) -> Result<String, GenerationError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(GenerationError::EmptyResponse { reason: block_reason });
        };

        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();

        if texts.is_empty() {
            return Err(GenerationError::EmptyResponse {
                reason: candidate.finish_reason.or(block_reason),
            });
        }
        Ok(texts.concat())
    }
}

#[async_trait]
impl Generate for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, request: &ModelRequest) -> Result<String, GenerationError> {
        let url = self.endpoint()?;
        debug!("Sending generateContent request to {}", url);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Gemini API returned an error");
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body_text = response.text().await?;
        debug!(response_bytes = body_text.len(), "Gemini response received");

        let parsed: GenerateContentResponse = serde_json::from_str(&body_text).map_err(|e| {
            tracing::error!("Failed to parse generateContent response: {}", e);
            tracing::debug!("Response body was: {}", body_text);
            GenerationError::Decode(e.to_string())
        })?;
        parsed.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}
