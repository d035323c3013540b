//! OpenAI-compatible chat completions adapter.
//!
//! Images travel as `image_url` data URLs, PDFs as a `file` content part. Any gateway that
//! speaks the chat completions dialect (including Gemini's own OpenAI endpoint) works here.

use super::{GenerationError, Generate, ModelRequest, ensure_slash, http_client};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: Url, api_key: String, model: String, request_timeout: Duration) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http_client(request_timeout)?,
            base_url,
            api_key,
            model,
        })
    }

    fn request_body(&self, request: &ModelRequest) -> Value {
        let content = match request {
            ModelRequest::Text { prompt } => json!(prompt),
            ModelRequest::Document { prompt, attachment } => {
                let data_url = format!("data:{};base64,{}", attachment.mime_type, STANDARD.encode(&attachment.data));
                let document = if attachment.mime_type.starts_with("image/") {
                    json!({ "type": "image_url", "image_url": { "url": data_url } })
                } else {
                    json!({ "type": "file", "file": { "filename": "upload.pdf", "file_data": data_url } })
                };
                json!([document, { "type": "text", "text": prompt }])
            }
        };

        json!({
            "model": self.model,
            "stream": false,
            "messages": [{ "role": "user", "content": content }]
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[async_trait]
impl Generate for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, request: &ModelRequest) -> Result<String, GenerationError> {
        let url = ensure_slash(&self.base_url).join("chat/completions")?;
        debug!("Sending chat completion request to {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Chat completions API returned an error");
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body_text = response.text().await?;
        let completion: ChatCompletion = serde_json::from_str(&body_text).map_err(|e| {
            tracing::error!("Failed to parse chat completion response: {}", e);
            GenerationError::Decode(e.to_string())
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::EmptyResponse { reason: None })?;
        choice
            .message
            .content
            .ok_or(GenerationError::EmptyResponse {
                reason: choice.finish_reason,
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
