//! Text generation collaborators.
//!
//! The extraction handler only needs one capability from the outside world: send a prompt
//! (optionally with a single binary attachment) to a hosted model and get text back. That
//! capability is the [`Generate`] trait. Each hosted provider gets one adapter:
//!
//! - [`gemini::GeminiClient`]: Google Gemini `generateContent` (the default)
//! - [`openai::OpenAiClient`]: any OpenAI-compatible `chat/completions` endpoint
//!
//! Adapters are built once at startup by [`build_generator`] and shared read-only between
//! requests.

pub mod gemini;
pub mod openai;

use crate::config::{GenerationConfig, GenerationProvider};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::{error::Error as _, sync::Arc, time::Duration};
use thiserror::Error;
use url::Url;

/// A document's raw bytes plus the content type they are declared as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub data: Bytes,
    pub mime_type: &'static str,
}

/// A single request to a generation service.
///
/// Exactly one shape is built per upload: spreadsheets are rendered into the prompt and sent
/// as text, everything else travels as an attachment next to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRequest {
    Text { prompt: String },
    Document { prompt: String, attachment: Attachment },
}

impl ModelRequest {
    pub fn prompt(&self) -> &str {
        match self {
            ModelRequest::Text { prompt } | ModelRequest::Document { prompt, .. } => prompt,
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            ModelRequest::Text { .. } => None,
            ModelRequest::Document { attachment, .. } => Some(attachment),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport failure: connection refused, DNS, TLS, timeout
    #[error("request to generation service failed: {0}")]
    Http(String),

    /// The service answered with a non-success status
    #[error("generation service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The response envelope was not what the provider documents
    #[error("failed to decode generation response: {0}")]
    Decode(String),

    /// The envelope was valid but carried no text
    #[error("generation service returned no text{}", .reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    EmptyResponse { reason: Option<String> },

    /// The configured base URL could not be joined with the provider path
    #[error("invalid generation endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's Display hides the cause ("error sending request"), so walk the chain
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        GenerationError::Http(message)
    }
}

/// Something that turns a [`ModelRequest`] into model output text.
#[async_trait]
pub trait Generate: Send + Sync {
    /// Send one request and wait for one complete (non-streamed) reply.
    async fn generate(&self, request: &ModelRequest) -> Result<String, GenerationError>;

    /// Model identifier used for every call made by this adapter.
    fn model(&self) -> &str;
}

/// Build the adapter selected by the configuration.
pub fn build_generator(config: &GenerationConfig) -> anyhow::Result<Arc<dyn Generate>> {
    let api_key = config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("generation.api_key is not configured"))?;
    let base_url = config.base_url();
    let model = config.model().to_string();

    let generator: Arc<dyn Generate> = match config.provider {
        GenerationProvider::Gemini => Arc::new(gemini::GeminiClient::new(base_url, api_key, model, config.request_timeout)?),
        GenerationProvider::Openai => Arc::new(openai::OpenAiClient::new(base_url, api_key, model, config.request_timeout)?),
    };

    tracing::info!(provider = ?config.provider, model = generator.model(), "Generation client ready");
    Ok(generator)
}

/// Shared reqwest client construction for all adapters.
fn http_client(timeout: Duration) -> Result<Client, GenerationError> {
    // reqwest is built without a bundled crypto provider; installing twice is a no-op error
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    Ok(Client::builder().timeout(timeout).build()?)
}

/// Makes sure a url has a trailing slash.
///
/// `Url::join` replaces the last path segment unless the base ends in '/', so
/// `https://host/v1beta` joined with `models` would give `https://host/models`.
fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let mut path = new_url.path().to_string();
        path.push('/');
        new_url.set_path(&path);
        new_url
    }
}
