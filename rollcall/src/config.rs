//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ROLLCALL_CONFIG`
//! environment variable. The file is optional: every field has a default except the generation
//! API key.
//!
//! A `.env` file in the working directory (or any parent) is read into the process environment
//! at startup by [`load_dotenv`]. Variables already set in the environment take precedence over it.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ROLLCALL_` override YAML values,
//!    whether set directly or through `.env`
//! 3. **GEMINI_API_KEY** - Special case: overrides `generation.api_key` if set
//! 4. **FRONTEND_URL** - Special case: replaces `cors.allowed_origins` with this single origin
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ROLLCALL_GENERATION__MODEL=gemini-2.0-flash` sets the `generation.model` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Credential for the default (Gemini) provider
//! GEMINI_API_KEY="..."
//!
//! # Allow the deployed frontend
//! FRONTEND_URL="https://attendance.example.com"
//!
//! # Switch to an OpenAI-compatible endpoint
//! ROLLCALL_GENERATION__PROVIDER=openai
//! ROLLCALL_GENERATION__API_KEY="sk-..."
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::generation::{gemini, openai};

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ROLLCALL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Read `.env` into the process environment without overriding variables that are already set.
///
/// Returns the path of the file that was loaded, if one was found.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

#[derive(Debug, Error)]
#[error("Config validation: {0}")]
pub struct ConfigError(String);

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Single frontend origin, usually from `FRONTEND_URL`. Replaces `cors.allowed_origins`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_url: Option<Url>,
    /// Console log output format
    pub log_format: LogFormat,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
    /// Generation service used for extraction
    pub generation: GenerationConfig,
    /// Upload limits
    pub limits: LimitsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            frontend_url: None,
            log_format: LogFormat::default(),
            cors: CorsConfig::default(),
            generation: GenerationConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
///
/// All methods and request headers are allowed from the listed origins.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<Url>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![Url::parse("http://localhost:5173").expect("static origin is valid")],
            allow_credentials: true,
            max_age: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// Google Gemini `generateContent`
    #[default]
    Gemini,
    /// Any OpenAI-compatible `chat/completions` endpoint
    Openai,
}

/// Generation service configuration.
///
/// The model is fixed for the lifetime of the process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub provider: GenerationProvider,
    /// Credential for the provider. Required; startup fails without it.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model identifier (default depends on provider)
    pub model: Option<String>,
    /// API base URL (default depends on provider)
    pub base_url: Option<Url>,
    /// Per-call timeout, covering connect through the full reply
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::default(),
            api_key: None,
            model: None,
            base_url: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl GenerationConfig {
    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, GenerationProvider::Gemini) => gemini::DEFAULT_MODEL,
            (None, GenerationProvider::Openai) => openai::DEFAULT_MODEL,
        }
    }

    pub fn base_url(&self) -> Url {
        if let Some(url) = &self.base_url {
            return url.clone();
        }
        let default = match self.provider {
            GenerationProvider::Gemini => gemini::DEFAULT_BASE_URL,
            GenerationProvider::Openai => openai::DEFAULT_BASE_URL,
        };
        Url::parse(default).expect("static base url is valid")
    }
}

/// Upload limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes for uploads (default: 20MB, Gemini's inline data cap)
    pub max_upload_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 20 * 1024 * 1024,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // FRONTEND_URL names the one deployed frontend, so it replaces the default list
        if let Some(url) = config.frontend_url.take() {
            config.cors.allowed_origins = vec![url];
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.api_key.as_deref().is_none_or(|key| key.trim().is_empty()) {
            return Err(ConfigError(
                "generation.api_key is not configured. \
                 Please set GEMINI_API_KEY (or ROLLCALL_GENERATION__API_KEY) or add generation.api_key to the config file."
                    .to_string(),
            ));
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(ConfigError("cors.allowed_origins cannot be empty".to_string()));
        }

        if self.limits.max_upload_size == 0 {
            return Err(ConfigError("limits.max_upload_size cannot be 0".to_string()));
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("ROLLCALL_").filter(|key| key != "config").split("__"))
            // Conventional names used by existing deployments
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "generation.api_key".into()))
            .merge(Env::raw().only(&["FRONTEND_URL"]).map(|_| "frontend_url".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
