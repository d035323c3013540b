//! # rollcall: attendance sheet extraction service
//!
//! `rollcall` accepts an uploaded attendance sheet (a photo, a scanned PDF, or an Excel workbook),
//! forwards it to a generative model together with a fixed extraction instruction, and returns
//! whatever the model produced: decoded JSON when the reply parses, the raw text otherwise.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). A single endpoint, `POST /upload/`,
//! reads the `file` field of a multipart form and hands it to the [`extraction::Extractor`].
//! The extractor classifies the upload by extension, renders spreadsheets to CSV, builds one
//! [`generation::ModelRequest`] and sends it through a [`generation::Generate`] implementation:
//! Gemini's `generateContent` API by default, or any OpenAI-compatible endpoint.
//!
//! No state survives a request. Uploads are held in memory only while they are being processed,
//! and nothing is persisted.
//!
//! ## Configuration
//!
//! See [`config`] for the YAML file layout and environment overrides. `GEMINI_API_KEY` is
//! required; startup fails without it.
//!
//! ## Getting Started
//!
//! ```no_run
//! use rollcall::{Application, Config, config::Args, telemetry};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = Args::parse();
//!     let config = Config::load(&args)?;
//!     telemetry::init_telemetry(config.log_format)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.ok();
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod generation;
pub mod openapi;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use extraction::Extractor;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .extractor(Extractor::new(generator))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub extractor: Extractor,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        // Browsers send the bare origin, without the trailing slash `Url` adds to a path-less URL
        origins.push(origin.origin().ascii_serialization().parse::<HeaderValue>()?);
    }

    // Wildcards cannot be combined with credentials, so mirror what the preflight asks for
    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Routes:
/// - `POST /upload/` (and `/upload`): attendance extraction
/// - `GET /healthz`: liveness
/// - `GET /openapi.json` and `GET /docs`: API documentation
///
/// # Errors
///
/// Returns an error if an allowed origin cannot be expressed as a header value.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let upload_limit = state.config.limits.max_upload_size;
    debug!(upload_limit, "Building router");

    let upload_routes = Router::new()
        .route("/upload/", post(api::handlers::upload::upload_file))
        .route("/upload", post(api::handlers::upload::upload_file))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .merge(upload_routes)
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct.
///
/// 1. **Create**: [`Application::new`] builds the generation client and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!(bind_address = %config.bind_address(), "Starting rollcall");

        let generator = generation::build_generator(&config.generation)?;

        let app_state = AppState::builder()
            .config(config.clone())
            .extractor(Extractor::new(generator))
            .build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Rollcall listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Server stopped");
        Ok(())
    }
}
