//! Test doubles and constructors shared by unit and HTTP tests.

use crate::config::{Config, GenerationConfig};
use crate::generation::{GenerationError, Generate, ModelRequest};
use async_trait::async_trait;
use axum_test::TestServer;
use std::sync::{Arc, Mutex};

/// Generator that records every request and answers with a fixed reply.
#[derive(Debug, Default)]
pub struct RecordingGenerator {
    reply: String,
    requests: Mutex<Vec<ModelRequest>>,
}

impl RecordingGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("recording lock poisoned").clone()
    }
}

#[async_trait]
impl Generate for RecordingGenerator {
    async fn generate(&self, request: &ModelRequest) -> Result<String, GenerationError> {
        self.requests.lock().expect("recording lock poisoned").push(request.clone());
        Ok(self.reply.clone())
    }

    fn model(&self) -> &str {
        "recording-model"
    }
}

/// Generator that fails every call as if the service were unreachable.
#[derive(Debug, Clone)]
pub struct FailingGenerator {
    message: String,
}

impl FailingGenerator {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[async_trait]
impl Generate for FailingGenerator {
    async fn generate(&self, _request: &ModelRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Http(self.message.clone()))
    }

    fn model(&self) -> &str {
        "failing-model"
    }
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        generation: GenerationConfig {
            api_key: Some("test-api-key".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// HTTP test server wired to the given generator.
pub fn create_test_server(config: Config, generator: Arc<dyn Generate>) -> TestServer {
    let state = crate::AppState::builder()
        .config(config)
        .extractor(crate::extraction::Extractor::new(generator))
        .build();
    let router = crate::build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// In-memory `.xlsx` with a `name,present_day,total_day` header and one row per entry.
pub fn roster_xlsx(rows: &[(&str, i32, i32)]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["name", "present_day", "total_day"].into_iter().enumerate() {
        sheet.write_string(0, col as u16, header).unwrap();
    }
    for (idx, (name, present, total)) in rows.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string(row, 0, *name).unwrap();
        sheet.write_number(row, 1, *present).unwrap();
        sheet.write_number(row, 2, *total).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}
