//! Upload-to-extraction pipeline.
//!
//! One linear pass per upload, with two branch points:
//!
//! 1. [`FileKind::from_filename`] decides whether the upload is a document (image/PDF, sent as
//!    an attachment) or a spreadsheet (rendered to CSV and embedded in the prompt).
//! 2. [`ExtractionOutcome::decode`] decides whether the model reply is returned as decoded JSON
//!    or as the raw text.
//!
//! Validation happens before anything leaves the process: an upload that fails classification
//! never reaches the generation service.

pub mod file_kind;
pub mod outcome;
pub mod prompt;
pub mod spreadsheet;

pub use file_kind::FileKind;
pub use outcome::ExtractionOutcome;

use crate::errors::{Error, Result};
use crate::generation::{Generate, ModelRequest};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A file as received from the client, held in memory for one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Bytes,
}

/// Runs uploads through the generation service.
#[derive(Clone)]
pub struct Extractor {
    generator: Arc<dyn Generate>,
}

impl Extractor {
    pub fn new(generator: Arc<dyn Generate>) -> Self {
        Self { generator }
    }

    /// Build the model request for an upload without calling the model.
    pub async fn build_request(&self, upload: UploadedFile) -> Result<ModelRequest> {
        let kind = FileKind::from_filename(&upload.filename)?;

        match kind {
            FileKind::Spreadsheet => {
                debug!("Processing as spreadsheet");
                // Workbook parsing is CPU bound, keep it off the async workers
                let csv = tokio::task::spawn_blocking(move || spreadsheet::render_csv(&upload.content))
                    .await
                    .map_err(|e| Error::Other(anyhow::anyhow!("spreadsheet rendering task failed: {e}")))??;
                debug!(csv_bytes = csv.len(), "Spreadsheet rendered to CSV");
                Ok(prompt::spreadsheet_request(&csv))
            }
            FileKind::Document { mime_type } => {
                debug!(mime_type, bytes = upload.content.len(), "Processing as document");
                Ok(prompt::document_request(upload.content, mime_type))
            }
        }
    }

    /// Classify, build, send exactly one request, and decode the reply.
    #[instrument(skip_all, fields(filename = %upload.filename, model = self.generator.model()))]
    pub async fn extract(&self, upload: UploadedFile) -> Result<ExtractionOutcome> {
        let request = self.build_request(upload).await?;

        let reply = self.generator.generate(&request).await?;
        info!(reply_bytes = reply.len(), "Model reply received");

        let outcome = ExtractionOutcome::decode(reply);
        debug!(structured = outcome.is_structured(), "Model reply decoded");
        Ok(outcome)
    }
}
