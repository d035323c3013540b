use crate::extraction::spreadsheet::SpreadsheetError;
use crate::generation::GenerationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Multipart body carried no `file` field
    #[error("No file provided.")]
    MissingFile,

    /// The uploaded file had no (or an empty) filename
    #[error("No filename provided.")]
    MissingFilename,

    /// Extension is not one we know how to forward
    #[error("Unsupported file type: {extension}")]
    UnsupportedFileType { extension: String },

    /// Malformed request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Upload exceeded the configured body limit
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// The spreadsheet could not be decoded
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    /// The generation service failed, was unreachable or timed out
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable description of the failure
    pub detail: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFile | Error::MissingFilename | Error::UnsupportedFileType { .. } | Error::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Spreadsheet(_) | Error::Generation(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Spreadsheet(_) | Error::Generation(_) | Error::Other(_) => {
                tracing::error!("Extraction failed: {:#}", self);
            }
            Error::PayloadTooLarge { .. } => {
                tracing::warn!("Upload rejected: {}", self);
            }
            Error::MissingFile | Error::MissingFilename | Error::UnsupportedFileType { .. } | Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        // Downstream failures are passed through verbatim so the caller can see why the model call failed
        let body = ErrorResponse { detail: self.to_string() };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;
