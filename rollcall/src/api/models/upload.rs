use crate::extraction::ExtractionOutcome;
use serde::Serialize;
use utoipa::ToSchema;

/// Successful extraction.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Decoded JSON from the model when its reply parses, otherwise the reply text verbatim.
    /// The model is asked for `{"extracted_data": [{"name", "present_day", "total_day" | "absent_day"}]}`
    /// but nothing enforces that shape.
    #[schema(value_type = Value)]
    pub result: ExtractionOutcome,
}
