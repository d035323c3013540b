//! The fixed extraction instruction and request assembly.

use crate::generation::{Attachment, ModelRequest};
use bytes::Bytes;

/// Instruction sent with every upload. The schema it describes is a request to the model,
/// nothing downstream checks the reply against it.
pub const EXTRACTION_PROMPT: &str = r#"
You are a data extraction specialist. Extract the following information:
1. Names of people/employees
2. Present days (attendance days)
3. Total days (total working days) or Absent (absent or absent days) or zero (0) if not present
Rules:
- Extract ALL names and their corresponding attendance data
- If data is in table format, extract from each row
- If data is handwritten/unstructured, identify patterns like "Name X/Y" or "Name X Y"
- Handle variations in handwriting and formatting
- Return ONLY valid JSON format
Required JSON format:
{
    "extracted_data": [
        {
            "name": "Person Name",
            "present_day": number,
            "total_day": number // or "absent_day": number
        }
    ]
}
If you cannot extract certain information, use null for missing values.
"#;

/// Separator between the instruction and the rendered sheet.
pub const SPREADSHEET_SEPARATOR: &str = "\n\nSpreadsheet data:\n";

/// Text-only request carrying the rendered sheet after the instruction.
pub fn spreadsheet_request(csv: &str) -> ModelRequest {
    ModelRequest::Text {
        prompt: format!("{EXTRACTION_PROMPT}{SPREADSHEET_SEPARATOR}{csv}"),
    }
}

/// Instruction plus the untouched document bytes.
pub fn document_request(data: Bytes, mime_type: &'static str) -> ModelRequest {
    ModelRequest::Document {
        prompt: EXTRACTION_PROMPT.to_string(),
        attachment: Attachment { data, mime_type },
    }
}
