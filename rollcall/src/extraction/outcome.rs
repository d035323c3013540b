use serde::Serialize;
use serde_json::Value;

/// What the model gave back: decoded JSON when it parses, otherwise the text itself.
///
/// Serializes untagged, so it lands in the response as either the JSON value or the string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutcome {
    Structured(Value),
    Raw(String),
}

impl ExtractionOutcome {
    /// Parse model output as JSON. Anything that does not parse is kept verbatim.
    pub fn decode(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => ExtractionOutcome::Structured(value),
            Err(e) => {
                tracing::debug!(error = %e, "Model reply is not JSON, returning raw text");
                ExtractionOutcome::Raw(text)
            }
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ExtractionOutcome::Structured(_))
    }
}
