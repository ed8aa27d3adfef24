//! Parse-level validation of spec documents.
//!
//! A spec must be a structured JSON or YAML mapping before it is handed
//! to the generator. JSON is tried first so the detected format also
//! picks the staging file extension; nothing deeper than "is it a
//! mapping" is checked here.

use thiserror::Error;

use crate::types::SpecFormat;

/// The spec content is not a parseable structured document.
#[derive(Debug, Error)]
#[error("spec is not a structured YAML or JSON document: {message}")]
pub struct ValidationError {
    pub message: String,
}

/// Validate that `content` parses as a JSON or YAML mapping and report
/// which format matched.
pub fn validate_spec_document(content: &[u8]) -> Result<SpecFormat, ValidationError> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(content) {
        if value.is_object() {
            return Ok(SpecFormat::Json);
        }
        return Err(ValidationError {
            message: "top-level JSON value is not an object".to_string(),
        });
    }

    match serde_yaml::from_slice::<serde_yaml::Value>(content) {
        Ok(serde_yaml::Value::Mapping(_)) => Ok(SpecFormat::Yaml),
        Ok(_) => Err(ValidationError {
            message: "top-level YAML value is not a mapping".to_string(),
        }),
        Err(err) => Err(ValidationError {
            message: err.to_string(),
        }),
    }
}
