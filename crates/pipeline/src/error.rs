//! Pipeline error types.

use catalog_core::AppError;
use thiserror::Error;

/// Fatal violation of the record structure; aborts the run for that record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Record must be a JSON object")]
    NotAMapping,

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("{key} must be a list{}", context(.owner))]
    NotASequence { key: String, owner: Option<String> },

    #[error("Element {index} of {key} must be an object{}", context(.owner))]
    ElementNotAMapping {
        key: String,
        index: usize,
        owner: Option<String>,
    },

    #[error("Element {index} of {key} has no usable {id_key}")]
    MissingEntityId {
        key: String,
        index: usize,
        id_key: String,
    },

    #[error("company_id must be a string or number")]
    InvalidCompanyId,

    #[error("Schema '{0}' declares no product level")]
    NoProductLevel(String),
}

fn context(owner: &Option<String>) -> String {
    owner
        .as_ref()
        .map(|id| format!(" (in {})", id))
        .unwrap_or_default()
}

impl From<StructuralError> for AppError {
    fn from(err: StructuralError) -> Self {
        AppError::Structural(err.to_string())
    }
}

/// Failure to render one chunk's text. Always contained to that chunk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Missing key {0}")]
    MissingKey(String),

    #[error("Template failure: {0}")]
    Template(String),
}
