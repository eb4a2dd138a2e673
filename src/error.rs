//! Error types for Ethoframe

use thiserror::Error;

use crate::schema::SchemaError;

/// Errors that can occur while converting or aggregating tables
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid bout: {0}")]
    InvalidBout(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing bodyparts: {}", .0.join(", "))]
    MissingBodyparts(Vec<String>),
}
