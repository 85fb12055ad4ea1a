//! Error handling
//!
//! Every error is scoped to the smallest unit that can fail on its own
//! (one run, one classifier variant, one evaluation). Stages report these
//! and move on; only `Exhausted` means a whole stage produced nothing.

use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    // Taxonomy errors
    #[error("Missing file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Schema validation failed for {context}: {reason}")]
    SchemaValidation { context: String, reason: String },

    #[error("Data alignment error for {context}: {reason}")]
    DataAlignment { context: String, reason: String },

    #[error("Computation failed for {context}: {reason}")]
    Computation { context: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Stage-wide failure
    #[error("No {stage} unit succeeded")]
    Exhausted { stage: String },

    // Wrapped library errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        PipelineError::MissingFile { path: path.into() }
    }

    pub fn schema(context: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::SchemaValidation {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn alignment(context: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::DataAlignment {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn computation(context: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Computation {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Short category name used in summaries and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MissingFile { .. } => "MissingFileError",
            PipelineError::SchemaValidation { .. } => "SchemaValidationError",
            PipelineError::DataAlignment { .. } => "DataAlignmentError",
            PipelineError::Computation { .. } => "ComputationError",
            PipelineError::InvalidConfig(_) => "InvalidConfig",
            PipelineError::Exhausted { .. } => "Exhausted",
            PipelineError::Io(_) => "IoError",
            PipelineError::Csv(_) => "CsvError",
            PipelineError::Json(_) => "JsonError",
        }
    }
}

impl From<validator::ValidationErrors> for PipelineError {
    fn from(err: validator::ValidationErrors) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}
