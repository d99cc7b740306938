//! Error types for de_explorer

use thiserror::Error;

/// Main error type for report operations
#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Invalid count matrix: {reason}")]
    InvalidCountMatrix { reason: String },

    #[error("Invalid sample metadata: {reason}")]
    InvalidMetadata { reason: String },

    #[error("Invalid gene table: {reason}")]
    InvalidGeneTable { reason: String },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Computation failed in stage '{stage}': {reason}")]
    Computation { stage: String, reason: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ExplorerError {
    /// Wrap an arbitrary failure as a stage computation error
    pub fn computation(stage: &str, reason: impl std::fmt::Display) -> Self {
        ExplorerError::Computation {
            stage: stage.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for report operations
pub type Result<T> = std::result::Result<T, ExplorerError>;
