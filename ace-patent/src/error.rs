//! Error types for the PATENTMATCH adapter.

use ace_core::{ConfigError, PromptError};

/// Errors raised by the metrics calculator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("Invalid label '{label}': expected 'X' (match) or 'A' (no match)")]
    InvalidLabel { label: String },

    #[error("Invalid confidence {value}: expected a probability in [0, 1]")]
    InvalidConfidence { value: f64 },

    #[error("No runs have been snapshotted; nothing to aggregate")]
    EmptyHistory,
}

/// Top-level error type for the adapter.
#[derive(Debug, thiserror::Error)]
pub enum PatentError {
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Record parse error on line {line}: {message}")]
    RecordParse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PatentResult<T> = Result<T, PatentError>;
