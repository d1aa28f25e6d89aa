//! Error types for the guardrail run.

use thiserror::Error;

/// Result type alias for guardrail operations
pub type Result<T> = std::result::Result<T, GuardrailError>;

/// Errors that abort a run before any evaluation verdict is reached.
#[derive(Error, Debug)]
pub enum GuardrailError {
    /// Failed to read an input file or write an output file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed rule configuration
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failed to serialize the alerts file
    #[error("Alert serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed transaction row
    #[error("Invalid transaction at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// The CSV header lacks a required column
    #[error("Transaction CSV is missing required column '{name}'")]
    MissingColumn { name: String },

    /// Two rules declare the same scope
    #[error("Duplicate rule scope '{scope}' in config")]
    DuplicateScope { scope: String },

    /// Bad command line
    #[error("{message}. Usage: budget-guardrails <transactions.csv> <rules.yml> [--out-dir DIR] [--as-of YYYY-MM-DD] [--skip-malformed]")]
    Usage { message: String },
}
