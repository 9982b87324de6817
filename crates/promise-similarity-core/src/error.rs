//! Error types and exit codes for promise-similarity
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (I/O, network, tagger subprocess)
//! - 2: Usage or configuration error (bad flags, invalid selection policy)
//! - 3: Data error (misaligned lemmas, empty input, malformed corpus rows,
//!   cached artifacts that no longer match the corpus)

mod macros;

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the promise-similarity binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage or configuration error (2)
    Usage = 2,
    /// Data error (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur while running the pipeline
#[derive(Error, Debug)]
pub enum PromiseError {
    // Usage errors (exit code 2)
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    // Data errors (exit code 3)
    #[error("no documents to compare")]
    EmptyInput,

    #[error("lemma count mismatch: {promises} promises but {lemmas} lemma sequences")]
    Alignment { promises: usize, lemmas: usize },

    #[error("invalid record at row {row} in {path:?}: {reason}")]
    InvalidRecord {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("stale artifact {path:?}: {reason}")]
    StaleArtifact { path: PathBuf, reason: String },

    // Generic failures (exit code 1)
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("tagger failed: {0}")]
    Tagger(String),

    #[error("failed to {operation} {target}: {reason}")]
    FailedOperationWithTarget {
        operation: String,
        target: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl PromiseError {
    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        PromiseError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for a failed IO operation on a path
    pub fn io_operation(
        operation: &str,
        path: impl std::fmt::Display,
        error: impl std::fmt::Display,
    ) -> Self {
        PromiseError::FailedOperationWithTarget {
            operation: operation.to_string(),
            target: path.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for a failed download
    pub fn download(url: &str, error: impl std::fmt::Display) -> Self {
        PromiseError::Download {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            PromiseError::Configuration(_)
            | PromiseError::UsageError(_)
            | PromiseError::InvalidValue { .. } => ExitCode::Usage,

            PromiseError::EmptyInput
            | PromiseError::Alignment { .. }
            | PromiseError::InvalidRecord { .. }
            | PromiseError::StaleArtifact { .. } => ExitCode::Data,

            PromiseError::Download { .. }
            | PromiseError::Tagger(_)
            | PromiseError::FailedOperationWithTarget { .. }
            | PromiseError::Io(_)
            | PromiseError::Json(_)
            | PromiseError::Csv(_)
            | PromiseError::Toml(_)
            | PromiseError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            PromiseError::Configuration(_) => "configuration_error",
            PromiseError::UsageError(_) => "usage_error",
            PromiseError::InvalidValue { .. } => "invalid_value",
            PromiseError::EmptyInput => "empty_input",
            PromiseError::Alignment { .. } => "alignment_error",
            PromiseError::InvalidRecord { .. } => "invalid_record",
            PromiseError::StaleArtifact { .. } => "stale_artifact",
            PromiseError::Download { .. } => "download_error",
            PromiseError::Tagger(_) => "tagger_error",
            PromiseError::FailedOperationWithTarget { .. } => "failed_operation_with_target",
            PromiseError::Io(_) => "io_error",
            PromiseError::Json(_) => "json_error",
            PromiseError::Csv(_) => "csv_error",
            PromiseError::Toml(_) => "toml_error",
            PromiseError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        let mut error_obj = serde_json::json!({
            "code": self.exit_code() as i32,
            "type": self.error_type(),
            "message": self.to_string(),
        });

        if let PromiseError::Alignment { promises, lemmas } = self {
            error_obj["promises"] = serde_json::json!(promises);
            error_obj["lemmas"] = serde_json::json!(lemmas);
        }

        serde_json::json!({ "error": error_obj })
    }
}

/// Result type alias for promise-similarity operations
pub type Result<T> = std::result::Result<T, PromiseError>;
