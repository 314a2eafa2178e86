//! Error types for scanning, configuration and conversion.
//!
//! Language classification never produces one of these: an unreadable or
//! unrecognised file is reported as unresolved instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised outside the classifier.
#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown target language: {0}")]
    UnknownLanguage(String),

    #[error("source file is not text: {0}")]
    NotText(PathBuf),

    #[error("output {output} is already produced by {claimed_by}")]
    OutputCollision { output: PathBuf, claimed_by: PathBuf },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model service returned an empty completion")]
    EmptyCompletion,

    #[error("giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl ConverterError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a failed model call is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConverterError::Http(_) => true,
            ConverterError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConverterError>;
