use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum DocDashError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid upload: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocDashError {
    /// Message suitable for showing to the user in place of the raw error chain.
    pub fn user_message(&self) -> String {
        match self {
            DocDashError::Validation(e) => e.to_string(),
            DocDashError::Summary(e) => e.to_string(),
            DocDashError::Api(e) if e.is_transient() => {
                format!("The document service is unavailable ({}). Please try again.", e)
            }
            DocDashError::Api(e) => {
                format!("The document service sent an unexpected response: {}", e)
            }
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Upload rejections raised before any request is sent.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file selected")]
    NoFile,

    #[error("Only one file can be uploaded at a time ({0} selected)")]
    TooManyFiles(usize),

    #[error("File '{filename}' is {size} bytes, the limit is {max} bytes")]
    TooLarge {
        filename: String,
        size: u64,
        max: u64,
    },

    #[error("File '{filename}' has unsupported type '{content_type}' (images, PDF and plain text are accepted)")]
    UnsupportedType {
        filename: String,
        content_type: String,
    },
}

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Task {0} is not in the task list")]
    NotFound(String),

    #[error("Task {id} cannot be summarized: {reason}")]
    NotEligible { id: String, reason: String },

    #[error("A summary for task {0} is already being generated")]
    InProgress(String),

    #[error("Summary generation failed: {source}")]
    Failed {
        id: String,
        #[source]
        source: ApiError,
    },
}

pub type Result<T> = std::result::Result<T, DocDashError>;
