//! Error types for lingoforge operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions (transport, rate limiting, response format)
//! - Record store persistence
//! - Dataset access and column resolution
//! - Job lifecycle and orchestration

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: GEMINI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Unexpected response format: {0}")]
    FormatError(String),
}

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while reading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("No text column found in dataset")]
    NoTextColumn,

    #[error("Dataset is empty")]
    EmptyDataset,
}

/// Errors that can occur during job lifecycle operations.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job '{0}' not found")]
    JobNotFound(String),

    #[error("Job '{0}' is already running")]
    AlreadyRunning(String),

    #[error("Job '{0}' is not completed")]
    JobNotComplete(String),

    #[error("Dataset '{0}' not found")]
    DatasetNotFound(String),

    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}
