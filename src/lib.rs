//! lingoforge: back-translation quality pipeline for translated datasets.
//!
//! This library runs a fixed four-agent pipeline (forward translation,
//! evaluation, back translation, comparison) over the rows of a tabular
//! dataset and collects quality-scored translation results per row.

// Core modules
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod job;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod storage;

// Re-export commonly used error types
pub use error::{DatasetError, JobError, LlmError, StoreError};
