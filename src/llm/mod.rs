//! LLM client layer.
//!
//! Defines the [`LlmClient`] trait the pipeline depends on and the
//! [`GeminiClient`] implementation that talks to the Gemini generateContent
//! API with retry and exponential backoff.

mod gemini;

pub use gemini::{GeminiClient, LlmClient, DEFAULT_API_URL};
