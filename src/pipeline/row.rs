//! Four-stage row pipeline.
//!
//! One row flows through four dependent model calls in strict sequence:
//! forward translation, evaluation, back translation, comparison. Each later
//! stage's prompt embeds an earlier stage's output, so the stages cannot be
//! reordered or overlapped. All four stages always run; there is no early
//! exit on a low forward score. A failure in any stage aborts the row and
//! partial stage output is discarded.

use std::sync::Arc;

use crate::error::LlmError;
use crate::job::RowResult;
use crate::llm::LlmClient;
use crate::parser::{extract_recommendation, extract_score};
use crate::prompts::{fill_template, AgentPromptSet};

/// Per-job configuration consumed by the row pipeline.
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// Target language code (e.g., "ko").
    pub target_language: String,
    /// Optional free-text instructions spliced into every agent prompt.
    pub custom_instructions: Option<String>,
    /// Prompt templates frozen at job creation.
    pub prompts: AgentPromptSet,
}

impl TranslationConfig {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
            custom_instructions: None,
            prompts: AgentPromptSet::default(),
        }
    }

    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }

    pub fn with_prompts(mut self, prompts: AgentPromptSet) -> Self {
        self.prompts = prompts;
        self
    }
}

/// Runs the four-stage agent sequence for one row.
pub struct RowPipeline {
    client: Arc<dyn LlmClient>,
}

impl RowPipeline {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Transforms one source text into a [`RowResult`] via four model calls.
    ///
    /// The returned result carries `row_index = 0`; the orchestrator sets
    /// the real index when appending it to the job.
    pub async fn translate_row(
        &self,
        original_text: &str,
        config: &TranslationConfig,
    ) -> Result<RowResult, LlmError> {
        let custom_instructions = config.custom_instructions.as_deref().unwrap_or("");

        // Stage 1: forward translation
        tracing::debug!(stage = "forward", "Running forward translation");
        let forward_prompt = fill_template(
            &config.prompts.forward_translator,
            &[
                ("targetLanguage", config.target_language.as_str()),
                ("text", original_text),
                ("customInstructions", custom_instructions),
            ],
        );
        let translated_text = self.client.generate_text(&forward_prompt).await?;

        // Stage 2: evaluate the forward translation
        tracing::debug!(stage = "evaluate", "Scoring forward translation");
        let evaluator_prompt = fill_template(
            &config.prompts.evaluator,
            &[
                ("targetLanguage", config.target_language.as_str()),
                ("originalText", original_text),
                ("translatedText", translated_text.as_str()),
                ("customInstructions", custom_instructions),
            ],
        );
        let evaluator_feedback = self.client.generate_text(&evaluator_prompt).await?;
        let forward_quality_score = extract_score(&evaluator_feedback);

        // Stage 3: back translation
        tracing::debug!(stage = "backward", "Running back translation");
        let backward_prompt = fill_template(
            &config.prompts.backward_translator,
            &[
                ("targetLanguage", config.target_language.as_str()),
                ("translatedText", translated_text.as_str()),
            ],
        );
        let back_translation = self.client.generate_text(&backward_prompt).await?;

        // Stage 4: compare and decide
        tracing::debug!(stage = "compare", "Running final comparison");
        let forward_score_text = forward_quality_score.to_string();
        let comparator_prompt = fill_template(
            &config.prompts.comparator,
            &[
                ("targetLanguage", config.target_language.as_str()),
                ("originalText", original_text),
                ("backTranslation", back_translation.as_str()),
                ("forwardScore", forward_score_text.as_str()),
                ("evaluatorFeedback", evaluator_feedback.as_str()),
                ("customInstructions", custom_instructions),
            ],
        );
        let comparator_feedback = self.client.generate_text(&comparator_prompt).await?;
        let final_quality_score = extract_score(&comparator_feedback);
        let recommendation = extract_recommendation(&comparator_feedback);

        tracing::info!(
            forward_score = forward_quality_score,
            final_score = final_quality_score,
            recommendation = %recommendation,
            "Row pipeline complete"
        );

        Ok(RowResult {
            row_index: 0,
            original_text: original_text.to_string(),
            translated_text,
            forward_quality_score,
            evaluator_feedback,
            back_translation,
            final_quality_score,
            comparator_feedback,
            recommendation,
        })
    }
}
