//! Job definitions for the translation orchestrator.
//!
//! This module defines the core job record types:
//!
//! - `TranslationJob`: one batch run of the pipeline over a dataset
//! - `JobStatus`: lifecycle state machine for a job
//! - `JobProgress`: per-job progress counters and timing
//! - `RowResult`: outcome of running the pipeline on one source row
//! - `JobUpdate`: partial-field update merged by the record store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::parser::Recommendation;
use crate::prompts::AgentPromptSet;

/// Lifecycle status of a translation job.
///
/// Created in `pending`; `in_progress` while the row loop runs; terminal
/// states are `completed`, `failed` (an orchestrator-level error, not a
/// per-row error), and `cancelled`. Terminal jobs are immutable except for
/// deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Returns whether the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::InProgress => write!(f, "in_progress"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Progress counters for a job.
///
/// `total` equals the source dataset's row count at creation and never
/// changes; `current` is monotonically non-decreasing while the job runs and
/// always equals the number of collected results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub current: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl JobProgress {
    pub fn new(total: usize) -> Self {
        Self {
            current: 0,
            total,
            start_time: None,
            end_time: None,
        }
    }
}

/// Outcome of running the four-stage pipeline on one source row.
///
/// Created exactly once per row, either by successful pipeline completion or
/// by the error-fallback path; never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowResult {
    /// 0-based position of the row in the source dataset.
    pub row_index: usize,
    pub original_text: String,
    pub translated_text: String,
    /// Quality score of the forward translation (0-100).
    pub forward_quality_score: u8,
    /// Full evaluator response, stored verbatim.
    pub evaluator_feedback: String,
    pub back_translation: String,
    /// Final quality score from the comparison stage (0-100).
    pub final_quality_score: u8,
    /// Full comparator response, stored verbatim.
    pub comparator_feedback: String,
    pub recommendation: Recommendation,
}

impl RowResult {
    /// Builds the synthetic result recorded when any pipeline stage fails
    /// for a row. The job continues past it.
    pub fn error_fallback(
        row_index: usize,
        original_text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row_index,
            original_text: original_text.into(),
            translated_text: "ERROR".to_string(),
            forward_quality_score: 0,
            evaluator_feedback: message.into(),
            back_translation: String::new(),
            final_quality_score: 0,
            comparator_feedback: String::new(),
            recommendation: Recommendation::Revise,
        }
    }

    /// Returns whether this is an error-fallback result.
    pub fn is_error(&self) -> bool {
        self.translated_text == "ERROR"
    }
}

/// One batch run of the translation pipeline over a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJob {
    pub id: String,
    pub source_dataset_id: String,
    pub source_dataset_name: String,
    /// Dataset produced by `save_as_dataset`, once saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dataset_id: Option<String>,
    /// Target language code from the supported-language list.
    pub target_language: String,
    /// Free-text instructions appended into every agent prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
    /// Prompt templates frozen at job creation.
    pub prompts: AgentPromptSet,
    pub status: JobStatus,
    pub progress: JobProgress,
    /// Per-row results, in strictly increasing `row_index` order.
    pub results: Vec<RowResult>,
    /// Orchestrator-level error message for failed jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranslationJob {
    /// Creates a new pending job for a dataset with `total` rows.
    pub fn new(
        source_dataset_id: impl Into<String>,
        source_dataset_name: impl Into<String>,
        target_language: impl Into<String>,
        total: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            source_dataset_id: source_dataset_id.into(),
            source_dataset_name: source_dataset_name.into(),
            output_dataset_id: None,
            target_language: target_language.into(),
            custom_instructions: None,
            prompts: AgentPromptSet::default(),
            status: JobStatus::Pending,
            progress: JobProgress::new(total),
            results: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the custom instructions.
    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }

    /// Sets the frozen prompt set.
    pub fn with_prompts(mut self, prompts: AgentPromptSet) -> Self {
        self.prompts = prompts;
        self
    }
}

/// Partial update applied to a stored job.
///
/// Only fields that are `Some` are merged; the store refreshes `updated_at`
/// on every merge.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub current: Option<usize>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub results: Option<Vec<RowResult>>,
    pub error: Option<String>,
    pub output_dataset_id: Option<String>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn current(mut self, current: usize) -> Self {
        self.current = Some(current);
        self
    }

    pub fn start_time(mut self, time: DateTime<Utc>) -> Self {
        self.start_time = Some(time);
        self
    }

    pub fn end_time(mut self, time: DateTime<Utc>) -> Self {
        self.end_time = Some(time);
        self
    }

    pub fn results(mut self, results: Vec<RowResult>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn output_dataset_id(mut self, id: impl Into<String>) -> Self {
        self.output_dataset_id = Some(id.into());
        self
    }

    /// Merges this update into a job record and refreshes `updated_at`.
    pub fn apply(self, job: &mut TranslationJob) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(current) = self.current {
            job.progress.current = current;
        }
        if let Some(start_time) = self.start_time {
            job.progress.start_time = Some(start_time);
        }
        if let Some(end_time) = self.end_time {
            job.progress.end_time = Some(end_time);
        }
        if let Some(results) = self.results {
            job.results = results;
        }
        if let Some(error) = self.error {
            job.error = Some(error);
        }
        if let Some(output_dataset_id) = self.output_dataset_id {
            job.output_dataset_id = Some(output_dataset_id);
        }
        job.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_display() {
        assert_eq!(format!("{}", JobStatus::Pending), "pending");
        assert_eq!(format!("{}", JobStatus::InProgress), "in_progress");
        assert_eq!(format!("{}", JobStatus::Completed), "completed");
        assert_eq!(format!("{}", JobStatus::Failed), "failed");
        assert_eq!(format!("{}", JobStatus::Cancelled), "cancelled");
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_job_new() {
        let job = TranslationJob::new("ds-1", "crisis-texts", "ko", 10);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress.current, 0);
        assert_eq!(job.progress.total, 10);
        assert!(job.results.is_empty());
        assert!(job.error.is_none());
        assert!(!job.id.is_empty());
    }

    #[test]
    fn test_error_fallback_shape() {
        let result = RowResult::error_fallback(5, "original", "Rate limited: quota");
        assert_eq!(result.row_index, 5);
        assert_eq!(result.translated_text, "ERROR");
        assert_eq!(result.forward_quality_score, 0);
        assert_eq!(result.final_quality_score, 0);
        assert_eq!(result.evaluator_feedback, "Rate limited: quota");
        assert_eq!(result.back_translation, "");
        assert_eq!(result.comparator_feedback, "");
        assert_eq!(result.recommendation, Recommendation::Revise);
        assert!(result.is_error());
    }

    #[test]
    fn test_job_update_merge() {
        let mut job = TranslationJob::new("ds-1", "set", "es", 3);
        let before = job.updated_at;

        let result = RowResult::error_fallback(0, "a", "boom");
        JobUpdate::new()
            .status(JobStatus::InProgress)
            .current(1)
            .results(vec![result])
            .apply(&mut job);

        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.progress.current, 1);
        assert_eq!(job.results.len(), 1);
        // Untouched fields stay
        assert_eq!(job.progress.total, 3);
        assert!(job.error.is_none());
        assert!(job.updated_at >= before);
    }

    #[test]
    fn test_job_serialization() {
        let job = TranslationJob::new("ds-1", "set", "fr", 2).with_custom_instructions("be formal");
        let json = serde_json::to_string(&job).expect("serialization should work");
        assert!(json.contains("\"status\":\"pending\""));

        let parsed: TranslationJob = serde_json::from_str(&json).expect("deserialization");
        assert_eq!(parsed.id, job.id);
        assert_eq!(parsed.custom_instructions.as_deref(), Some("be formal"));
        assert_eq!(parsed.progress.total, 2);
    }
}
