//! Job orchestrator for batch translation runs.
//!
//! Drives the row pipeline across every row of a dataset, one row at a
//! time, persisting a self-consistent snapshot after each row and honoring
//! cooperative cancellation at row boundaries. The cancellation registry is
//! owned by the orchestrator instance, so independent orchestrators (e.g.,
//! in tests) never interfere with each other.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::config;
use crate::dataset::{Column, ColumnType, Dataset};
use crate::error::JobError;
use crate::job::{JobStatus, JobUpdate, RowResult, TranslationJob};
use crate::llm::LlmClient;
use crate::prompts::{AgentPromptOverrides, AgentPromptSet};
use crate::storage::RecordStore;

use super::row::{RowPipeline, TranslationConfig};

/// Handle to a running job's background task.
///
/// Returned by [`JobOrchestrator::start`] immediately; the row loop runs on
/// its own tokio task and persists every step through the record store, so
/// dropping the handle does not stop the job.
#[derive(Debug)]
pub struct JobHandle {
    job_id: String,
    handle: JoinHandle<()>,
}

impl JobHandle {
    /// Id of the job this handle tracks.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Waits for the job's task to finish (completed, cancelled, or
    /// failed); the final state is in the job record.
    pub async fn wait(self) {
        let _ = self.handle.await;
    }
}

/// Coordinates translation jobs: creation, execution, cancellation, and
/// projection of completed jobs into output datasets.
pub struct JobOrchestrator {
    store: Arc<dyn RecordStore>,
    client: Arc<dyn LlmClient>,
    /// Cancellation flags for currently running jobs, keyed by job id.
    active: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,
}

impl JobOrchestrator {
    /// Creates an orchestrator over the given store and LLM client.
    pub fn new(store: Arc<dyn RecordStore>, client: Arc<dyn LlmClient>) -> Self {
        Self {
            store,
            client,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates a new pending job for a dataset.
    ///
    /// Validates the target language against the supported list, requires a
    /// non-empty dataset, and freezes the prompt set (defaults plus any
    /// overrides) into the job record.
    pub async fn create_job(
        &self,
        dataset_id: &str,
        target_language: &str,
        custom_instructions: Option<String>,
        prompt_overrides: Option<AgentPromptOverrides>,
    ) -> Result<TranslationJob, JobError> {
        if !config::is_supported(target_language) {
            return Err(JobError::UnsupportedLanguage(target_language.to_string()));
        }

        let dataset = self
            .store
            .get_dataset(dataset_id)
            .await?
            .ok_or_else(|| JobError::DatasetNotFound(dataset_id.to_string()))?;

        if dataset.rows.is_empty() {
            return Err(crate::error::DatasetError::EmptyDataset.into());
        }

        let prompts = match prompt_overrides {
            Some(overrides) => AgentPromptSet::with_overrides(overrides),
            None => AgentPromptSet::default(),
        };

        let mut job = TranslationJob::new(
            &dataset.id,
            &dataset.name,
            target_language,
            dataset.rows.len(),
        )
        .with_prompts(prompts);
        if let Some(instructions) = custom_instructions {
            job = job.with_custom_instructions(instructions);
        }

        self.store.save_job(&job).await?;
        tracing::info!(
            job_id = %job.id,
            dataset = %dataset.name,
            language = target_language,
            rows = job.progress.total,
            "Created translation job"
        );
        Ok(job)
    }

    /// Starts a job's row loop on a background task.
    ///
    /// Fails with `AlreadyRunning` if the job is in progress. The job id is
    /// reserved in the cancellation registry before any further await, so
    /// two concurrent `start` calls on the same job can never both spawn a
    /// row loop. Precondition failures (missing dataset, no usable text
    /// column) persist the job as `failed`, release the reservation, and
    /// return the error. Otherwise transitions the job to `in_progress` and
    /// returns a [`JobHandle`] without waiting for completion.
    pub async fn start(&self, job_id: &str) -> Result<JobHandle, JobError> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| JobError::JobNotFound(job_id.to_string()))?;

        if job.status == JobStatus::InProgress {
            return Err(JobError::AlreadyRunning(job_id.to_string()));
        }

        let cancel = Arc::new(AtomicBool::new(false));
        {
            let mut active = self
                .active
                .lock()
                .expect("cancellation registry lock poisoned");
            match active.entry(job_id.to_string()) {
                Entry::Occupied(_) => {
                    return Err(JobError::AlreadyRunning(job_id.to_string()));
                }
                Entry::Vacant(slot) => {
                    slot.insert(cancel.clone());
                }
            }
        }

        let (dataset, column) = match self.prepare_start(&job).await {
            Ok(prepared) => prepared,
            Err(err) => {
                self.active
                    .lock()
                    .expect("cancellation registry lock poisoned")
                    .remove(job_id);
                return Err(err);
            }
        };

        tracing::info!(job_id = %job_id, rows = dataset.rows.len(), "Starting translation job");

        let store = Arc::clone(&self.store);
        let client = Arc::clone(&self.client);
        let active = Arc::clone(&self.active);
        let task_job_id = job_id.to_string();

        let handle = tokio::spawn(async move {
            let outcome =
                run_row_loop(Arc::clone(&store), client, &job, dataset, column, cancel).await;

            if let Err(err) = outcome {
                tracing::error!(job_id = %task_job_id, error = %err, "Translation job failed");
                let update = JobUpdate::new()
                    .status(JobStatus::Failed)
                    .error(err.to_string())
                    .end_time(Utc::now());
                if let Err(store_err) = store.update_job(&task_job_id, update).await {
                    tracing::error!(
                        job_id = %task_job_id,
                        error = %store_err,
                        "Failed to persist job failure"
                    );
                }
            }

            active
                .lock()
                .expect("cancellation registry lock poisoned")
                .remove(&task_job_id);
        });

        Ok(JobHandle {
            job_id: job_id.to_string(),
            handle,
        })
    }

    /// Signals cancellation for a running job.
    ///
    /// Cooperative: takes effect at the next row boundary; the in-flight
    /// row's model calls are allowed to finish. Returns `false` (no-op) if
    /// the job is not currently running.
    pub fn cancel(&self, job_id: &str) -> bool {
        let active = self
            .active
            .lock()
            .expect("cancellation registry lock poisoned");
        match active.get(job_id) {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                tracing::info!(job_id = %job_id, "Cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Fetches a job record.
    pub async fn get_job(&self, job_id: &str) -> Result<Option<TranslationJob>, JobError> {
        Ok(self.store.get_job(job_id).await?)
    }

    /// Lists all job records.
    pub async fn list_jobs(&self) -> Result<Vec<TranslationJob>, JobError> {
        Ok(self.store.list_jobs().await?)
    }

    /// Deletes a job record, cancelling it first if it is running.
    pub async fn delete_job(&self, job_id: &str) -> Result<(), JobError> {
        self.cancel(job_id);
        Ok(self.store.delete_job(job_id).await?)
    }

    /// Projects a completed job into a new dataset record.
    ///
    /// Appends one column per pipeline output (translated text, both
    /// scores, back translation, recommendation) to the source columns and
    /// zips each row result with its source row. Pure transform; no
    /// pipeline involvement. Fails with `JobNotComplete` unless the job
    /// status is `completed`.
    pub async fn save_as_dataset(
        &self,
        job_id: &str,
        name: Option<String>,
    ) -> Result<Dataset, JobError> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| JobError::JobNotFound(job_id.to_string()))?;

        if job.status != JobStatus::Completed {
            return Err(JobError::JobNotComplete(job_id.to_string()));
        }

        let source = self
            .store
            .get_dataset(&job.source_dataset_id)
            .await?
            .ok_or_else(|| JobError::DatasetNotFound(job.source_dataset_id.clone()))?;

        let text_column = source.text_column()?.clone();
        let translated_column = format!("{}_translated", text_column.name);

        let rows = job
            .results
            .iter()
            .map(|result| {
                let mut row = source
                    .rows
                    .get(result.row_index)
                    .cloned()
                    .unwrap_or_default();
                row.insert(
                    translated_column.clone(),
                    Value::String(result.translated_text.clone()),
                );
                row.insert(
                    "forward_quality_score".to_string(),
                    json!(result.forward_quality_score),
                );
                row.insert(
                    "back_translation".to_string(),
                    Value::String(result.back_translation.clone()),
                );
                row.insert(
                    "final_quality_score".to_string(),
                    json!(result.final_quality_score),
                );
                row.insert(
                    "recommendation".to_string(),
                    Value::String(result.recommendation.to_string()),
                );
                row
            })
            .collect();

        let mut columns = source.columns.clone();
        columns.push(Column::new(translated_column, ColumnType::Text));
        columns.push(Column::new("forward_quality_score", ColumnType::Text));
        columns.push(Column::new("back_translation", ColumnType::Text));
        columns.push(Column::new("final_quality_score", ColumnType::Text));
        columns.push(Column::new("recommendation", ColumnType::Text));

        let dataset_name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{} - {}", job.source_dataset_name, job.target_language));

        let output = Dataset::new(dataset_name, columns, rows)
            .with_source_type("translation")
            .with_source_job(&job.id);

        self.store.save_dataset(&output).await?;
        self.store
            .update_job(job_id, JobUpdate::new().output_dataset_id(&output.id))
            .await?;

        tracing::info!(
            job_id = %job_id,
            dataset_id = %output.id,
            rows = output.metadata.row_count,
            "Saved job results as dataset"
        );
        Ok(output)
    }

    /// Resolves the dataset and text column for a reserved job and
    /// transitions it to `in_progress`.
    ///
    /// Precondition failures persist the job as `failed` before returning;
    /// the caller releases the registry reservation on any error.
    async fn prepare_start(&self, job: &TranslationJob) -> Result<(Dataset, Column), JobError> {
        let dataset = match self.store.get_dataset(&job.source_dataset_id).await? {
            Some(dataset) => dataset,
            None => {
                let err = JobError::DatasetNotFound(job.source_dataset_id.clone());
                self.mark_failed(&job.id, &err).await?;
                return Err(err);
            }
        };

        let column = match dataset.text_column() {
            Ok(column) => column.clone(),
            Err(dataset_err) => {
                let err = JobError::from(dataset_err);
                self.mark_failed(&job.id, &err).await?;
                return Err(err);
            }
        };

        self.store
            .update_job(
                &job.id,
                JobUpdate::new()
                    .status(JobStatus::InProgress)
                    .start_time(Utc::now()),
            )
            .await?;

        Ok((dataset, column))
    }

    /// Persists a job-level precondition failure.
    async fn mark_failed(&self, job_id: &str, err: &JobError) -> Result<(), JobError> {
        self.store
            .update_job(
                job_id,
                JobUpdate::new()
                    .status(JobStatus::Failed)
                    .error(err.to_string())
                    .end_time(Utc::now()),
            )
            .await?;
        Ok(())
    }
}

/// Sequential row loop for one job.
///
/// Rows are processed strictly in index order; every persisted snapshot
/// keeps `results.len() == progress.current` with a monotonically
/// non-decreasing `current`. A row failure records an error-fallback result
/// and the loop continues; only store-write failures abort the job.
async fn run_row_loop(
    store: Arc<dyn RecordStore>,
    client: Arc<dyn LlmClient>,
    job: &TranslationJob,
    dataset: Dataset,
    column: Column,
    cancel: Arc<AtomicBool>,
) -> Result<(), JobError> {
    let mut translation_config =
        TranslationConfig::new(&job.target_language).with_prompts(job.prompts.clone());
    if let Some(instructions) = &job.custom_instructions {
        translation_config = translation_config.with_custom_instructions(instructions);
    }

    let pipeline = RowPipeline::new(client);
    let total = dataset.rows.len();
    let mut results: Vec<RowResult> = Vec::with_capacity(total);

    for (index, row) in dataset.rows.iter().enumerate() {
        // Cooperative cancellation, checked only at row boundaries.
        if cancel.load(Ordering::Acquire) {
            store
                .update_job(
                    &job.id,
                    JobUpdate::new()
                        .status(JobStatus::Cancelled)
                        .current(index)
                        .end_time(Utc::now())
                        .results(results),
                )
                .await?;
            tracing::info!(job_id = %job.id, completed_rows = index, "Job cancelled");
            return Ok(());
        }

        let original_text = Dataset::row_text(row, &column);
        tracing::info!(job_id = %job.id, row = index + 1, total, "Processing row");

        match pipeline
            .translate_row(&original_text, &translation_config)
            .await
        {
            Ok(mut result) => {
                result.row_index = index;
                results.push(result);
            }
            Err(err) => {
                // A single row's failure never aborts the job.
                tracing::warn!(
                    job_id = %job.id,
                    row = index,
                    error = %err,
                    "Row pipeline failed, recording error result"
                );
                results.push(RowResult::error_fallback(
                    index,
                    original_text,
                    err.to_string(),
                ));
            }
        }

        store
            .update_job(
                &job.id,
                JobUpdate::new().current(index + 1).results(results.clone()),
            )
            .await?;
    }

    store
        .update_job(
            &job.id,
            JobUpdate::new()
                .status(JobStatus::Completed)
                .current(total)
                .end_time(Utc::now()),
        )
        .await?;
    tracing::info!(job_id = %job.id, rows = total, "Job completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{detect_column_types, Row};
    use crate::error::{DatasetError, LlmError, StoreError};
    use crate::parser::Recommendation;
    use crate::pipeline::row::tests::ScriptedClient;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    /// Four stage responses for one successful row.
    fn row_responses(translation: &str, score: u8) -> Vec<Result<String, LlmError>> {
        vec![
            Ok(translation.to_string()),
            Ok(format!("Looks good.\nScore: {score}")),
            Ok(format!("{translation} (back)")),
            Ok(format!("Score: {score}\nRecommendation: ACCEPT")),
        ]
    }

    fn sample_dataset(texts: &[&str]) -> Dataset {
        let columns = detect_column_types(&["prompt".to_string(), "label".to_string()]);
        let rows = texts
            .iter()
            .map(|text| {
                let mut row = Row::new();
                row.insert("prompt".to_string(), json!(text));
                row.insert("label".to_string(), json!("low_risk"));
                row
            })
            .collect();
        Dataset::new("sample", columns, rows)
    }

    async fn orchestrator_with(
        texts: &[&str],
        responses: Vec<Result<String, LlmError>>,
    ) -> (Arc<JobOrchestrator>, Arc<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let dataset = sample_dataset(texts);
        store.save_dataset(&dataset).await.unwrap();
        let client = Arc::new(ScriptedClient::new(responses));
        let orchestrator = Arc::new(JobOrchestrator::new(store.clone(), client));
        (orchestrator, store, dataset.id)
    }

    #[tokio::test]
    async fn test_end_to_end_two_rows() {
        let mut responses = row_responses("uno", 90);
        responses.extend(row_responses("dos", 85));
        let (orchestrator, _store, dataset_id) =
            orchestrator_with(&["one", "two"], responses).await;

        let job = orchestrator
            .create_job(&dataset_id, "es", None, None)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress.total, 2);

        let handle = orchestrator.start(&job.id).await.unwrap();
        handle.wait().await;

        let finished = orchestrator.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Completed);
        assert_eq!(finished.progress.current, 2);
        assert_eq!(finished.results.len(), 2);
        assert!(finished.progress.start_time.is_some());
        assert!(finished.progress.end_time.is_some());

        assert_eq!(finished.results[0].row_index, 0);
        assert_eq!(finished.results[0].original_text, "one");
        assert_eq!(finished.results[0].translated_text, "uno");
        assert_eq!(finished.results[0].forward_quality_score, 90);
        assert_eq!(finished.results[1].row_index, 1);
        assert_eq!(finished.results[1].translated_text, "dos");
    }

    #[tokio::test]
    async fn test_row_failure_does_not_abort_job() {
        // Row 0 succeeds, row 1 fails on its first stage, row 2 succeeds.
        let mut responses = row_responses("a", 80);
        responses.push(Err(LlmError::ApiError {
            code: 400,
            message: "bad request".to_string(),
        }));
        responses.extend(row_responses("c", 75));
        let (orchestrator, _store, dataset_id) =
            orchestrator_with(&["r0", "r1", "r2"], responses).await;

        let job = orchestrator
            .create_job(&dataset_id, "es", None, None)
            .await
            .unwrap();
        orchestrator.start(&job.id).await.unwrap().wait().await;

        let finished = orchestrator.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Completed);
        assert_eq!(finished.results.len(), 3);

        let failed = &finished.results[1];
        assert_eq!(failed.row_index, 1);
        assert_eq!(failed.translated_text, "ERROR");
        assert_eq!(failed.forward_quality_score, 0);
        assert_eq!(failed.final_quality_score, 0);
        assert!(failed.evaluator_feedback.contains("400"));
        assert_eq!(failed.recommendation, Recommendation::Revise);

        // Neighbors are unaffected
        assert_eq!(finished.results[0].translated_text, "a");
        assert_eq!(finished.results[2].translated_text, "c");
    }

    /// Client that requests cancellation after a fixed number of calls.
    struct CancellingClient {
        calls: AtomicUsize,
        cancel_after: usize,
        target: StdMutex<Option<(Arc<JobOrchestrator>, String)>>,
    }

    impl CancellingClient {
        fn new(cancel_after: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                cancel_after,
                target: StdMutex::new(None),
            }
        }

        fn arm(&self, orchestrator: Arc<JobOrchestrator>, job_id: String) {
            *self.target.lock().unwrap() = Some((orchestrator, job_id));
        }
    }

    #[async_trait]
    impl LlmClient for CancellingClient {
        async fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.cancel_after {
                if let Some((orchestrator, job_id)) = self.target.lock().unwrap().as_ref() {
                    orchestrator.cancel(job_id);
                }
            }
            Ok("texto\nScore: 80\nRecommendation: ACCEPT".to_string())
        }
    }

    #[tokio::test]
    async fn test_cancellation_at_row_boundary() {
        let store = Arc::new(MemoryStore::new());
        let texts: Vec<String> = (0..10).map(|i| format!("row {i}")).collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let dataset = sample_dataset(&text_refs);
        store.save_dataset(&dataset).await.unwrap();

        // Cancel during row 3's final stage call (4 calls per row); the
        // in-flight row finishes and the flag is observed before row 4.
        let client = Arc::new(CancellingClient::new(12));
        let orchestrator = Arc::new(JobOrchestrator::new(store.clone(), client.clone()));

        let job = orchestrator
            .create_job(&dataset.id, "ko", None, None)
            .await
            .unwrap();
        client.arm(orchestrator.clone(), job.id.clone());

        orchestrator.start(&job.id).await.unwrap().wait().await;

        let finished = orchestrator.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Cancelled);
        assert_eq!(finished.progress.current, 3);
        assert_eq!(finished.results.len(), 3);
        assert!(finished.progress.end_time.is_some());
        // Exactly 12 calls: rows 4..9 were never attempted
        assert_eq!(client.calls.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_cancel_not_running_is_noop() {
        let (orchestrator, _store, dataset_id) = orchestrator_with(&["x"], vec![]).await;
        let job = orchestrator
            .create_job(&dataset_id, "fr", None, None)
            .await
            .unwrap();
        assert!(!orchestrator.cancel(&job.id));
        assert!(!orchestrator.cancel("no-such-job"));
    }

    #[tokio::test]
    async fn test_start_already_running_guarded() {
        let (orchestrator, store, dataset_id) = orchestrator_with(&["x"], vec![]).await;
        let job = orchestrator
            .create_job(&dataset_id, "de", None, None)
            .await
            .unwrap();
        store
            .update_job(&job.id, JobUpdate::new().status(JobStatus::InProgress))
            .await
            .unwrap();

        let err = orchestrator.start(&job.id).await.unwrap_err();
        assert!(matches!(err, JobError::AlreadyRunning(_)));
    }

    /// Store that keeps reporting `pending` from `get_job`, hiding the
    /// persisted `in_progress` transition from callers.
    struct PendingMaskStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl RecordStore for PendingMaskStore {
        async fn save_job(&self, job: &TranslationJob) -> Result<(), StoreError> {
            self.inner.save_job(job).await
        }

        async fn get_job(&self, id: &str) -> Result<Option<TranslationJob>, StoreError> {
            Ok(self.inner.get_job(id).await?.map(|mut job| {
                job.status = JobStatus::Pending;
                job
            }))
        }

        async fn list_jobs(&self) -> Result<Vec<TranslationJob>, StoreError> {
            self.inner.list_jobs().await
        }

        async fn update_job(&self, id: &str, update: JobUpdate) -> Result<(), StoreError> {
            self.inner.update_job(id, update).await
        }

        async fn delete_job(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete_job(id).await
        }

        async fn save_dataset(&self, dataset: &Dataset) -> Result<(), StoreError> {
            self.inner.save_dataset(dataset).await
        }

        async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, StoreError> {
            self.inner.get_dataset(id).await
        }

        async fn list_datasets(&self) -> Result<Vec<Dataset>, StoreError> {
            self.inner.list_datasets().await
        }

        async fn delete_dataset(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete_dataset(id).await
        }
    }

    /// Client whose calls block until the test hands out permits.
    struct GatedClient {
        gate: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl LlmClient for GatedClient {
        async fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| LlmError::RequestFailed("gate closed".to_string()))?;
            permit.forget();
            Ok("hola\nScore: 80\nRecommendation: ACCEPT".to_string())
        }
    }

    #[tokio::test]
    async fn test_start_reservation_rejects_second_runner() {
        // The masked store never reports in_progress, so only the registry
        // reservation can stop a second row loop from spawning while the
        // first is still mid-row.
        let store = Arc::new(PendingMaskStore {
            inner: MemoryStore::new(),
        });
        let dataset = sample_dataset(&["one"]);
        store.save_dataset(&dataset).await.unwrap();

        let job = TranslationJob::new(&dataset.id, "sample", "ko", 1);
        store.save_job(&job).await.unwrap();

        let client = Arc::new(GatedClient {
            gate: tokio::sync::Semaphore::new(0),
        });
        let orchestrator = JobOrchestrator::new(store.clone(), client.clone());

        let handle = orchestrator.start(&job.id).await.unwrap();

        let err = orchestrator.start(&job.id).await.unwrap_err();
        assert!(matches!(err, JobError::AlreadyRunning(_)));

        client.gate.add_permits(4);
        handle.wait().await;

        let finished = store.inner.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Completed);
        assert_eq!(finished.results.len(), 1);

        // The reservation is released once the loop finishes
        client.gate.add_permits(4);
        orchestrator.start(&job.id).await.unwrap().wait().await;
    }

    #[tokio::test]
    async fn test_create_job_unsupported_language() {
        let (orchestrator, _store, dataset_id) = orchestrator_with(&["x"], vec![]).await;
        let err = orchestrator
            .create_job(&dataset_id, "tlh", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::UnsupportedLanguage(_)));
    }

    #[tokio::test]
    async fn test_create_job_missing_dataset() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(ScriptedClient::new(vec![]));
        let orchestrator = JobOrchestrator::new(store, client);
        let err = orchestrator
            .create_job("missing", "ko", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::DatasetNotFound(_)));
    }

    #[tokio::test]
    async fn test_create_job_empty_dataset() {
        let store = Arc::new(MemoryStore::new());
        let dataset = sample_dataset(&[]);
        store.save_dataset(&dataset).await.unwrap();
        let client = Arc::new(ScriptedClient::new(vec![]));
        let orchestrator = JobOrchestrator::new(store, client);

        let err = orchestrator
            .create_job(&dataset.id, "ko", None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Dataset(DatasetError::EmptyDataset)
        ));
    }

    #[tokio::test]
    async fn test_start_missing_dataset_marks_failed() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(ScriptedClient::new(vec![]));
        let orchestrator = JobOrchestrator::new(store.clone(), client);

        let job = TranslationJob::new("gone", "set", "ko", 2);
        store.save_job(&job).await.unwrap();

        let err = orchestrator.start(&job.id).await.unwrap_err();
        assert!(matches!(err, JobError::DatasetNotFound(_)));

        let stored = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert!(stored.error.is_some());
        assert!(stored.results.is_empty());
    }

    #[tokio::test]
    async fn test_start_no_text_column_marks_failed() {
        let store = Arc::new(MemoryStore::new());
        let dataset = Dataset::new("no-columns", vec![], vec![Row::new()]);
        store.save_dataset(&dataset).await.unwrap();

        let job = TranslationJob::new(&dataset.id, "no-columns", "ko", 1);
        store.save_job(&job).await.unwrap();

        let client = Arc::new(ScriptedClient::new(vec![]));
        let orchestrator = JobOrchestrator::new(store.clone(), client);

        let err = orchestrator.start(&job.id).await.unwrap_err();
        assert!(matches!(
            err,
            JobError::Dataset(DatasetError::NoTextColumn)
        ));

        let stored = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_zero_row_dataset_completes_immediately() {
        // create_job rejects empty datasets, but the loop itself must
        // handle zero rows; drive start() against a hand-saved job.
        let store = Arc::new(MemoryStore::new());
        let dataset = sample_dataset(&[]);
        store.save_dataset(&dataset).await.unwrap();

        let job = TranslationJob::new(&dataset.id, "sample", "ko", 0);
        store.save_job(&job).await.unwrap();

        let client = Arc::new(ScriptedClient::new(vec![]));
        let orchestrator = JobOrchestrator::new(store.clone(), client);

        orchestrator.start(&job.id).await.unwrap().wait().await;

        let finished = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Completed);
        assert_eq!(finished.progress.current, 0);
        assert!(finished.results.is_empty());
    }

    /// Store wrapper that records a snapshot after every job update.
    struct SnapshotStore {
        inner: MemoryStore,
        snapshots: StdMutex<Vec<(usize, usize, JobStatus)>>,
    }

    impl SnapshotStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                snapshots: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RecordStore for SnapshotStore {
        async fn save_job(&self, job: &TranslationJob) -> Result<(), StoreError> {
            self.inner.save_job(job).await
        }

        async fn get_job(&self, id: &str) -> Result<Option<TranslationJob>, StoreError> {
            self.inner.get_job(id).await
        }

        async fn list_jobs(&self) -> Result<Vec<TranslationJob>, StoreError> {
            self.inner.list_jobs().await
        }

        async fn update_job(&self, id: &str, update: JobUpdate) -> Result<(), StoreError> {
            self.inner.update_job(id, update).await?;
            if let Some(job) = self.inner.get_job(id).await? {
                self.snapshots.lock().unwrap().push((
                    job.progress.current,
                    job.results.len(),
                    job.status,
                ));
            }
            Ok(())
        }

        async fn delete_job(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete_job(id).await
        }

        async fn save_dataset(&self, dataset: &Dataset) -> Result<(), StoreError> {
            self.inner.save_dataset(dataset).await
        }

        async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, StoreError> {
            self.inner.get_dataset(id).await
        }

        async fn list_datasets(&self) -> Result<Vec<Dataset>, StoreError> {
            self.inner.list_datasets().await
        }

        async fn delete_dataset(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete_dataset(id).await
        }
    }

    #[tokio::test]
    async fn test_persisted_snapshots_are_consistent_and_monotone() {
        let store = Arc::new(SnapshotStore::new());
        let dataset = sample_dataset(&["a", "b", "c"]);
        store.save_dataset(&dataset).await.unwrap();

        let mut responses = row_responses("x", 70);
        responses.extend(row_responses("y", 71));
        responses.extend(row_responses("z", 72));
        let client = Arc::new(ScriptedClient::new(responses));
        let orchestrator = JobOrchestrator::new(store.clone(), client);

        let job = orchestrator
            .create_job(&dataset.id, "es", None, None)
            .await
            .unwrap();
        orchestrator.start(&job.id).await.unwrap().wait().await;

        let snapshots = store.snapshots.lock().unwrap().clone();
        assert!(!snapshots.is_empty());

        let mut last_current = 0;
        for (current, results_len, status) in &snapshots {
            // Every committed snapshot is self-consistent
            assert_eq!(current, results_len);
            // Progress never decreases
            assert!(*current >= last_current);
            last_current = *current;
            if *status == JobStatus::Completed {
                assert_eq!(*current, 3);
            }
        }
        assert_eq!(snapshots.last().unwrap().2, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_save_as_dataset_projection() {
        let mut responses = row_responses("uno", 90);
        responses.extend(row_responses("dos", 60));
        let (orchestrator, store, dataset_id) =
            orchestrator_with(&["one", "two"], responses).await;

        let job = orchestrator
            .create_job(&dataset_id, "es", None, None)
            .await
            .unwrap();
        orchestrator.start(&job.id).await.unwrap().wait().await;

        let output = orchestrator
            .save_as_dataset(&job.id, Some("gold-es".to_string()))
            .await
            .unwrap();

        assert_eq!(output.name, "gold-es");
        assert_eq!(output.metadata.row_count, 2);
        assert_eq!(output.metadata.source_type.as_deref(), Some("translation"));
        assert_eq!(output.metadata.source_job_id.as_deref(), Some(job.id.as_str()));

        // Source columns plus the five appended projection columns
        assert_eq!(output.columns.len(), 2 + 5);
        assert!(output
            .columns
            .iter()
            .any(|c| c.name == "prompt_translated"));

        let first = &output.rows[0];
        assert_eq!(first["prompt"], json!("one"));
        assert_eq!(first["label"], json!("low_risk"));
        assert_eq!(first["prompt_translated"], json!("uno"));
        assert_eq!(first["forward_quality_score"], json!(90));
        assert_eq!(first["back_translation"], json!("uno (back)"));
        assert_eq!(first["recommendation"], json!("ACCEPT"));

        // The job record links the output dataset
        let stored = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.output_dataset_id.as_deref(), Some(output.id.as_str()));
        assert!(store.get_dataset(&output.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_as_dataset_default_name() {
        let (orchestrator, store, dataset_id) =
            orchestrator_with(&["one"], row_responses("uno", 90)).await;
        let job = orchestrator
            .create_job(&dataset_id, "es", None, None)
            .await
            .unwrap();
        orchestrator.start(&job.id).await.unwrap().wait().await;

        let output = orchestrator.save_as_dataset(&job.id, None).await.unwrap();
        assert_eq!(output.name, "sample - es");
        drop(store);
    }

    #[tokio::test]
    async fn test_save_as_dataset_requires_completed() {
        let (orchestrator, _store, dataset_id) = orchestrator_with(&["one"], vec![]).await;
        let job = orchestrator
            .create_job(&dataset_id, "es", None, None)
            .await
            .unwrap();

        let err = orchestrator.save_as_dataset(&job.id, None).await.unwrap_err();
        assert!(matches!(err, JobError::JobNotComplete(_)));
    }

    #[tokio::test]
    async fn test_delete_job_removes_record() {
        let (orchestrator, store, dataset_id) = orchestrator_with(&["one"], vec![]).await;
        let job = orchestrator
            .create_job(&dataset_id, "es", None, None)
            .await
            .unwrap();

        orchestrator.delete_job(&job.id).await.unwrap();
        assert!(store.get_job(&job.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_custom_instructions_reach_prompts() {
        let client = Arc::new(ScriptedClient::new(row_responses("uno", 90)));
        let store = Arc::new(MemoryStore::new());
        let dataset = sample_dataset(&["one"]);
        store.save_dataset(&dataset).await.unwrap();
        let orchestrator = JobOrchestrator::new(store, client.clone());

        let job = orchestrator
            .create_job(&dataset.id, "es", Some("formal register".to_string()), None)
            .await
            .unwrap();
        orchestrator.start(&job.id).await.unwrap().wait().await;

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains("formal register"));
        assert!(prompts[1].contains("formal register"));
        assert!(prompts[3].contains("formal register"));
    }
}
