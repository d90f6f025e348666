//! Record store for job and dataset persistence.
//!
//! The orchestrator persists every job snapshot through the [`RecordStore`]
//! trait. Two implementations ship with the crate: an in-memory store for
//! tests and embedding, and a JSON-file-backed store for the CLI. Semantics
//! are last-write-wins; the orchestrator is the sole writer to an active
//! job's record, so each committed snapshot is self-consistent.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::dataset::Dataset;
use crate::error::StoreError;
use crate::job::{JobUpdate, TranslationJob};

/// Key-value persistence for job and dataset records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Saves a job record, replacing any record with the same id.
    async fn save_job(&self, job: &TranslationJob) -> Result<(), StoreError>;

    /// Fetches a job by id.
    async fn get_job(&self, id: &str) -> Result<Option<TranslationJob>, StoreError>;

    /// Lists all stored jobs.
    async fn list_jobs(&self) -> Result<Vec<TranslationJob>, StoreError>;

    /// Merges a partial update into a stored job and refreshes its
    /// `updated_at` timestamp.
    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<(), StoreError>;

    /// Deletes a job record; deleting a missing id is a no-op.
    async fn delete_job(&self, id: &str) -> Result<(), StoreError>;

    /// Saves a dataset record, replacing any record with the same id.
    async fn save_dataset(&self, dataset: &Dataset) -> Result<(), StoreError>;

    /// Fetches a dataset by id.
    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, StoreError>;

    /// Lists all stored datasets.
    async fn list_datasets(&self) -> Result<Vec<Dataset>, StoreError>;

    /// Deletes a dataset record; deleting a missing id is a no-op.
    async fn delete_dataset(&self, id: &str) -> Result<(), StoreError>;
}
