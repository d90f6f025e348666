//! JSON-file-backed record store.
//!
//! All records live in one JSON document that is loaded at open and
//! rewritten after every mutation. This matches the crate's durability
//! contract: last written state wins, nothing more.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::RecordStore;
use crate::dataset::Dataset;
use crate::error::StoreError;
use crate::job::{JobUpdate, TranslationJob};

/// On-disk document holding every record.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    jobs: HashMap<String, TranslationJob>,
    #[serde(default)]
    datasets: HashMap<String, Dataset>,
}

/// Record store persisted to a single JSON file.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl FileStore {
    /// Opens a file store, loading existing state if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let raw = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&raw)?
        } else {
            StoreState::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Writes the full state document to disk.
    async fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn save_job(&self, job: &TranslationJob) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.jobs.insert(job.id.clone(), job.clone());
        self.persist(&state).await
    }

    async fn get_job(&self, id: &str) -> Result<Option<TranslationJob>, StoreError> {
        Ok(self.state.lock().await.jobs.get(id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<TranslationJob>, StoreError> {
        let state = self.state.lock().await;
        let mut jobs: Vec<TranslationJob> = state.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(jobs)
    }

    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply(job);
        self.persist(&state).await
    }

    async fn delete_job(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.jobs.remove(id).is_some() {
            self.persist(&state).await?;
        }
        Ok(())
    }

    async fn save_dataset(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.datasets.insert(dataset.id.clone(), dataset.clone());
        self.persist(&state).await
    }

    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, StoreError> {
        Ok(self.state.lock().await.datasets.get(id).cloned())
    }

    async fn list_datasets(&self) -> Result<Vec<Dataset>, StoreError> {
        let state = self.state.lock().await;
        let mut datasets: Vec<Dataset> = state.datasets.values().cloned().collect();
        datasets.sort_by(|a, b| a.metadata.created_at.cmp(&b.metadata.created_at));
        Ok(datasets)
    }

    async fn delete_dataset(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.datasets.remove(id).is_some() {
            self.persist(&state).await?;
        }
        Ok(())
    }
}
