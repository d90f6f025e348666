//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::dataset::Dataset;
use crate::error::StoreError;
use crate::job::{JobUpdate, TranslationJob};

/// In-memory store backed by `HashMap`s.
///
/// Used in tests and when embedding the orchestrator without durable state.
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<String, TranslationJob>>,
    datasets: RwLock<HashMap<String, Dataset>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save_job(&self, job: &TranslationJob) -> Result<(), StoreError> {
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<TranslationJob>, StoreError> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<TranslationJob>, StoreError> {
        let mut jobs: Vec<TranslationJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(jobs)
    }

    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        update.apply(job);
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<(), StoreError> {
        self.jobs.write().await.remove(id);
        Ok(())
    }

    async fn save_dataset(&self, dataset: &Dataset) -> Result<(), StoreError> {
        self.datasets
            .write()
            .await
            .insert(dataset.id.clone(), dataset.clone());
        Ok(())
    }

    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, StoreError> {
        Ok(self.datasets.read().await.get(id).cloned())
    }

    async fn list_datasets(&self) -> Result<Vec<Dataset>, StoreError> {
        let mut datasets: Vec<Dataset> = self.datasets.read().await.values().cloned().collect();
        datasets.sort_by(|a, b| a.metadata.created_at.cmp(&b.metadata.created_at));
        Ok(datasets)
    }

    async fn delete_dataset(&self, id: &str) -> Result<(), StoreError> {
        self.datasets.write().await.remove(id);
        Ok(())
    }
}
