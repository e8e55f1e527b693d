//! Job record storage

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::job::{ExportJob, JobId, JobUpdate};
use crate::{ExportError, Result};

/// CRUD access to job records
///
/// `update` must apply [`ExportJob::apply`] atomically so concurrent
/// writers can never move a job out of a terminal state.
#[trait_variant::make(Send)]
pub trait JobStore: Send + Sync {
    /// Insert a new job; an existing id is an error
    async fn create(&self, job: ExportJob) -> Result<()>;

    async fn get(&self, id: &JobId) -> Result<ExportJob>;

    /// Apply a state change and return the updated record
    async fn update(&self, id: &JobId, update: JobUpdate) -> Result<ExportJob>;

    async fn list(&self) -> Result<Vec<ExportJob>>;

    async fn delete(&self, id: &JobId) -> Result<()>;
}

/// In-process job store
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, ExportJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl JobStore for MemoryJobStore {
    async fn create(&self, job: ExportJob) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(ExportError::DuplicateJob(job.id));
        }
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn get(&self, id: &JobId) -> Result<ExportJob> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(ExportError::JobNotFound(*id))
    }

    async fn update(&self, id: &JobId, update: JobUpdate) -> Result<ExportJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id).ok_or(ExportError::JobNotFound(*id))?;
        job.apply(update)?;
        Ok(job.clone())
    }

    async fn list(&self) -> Result<Vec<ExportJob>> {
        let mut jobs: Vec<ExportJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by_key(|job| job.created_at);
        Ok(jobs)
    }

    async fn delete(&self, id: &JobId) -> Result<()> {
        self.jobs
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(ExportError::JobNotFound(*id))
    }
}
