//! Rendering worker boundary and the in-process worker

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::blob::BlobStore;
use crate::job::{JobId, JobPayload, JobUpdate};
use crate::store::JobStore;
use crate::{ExportError, Result};

const BODY_OPEN: &str = "<body>";
const BODY_CLOSE: &str = "</body>";

/// Accepts export work for a job
///
/// `submit` only acknowledges the hand-off. The worker reports status,
/// progress and the result location through the job store.
#[trait_variant::make(Send)]
pub trait RenderWorker: Send + Sync {
    async fn submit(&self, job_id: &JobId, payload: JobPayload) -> Result<()>;
}

/// Blob key of a finished artifact
pub fn artifact_key(job_id: &JobId) -> String {
    format!("artifacts/{}.html", job_id)
}

/// Join chunk documents into one, keeping the first chunk's head
pub fn merge_chunk_documents(parts: &[String]) -> String {
    let Some(first) = parts.first() else {
        return String::new();
    };

    let head = match first.find(BODY_OPEN) {
        Some(at) => &first[..at + BODY_OPEN.len()],
        None => BODY_OPEN,
    };

    let mut merged = String::from(head);
    for part in parts {
        merged.push_str(body_of(part));
    }
    merged.push_str(BODY_CLOSE);
    merged.push_str("</html>");
    merged
}

fn body_of(document: &str) -> &str {
    let start = document.find(BODY_OPEN).map(|at| at + BODY_OPEN.len()).unwrap_or(0);
    let end = document.rfind(BODY_CLOSE).filter(|end| *end >= start).unwrap_or(document.len());
    &document[start..end]
}

/// Worker that assembles the artifact in-process
///
/// Submissions are keyed by job id; repeated deliveries of the same job
/// are acknowledged without doing the work twice. Only in-flight ids are
/// held in memory. Once a job is terminal its record marks later
/// deliveries as duplicates.
pub struct LocalRenderWorker<S, B> {
    store: Arc<S>,
    blobs: Arc<B>,
    accepted: Arc<Mutex<HashSet<JobId>>>,
}

impl<S, B> Clone for LocalRenderWorker<S, B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            blobs: Arc::clone(&self.blobs),
            accepted: Arc::clone(&self.accepted),
        }
    }
}

impl<S, B> LocalRenderWorker<S, B>
where
    S: JobStore + 'static,
    B: BlobStore + 'static,
{
    pub fn new(store: Arc<S>, blobs: Arc<B>) -> Self {
        Self { store, blobs, accepted: Arc::new(Mutex::new(HashSet::new())) }
    }

    async fn run(&self, job_id: JobId, payload: JobPayload) {
        let outcome = match self.process(&job_id, payload).await {
            Ok(location) => {
                tracing::info!(%job_id, %location, "Export artifact written");
                JobUpdate::Completed { result_location: location }
            }
            Err(e) => {
                tracing::error!(%job_id, "Export worker failed: {}", e);
                JobUpdate::Failed { error: e.to_string() }
            }
        };

        if let Err(e) = self.store.update(&job_id, outcome).await {
            tracing::error!(%job_id, "Failed to record job outcome: {}", e);
        }
        self.accepted.lock().await.remove(&job_id);
    }

    async fn is_finished(&self, job_id: &JobId) -> bool {
        matches!(self.store.get(job_id).await, Ok(job) if job.is_terminal())
    }

    async fn process(&self, job_id: &JobId, payload: JobPayload) -> Result<String> {
        self.store.update(job_id, JobUpdate::Processing).await?;

        let html = match payload {
            JobPayload::Document { html } => html,
            JobPayload::Chunks { mut chunks } => {
                chunks.sort_by_key(|chunk| chunk.index);
                let total = chunks.len();
                let mut parts = Vec::with_capacity(total);

                for (done, chunk) in chunks.iter().enumerate() {
                    let bytes = self.blobs.get(&chunk.location).await?;
                    let part = String::from_utf8(bytes).map_err(|e| ExportError::WorkerFailure {
                        job_id: *job_id,
                        message: format!("chunk {} is not valid UTF-8: {}", chunk.index, e),
                    })?;
                    parts.push(part);

                    let progress = ((done + 1) * 90 / total.max(1)) as u8;
                    self.store.update(job_id, JobUpdate::Progress(progress)).await?;
                }

                merge_chunk_documents(&parts)
            }
        };

        self.blobs.put(&artifact_key(job_id), html.into_bytes()).await
    }
}

impl<S, B> RenderWorker for LocalRenderWorker<S, B>
where
    S: JobStore + 'static,
    B: BlobStore + 'static,
{
    async fn submit(&self, job_id: &JobId, payload: JobPayload) -> Result<()> {
        if !self.accepted.lock().await.insert(*job_id) {
            tracing::debug!(%job_id, "Duplicate submission ignored");
            return Ok(());
        }
        // the outcome is stored before the id leaves the in-flight set
        if self.is_finished(job_id).await {
            self.accepted.lock().await.remove(job_id);
            tracing::debug!(%job_id, "Submission for finished job ignored");
            return Ok(());
        }

        tracing::debug!(%job_id, chunks = payload.chunk_count(), "Job accepted by local worker");
        let worker = self.clone();
        let job_id = *job_id;
        tokio::spawn(async move { worker.run(job_id, payload).await });
        Ok(())
    }
}
