//! Client-facing export API

use std::sync::Arc;

use page_render::markup::document_to_html;
use sheet_model::{CatalogSections, DataSet, Template};
use tokio_util::sync::CancellationToken;

use crate::assembler::{BuildReport, CatalogAssembler};
use crate::blob::{BlobStore, MemoryBlobStore};
use crate::chunk::{chunk_pages, discard_chunks, upload_chunks};
use crate::config::ExportConfig;
use crate::dispatch::{DispatchQueue, DispatchTask};
use crate::job::{ExportJob, JobId, JobPayload, JobResult, JobType, JobUpdate};
use crate::poll::poll_until_done;
use crate::store::{JobStore, MemoryJobStore};
use crate::worker::{LocalRenderWorker, RenderWorker};
use crate::Result;

/// Caller metadata for one export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub file_name: String,
    pub project_name: String,
    pub user_id: Option<String>,
    /// Record a single export binds to
    pub record_index: Option<usize>,
    /// Document title; defaults to the project name
    pub title: Option<String>,
}

impl ExportOptions {
    pub fn new(file_name: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), project_name: project_name.into(), ..Default::default() }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_record(mut self, index: usize) -> Self {
        self.record_index = Some(index);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn document_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.project_name)
    }
}

/// A submitted job and how its pages were built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub job_id: JobId,
    pub report: BuildReport,
}

/// Submits exports and waits for their results
pub struct ExportClient<S, B> {
    store: Arc<S>,
    blobs: Arc<B>,
    assembler: CatalogAssembler,
    queue: DispatchQueue,
    config: ExportConfig,
}

/// Client running everything in-process
pub type LocalExportClient<B = MemoryBlobStore> = ExportClient<MemoryJobStore, B>;

impl<B> ExportClient<MemoryJobStore, B>
where
    B: BlobStore + 'static,
{
    /// In-memory job store and a local worker sharing `blobs`
    pub fn local(blobs: Arc<B>, config: ExportConfig) -> Self {
        let store = Arc::new(MemoryJobStore::new());
        let worker = Arc::new(LocalRenderWorker::new(Arc::clone(&store), Arc::clone(&blobs)));
        Self::new(store, blobs, worker, config)
    }
}

impl<S, B> ExportClient<S, B>
where
    S: JobStore + 'static,
    B: BlobStore + 'static,
{
    /// Create a client; must be called inside a tokio runtime
    pub fn new<W>(store: Arc<S>, blobs: Arc<B>, worker: Arc<W>, config: ExportConfig) -> Self
    where
        W: RenderWorker + 'static,
    {
        let queue = DispatchQueue::spawn(Arc::clone(&store), worker, config.dispatch_policy());
        let assembler = CatalogAssembler::new(config.render.clone(), config.failure_policy);
        Self {
            store,
            blobs,
            assembler,
            queue,
            config,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn blobs(&self) -> &Arc<B> {
        &self.blobs
    }

    /// Export one template as a single document
    pub async fn submit_single(&self, template: &Template, data: &DataSet, options: &ExportOptions) -> Result<Submission> {
        let record = options.record_index.and_then(|index| data.row(index));
        let build = self.assembler.build_single(template, data, record)?;
        let html = document_to_html(options.document_title(), &build.pages);

        let job_id = JobId::new();
        let job_id = self
            .create_and_dispatch(job_id, JobType::Single, options, JobPayload::Document { html })
            .await?;
        Ok(Submission { job_id, report: build.report })
    }

    /// Export a catalog
    ///
    /// Catalogs longer than the chunk size are stored as chunks before the
    /// job record exists; a failed upload is returned to the caller. Stored
    /// chunks are deleted again when no job record can be created for them.
    pub async fn submit_catalog(
        &self,
        sections: &CatalogSections,
        data: &DataSet,
        options: &ExportOptions,
    ) -> Result<Submission> {
        let build = self.assembler.build_catalog(sections, data)?;
        let job_id = JobId::new();
        let title = options.document_title();

        let payload = if build.pages.len() > self.config.chunk_size {
            let chunks = chunk_pages(build.pages, self.config.chunk_size);
            tracing::info!(%job_id, chunks = chunks.len(), "Uploading catalog chunks");
            let refs = upload_chunks(
                Arc::clone(&self.blobs),
                job_id,
                title,
                chunks,
                self.config.upload_policy(),
            )
            .await?;
            JobPayload::Chunks { chunks: refs }
        } else {
            JobPayload::Document { html: document_to_html(title, &build.pages) }
        };

        let stored = match &payload {
            JobPayload::Chunks { chunks } => chunks.clone(),
            JobPayload::Document { .. } => Vec::new(),
        };
        match self.create_and_dispatch(job_id, JobType::Catalog, options, payload).await {
            Ok(job_id) => Ok(Submission { job_id, report: build.report }),
            Err(e) => {
                discard_chunks(self.blobs.as_ref(), &job_id, &stored).await;
                Err(e)
            }
        }
    }

    async fn create_and_dispatch(
        &self,
        job_id: JobId,
        job_type: JobType,
        options: &ExportOptions,
        payload: JobPayload,
    ) -> Result<JobId> {
        let mut job = ExportJob::new(job_id, job_type, &options.file_name, &options.project_name);
        if let Some(user_id) = &options.user_id {
            job = job.with_user(user_id);
        }
        self.store.create(job).await?;
        tracing::info!(%job_id, %job_type, chunks = payload.chunk_count(), "Export job created");

        if let Err(e) = self.queue.enqueue(DispatchTask { job_id, payload }).await {
            tracing::error!(%job_id, "Could not queue export job: {}", e);
            self.store.update(&job_id, JobUpdate::Failed { error: e.to_string() }).await?;
        }

        Ok(job_id)
    }

    /// Wait for a job using the configured poll policy
    pub async fn poll_until_done(&self, job_id: &JobId, cancel: &CancellationToken) -> Result<JobResult> {
        poll_until_done(self.store.as_ref(), job_id, &self.config.poll_policy(), cancel).await
    }

    pub async fn job(&self, job_id: &JobId) -> Result<ExportJob> {
        self.store.get(job_id).await
    }

    /// Drain queued dispatches and stop the queue
    pub async fn shutdown(self) {
        self.queue.shutdown().await;
    }
}
