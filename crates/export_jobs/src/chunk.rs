//! Splitting large catalogs into independently stored chunks

use std::sync::Arc;

use page_render::markup::document_to_html;
use page_render::PageDocument;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::blob::BlobStore;
use crate::job::{ChunkRef, JobId};
use crate::{ExportError, Result};

/// A contiguous run of pages
#[derive(Debug, Clone, PartialEq)]
pub struct PageChunk {
    pub index: usize,
    /// Output index of the first page
    pub first_page: usize,
    pub pages: Vec<PageDocument>,
}

impl PageChunk {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Split pages into chunks of at most `chunk_size`, keeping order
///
/// A zero chunk size is treated as one.
pub fn chunk_pages(pages: Vec<PageDocument>, chunk_size: usize) -> Vec<PageChunk> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(pages.len().div_ceil(chunk_size));
    let mut pages = pages.into_iter().peekable();
    let mut first_page = 0;

    while pages.peek().is_some() {
        let batch: Vec<PageDocument> = pages.by_ref().take(chunk_size).collect();
        let count = batch.len();
        chunks.push(PageChunk { index: chunks.len(), first_page, pages: batch });
        first_page += count;
    }

    chunks
}

/// Blob key of a chunk
pub fn chunk_key(job_id: &JobId, index: usize) -> String {
    format!("jobs/{}/chunk-{:04}.html", job_id, index)
}

/// Limits for concurrent chunk uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub concurrency: usize,
    /// Extra attempts after the first failure
    pub retries: u32,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self { concurrency: 4, retries: 2 }
    }
}

/// Persist every chunk as its own markup blob
///
/// Uploads run concurrently; the returned references are ordered by
/// chunk index whatever order the uploads finished in. If any chunk
/// fails, the chunks already stored are deleted before the error is
/// returned.
pub async fn upload_chunks<B>(
    blobs: Arc<B>,
    job_id: JobId,
    title: &str,
    chunks: Vec<PageChunk>,
    policy: UploadPolicy,
) -> Result<Vec<ChunkRef>>
where
    B: BlobStore + 'static,
{
    let permits = Arc::new(Semaphore::new(policy.concurrency.max(1)));
    let mut tasks: JoinSet<Result<ChunkRef>> = JoinSet::new();

    for chunk in chunks {
        let blobs = Arc::clone(&blobs);
        let permits = Arc::clone(&permits);
        let html = document_to_html(title, &chunk.pages);
        let key = chunk_key(&job_id, chunk.index);
        let (index, first_page, page_count) = (chunk.index, chunk.first_page, chunk.page_count());

        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ExportError::Submission(e.to_string()))?;

            let mut attempt = 0;
            let location = loop {
                match blobs.put(&key, html.clone().into_bytes()).await {
                    Ok(location) => break location,
                    Err(e) if attempt < policy.retries => {
                        attempt += 1;
                        tracing::warn!(%job_id, chunk = index, attempt, "Chunk upload failed, retrying: {}", e);
                    }
                    Err(e) => {
                        return Err(ExportError::Submission(format!(
                            "chunk {} could not be stored: {}",
                            index, e
                        )));
                    }
                }
            };

            tracing::debug!(%job_id, chunk = index, %location, "Chunk stored");
            Ok(ChunkRef { index, location, first_page, page_count })
        });
    }

    let mut refs = Vec::with_capacity(tasks.len());
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        let uploaded = joined
            .map_err(|e| ExportError::Submission(format!("upload task failed: {}", e)))
            .and_then(|result| result);
        match uploaded {
            Ok(chunk) => refs.push(chunk),
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }

    if let Some(e) = failure {
        discard_chunks(blobs.as_ref(), &job_id, &refs).await;
        return Err(e);
    }
    refs.sort_by_key(|chunk| chunk.index);

    Ok(refs)
}

/// Remove chunks of a submission that never got a job record
pub(crate) async fn discard_chunks<B: BlobStore>(blobs: &B, job_id: &JobId, chunks: &[ChunkRef]) {
    for chunk in chunks {
        if let Err(e) = blobs.delete(&chunk.location).await {
            tracing::warn!(%job_id, chunk = chunk.index, "Failed to delete orphaned chunk: {}", e);
        }
    }
    tracing::debug!(%job_id, discarded = chunks.len(), "Chunks of failed upload discarded");
}
