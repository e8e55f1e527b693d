//! Error types for export jobs

use thiserror::Error;

use crate::job::{JobId, JobStatus};

/// Message shown to end users for every export failure
pub const USER_FACING_ERROR: &str = "Export failed. Please try again.";

/// Errors that can occur while building, dispatching or polling exports
#[derive(Debug, Error)]
pub enum ExportError {
    /// Invalid dataset or template input
    #[error("Dataset error: {0}")]
    Model(#[from] sheet_model::ModelError),

    /// Reflow of a page failed
    #[error("Layout error: {0}")]
    Layout(#[from] reflow_engine::LayoutError),

    /// Catalog structure could not be planned
    #[error("Planning error: {0}")]
    Plan(#[from] catalog_planner::PlanError),

    /// A page could not be rendered
    #[error("Render error: {0}")]
    Render(#[from] page_render::RenderError),

    /// Page build failed under the abort policy, or every page failed
    #[error("Page {page} failed to build: {message}")]
    PageBuild { page: usize, message: String },

    /// Chunk upload or job hand-off failed before a job was created
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Worker did not acknowledge a job within the retry budget
    #[error("Dispatch of job {job_id} failed: {message}")]
    Dispatch { job_id: JobId, message: String },

    /// Worker reported a failed job
    #[error("Job {job_id} failed: {message}")]
    WorkerFailure { job_id: JobId, message: String },

    /// Polling gave up before the job reached a terminal state
    #[error("Job {job_id} still not finished after {attempts} polls")]
    PollTimeout { job_id: JobId, attempts: u32 },

    /// Polling was cancelled by the caller
    #[error("Polling job {0} was cancelled")]
    Cancelled(JobId),

    /// Job store could not be reached
    #[error("Job store unavailable: {0}")]
    Transport(String),

    /// No job record with this id
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// A job record with this id already exists
    #[error("Job already exists: {0}")]
    DuplicateJob(JobId),

    /// Status change not allowed by the job lifecycle
    #[error("Job {job_id} cannot move from {from} to {to}")]
    InvalidTransition { job_id: JobId, from: JobStatus, to: JobStatus },

    /// Blob store read, write or delete failed
    #[error("Blob store error: {0}")]
    Blob(String),

    /// IO error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExportError {
    /// The only text callers show to users; details stay in the logs
    pub fn user_message(&self) -> &'static str {
        USER_FACING_ERROR
    }

    /// Errors a later attempt may not hit again
    pub fn is_transient(&self) -> bool {
        matches!(self, ExportError::Transport(_) | ExportError::Blob(_) | ExportError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
