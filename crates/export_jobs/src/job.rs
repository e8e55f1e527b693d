//! Job records and the status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ExportError, Result};

/// Identifier of one logical export request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the state machine allows moving to `next`
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// What kind of document the job produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Single,
    Catalog,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Single => write!(f, "single"),
            JobType::Catalog => write!(f, "catalog"),
        }
    }
}

/// Reference to one persisted chunk of a catalog's markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRef {
    /// Position of the chunk; final page order follows this index
    pub index: usize,
    pub location: String,
    /// Output index of the chunk's first page
    pub first_page: usize,
    pub page_count: usize,
}

/// Work handed to the rendering worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JobPayload {
    /// One complete markup document
    Document { html: String },
    /// Ordered references to persisted markup chunks
    Chunks { chunks: Vec<ChunkRef> },
}

impl JobPayload {
    pub fn chunk_count(&self) -> usize {
        match self {
            JobPayload::Document { .. } => 1,
            JobPayload::Chunks { chunks } => chunks.len(),
        }
    }
}

/// A change requested by the worker or the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Processing,
    Progress(u8),
    Completed { result_location: String },
    Failed { error: String },
}

impl JobUpdate {
    fn target_status(&self) -> JobStatus {
        match self {
            JobUpdate::Processing | JobUpdate::Progress(_) => JobStatus::Processing,
            JobUpdate::Completed { .. } => JobStatus::Completed,
            JobUpdate::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Export job record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJob {
    pub id: JobId,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    /// Percent complete, 0 to 100
    pub progress: u8,
    #[serde(default)]
    pub error: Option<String>,
    pub file_name: String,
    pub display_filename: String,
    pub project_name: String,
    #[serde(default)]
    pub result_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExportJob {
    /// A fresh pending job
    pub fn new(id: JobId, job_type: JobType, file_name: impl Into<String>, project_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let now = Utc::now();
        Self {
            id,
            user_id: None,
            job_type,
            status: JobStatus::Pending,
            progress: 0,
            error: None,
            display_filename: file_name.clone(),
            file_name,
            project_name: project_name.into(),
            result_location: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_display_filename(mut self, name: impl Into<String>) -> Self {
        self.display_filename = name.into();
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply an update, enforcing the state machine
    ///
    /// Progress only moves forward and is only accepted while processing.
    pub fn apply(&mut self, update: JobUpdate) -> Result<()> {
        let target = update.target_status();
        let allowed = match update {
            JobUpdate::Progress(_) => self.status == JobStatus::Processing,
            _ => self.status.can_transition_to(target),
        };
        if !allowed {
            return Err(ExportError::InvalidTransition { job_id: self.id, from: self.status, to: target });
        }

        match update {
            JobUpdate::Processing => {}
            JobUpdate::Progress(progress) => {
                self.progress = self.progress.max(progress.min(100));
            }
            JobUpdate::Completed { result_location } => {
                self.progress = 100;
                self.result_location = Some(result_location);
            }
            JobUpdate::Failed { error } => {
                self.error = Some(error);
            }
        }

        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Result of a completed job
    pub fn result(&self) -> Option<JobResult> {
        match (self.status, &self.result_location) {
            (JobStatus::Completed, Some(location)) => Some(JobResult {
                result_location: location.clone(),
                file_name: self.display_filename.clone(),
            }),
            _ => None,
        }
    }
}

/// Where a finished export lives and what to call it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub result_location: String,
    pub file_name: String,
}
