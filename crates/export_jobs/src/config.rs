//! Export configuration

use std::path::Path;
use std::time::Duration;

use page_render::RenderOptions;
use serde::{Deserialize, Serialize};

use crate::assembler::FailurePolicy;
use crate::chunk::UploadPolicy;
use crate::dispatch::DispatchPolicy;
use crate::poll::PollPolicy;
use crate::Result;

/// Tunables of the export protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Catalogs with more pages than this are split into chunks
    pub chunk_size: usize,
    pub poll_interval_ms: u64,
    pub poll_backoff_factor: f64,
    pub poll_max_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub poll_max_consecutive_errors: u32,
    pub dispatch_timeout_ms: u64,
    pub dispatch_max_attempts: u32,
    pub dispatch_backoff_ms: u64,
    pub upload_concurrency: usize,
    pub upload_retries: u32,
    pub failure_policy: FailurePolicy,
    pub render: RenderOptions,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            poll_interval_ms: 1_000,
            poll_backoff_factor: 1.5,
            poll_max_interval_ms: 10_000,
            poll_max_attempts: 600,
            poll_max_consecutive_errors: 5,
            dispatch_timeout_ms: 30_000,
            dispatch_max_attempts: 3,
            dispatch_backoff_ms: 500,
            upload_concurrency: 4,
            upload_retries: 2,
            failure_policy: FailurePolicy::ContinueAndReport,
            render: RenderOptions::default(),
        }
    }
}

impl ExportConfig {
    /// Load from a JSON file
    ///
    /// A missing file yields defaults; an unparsable one is logged and
    /// replaced by defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        match serde_json::from_str::<ExportConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Failed to parse export config {}, using defaults: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            backoff_factor: self.poll_backoff_factor,
            max_interval: Duration::from_millis(self.poll_max_interval_ms),
            max_attempts: self.poll_max_attempts,
            max_consecutive_errors: self.poll_max_consecutive_errors,
        }
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            timeout: Duration::from_millis(self.dispatch_timeout_ms),
            max_attempts: self.dispatch_max_attempts,
            backoff: Duration::from_millis(self.dispatch_backoff_ms),
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            concurrency: self.upload_concurrency,
            retries: self.upload_retries,
        }
    }
}
