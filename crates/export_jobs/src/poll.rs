//! Job status polling

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::job::{JobId, JobResult, JobStatus};
use crate::store::JobStore;
use crate::{ExportError, Result};

/// Bounds and pacing of a poll loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Multiplier applied to the interval after every pending poll
    pub backoff_factor: f64,
    pub max_interval: Duration,
    pub max_attempts: u32,
    /// Transport errors tolerated in a row before giving up
    pub max_consecutive_errors: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff_factor: 1.5,
            max_interval: Duration::from_secs(10),
            max_attempts: 600,
            max_consecutive_errors: 5,
        }
    }
}

impl PollPolicy {
    /// Fixed interval, no backoff
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            backoff_factor: 1.0,
            max_interval: interval,
            max_attempts,
            ..Self::default()
        }
    }

    fn next_interval(&self, current: Duration) -> Duration {
        let factor = if self.backoff_factor.is_finite() { self.backoff_factor.max(1.0) } else { 1.0 };
        current.mul_f64(factor).min(self.max_interval.max(self.interval))
    }
}

/// What one look at the job record found
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Pending { status: JobStatus, progress: u8 },
    Completed(JobResult),
    /// Failure text recorded by the worker
    Failed(String),
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Pending { .. })
    }
}

/// Read the job once
///
/// A store error is returned as-is; it says nothing about the job.
pub async fn poll_once<S: JobStore>(store: &S, job_id: &JobId) -> Result<PollOutcome> {
    let job = store.get(job_id).await?;
    let outcome = match job.status {
        JobStatus::Completed => match job.result() {
            Some(result) => PollOutcome::Completed(result),
            None => PollOutcome::Failed("completed without a result location".to_string()),
        },
        JobStatus::Failed => PollOutcome::Failed(job.error.unwrap_or_else(|| "unknown error".to_string())),
        status => PollOutcome::Pending { status, progress: job.progress },
    };
    Ok(outcome)
}

/// Poll until the job is terminal, the policy runs out or `cancel` fires
///
/// Transient store errors are retried up to `max_consecutive_errors` in a
/// row; any other error ends polling at once. Nothing observed after
/// cancellation is returned.
pub async fn poll_until_done<S: JobStore>(
    store: &S,
    job_id: &JobId,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<JobResult> {
    let mut interval = policy.interval;
    let mut consecutive_errors = 0;

    for attempt in 1..=policy.max_attempts {
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExportError::Cancelled(*job_id)),
            polled = poll_once(store, job_id) => polled,
        };
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled(*job_id));
        }

        match polled {
            Ok(PollOutcome::Completed(result)) => {
                tracing::info!(%job_id, attempt, location = %result.result_location, "Export completed");
                return Ok(result);
            }
            Ok(PollOutcome::Failed(message)) => {
                tracing::error!(%job_id, attempt, "Export failed: {}", message);
                return Err(ExportError::WorkerFailure { job_id: *job_id, message });
            }
            Ok(PollOutcome::Pending { status, progress }) => {
                consecutive_errors = 0;
                tracing::debug!(%job_id, attempt, %status, progress, "Export in progress");
            }
            Err(e) if !e.is_transient() => {
                tracing::error!(%job_id, attempt, "Polling stopped: {}", e);
                return Err(e);
            }
            Err(e) => {
                consecutive_errors += 1;
                if consecutive_errors > policy.max_consecutive_errors {
                    tracing::error!(%job_id, attempt, "Giving up polling after {} errors: {}", consecutive_errors, e);
                    return Err(e);
                }
                tracing::warn!(%job_id, attempt, "Poll attempt failed: {}", e);
            }
        }

        if attempt == policy.max_attempts {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExportError::Cancelled(*job_id)),
            _ = tokio::time::sleep(interval) => {}
        }
        interval = policy.next_interval(interval);
    }

    tracing::error!(%job_id, attempts = policy.max_attempts, "Export polling timed out");
    Err(ExportError::PollTimeout { job_id: *job_id, attempts: policy.max_attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{ExportJob, JobType, JobUpdate};
    use crate::store::MemoryJobStore;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Mutex;

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy::fixed(Duration::from_millis(1), max_attempts)
    }

    /// Plays back a script of job states, one per `get`
    struct ScriptedStore {
        script: Mutex<VecDeque<Result<ExportJob>>>,
        gets: AtomicU32,
    }

    impl ScriptedStore {
        fn new(script: Vec<Result<ExportJob>>) -> Self {
            Self { script: Mutex::new(script.into()), gets: AtomicU32::new(0) }
        }
    }

    impl JobStore for ScriptedStore {
        async fn create(&self, _job: ExportJob) -> Result<()> {
            Ok(())
        }

        async fn get(&self, id: &JobId) -> Result<ExportJob> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.script.lock().await.pop_front().unwrap_or(Err(ExportError::JobNotFound(*id)))
        }

        async fn update(&self, id: &JobId, _update: JobUpdate) -> Result<ExportJob> {
            Err(ExportError::JobNotFound(*id))
        }

        async fn list(&self) -> Result<Vec<ExportJob>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _id: &JobId) -> Result<()> {
            Ok(())
        }
    }

    fn job_in(id: JobId, updates: &[JobUpdate]) -> ExportJob {
        let mut job = ExportJob::new(id, JobType::Single, "sheet.html", "Spring");
        for update in updates {
            job.apply(update.clone()).unwrap();
        }
        job
    }

    fn done() -> JobUpdate {
        JobUpdate::Completed { result_location: "memory://artifacts/x.html".into() }
    }

    #[tokio::test]
    async fn test_polls_exactly_until_terminal() {
        let id = JobId::new();
        let store = ScriptedStore::new(vec![
            Ok(job_in(id, &[])),
            Ok(job_in(id, &[JobUpdate::Processing])),
            Ok(job_in(id, &[JobUpdate::Processing, done()])),
            Ok(job_in(id, &[JobUpdate::Processing, done()])),
        ]);

        let result = poll_until_done(&store, &id, &fast(10), &CancellationToken::new()).await.unwrap();

        assert_eq!(result.result_location, "memory://artifacts/x.html");
        assert_eq!(result.file_name, "sheet.html");
        assert_eq!(store.gets.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_worker_failure_surfaces_error_text() {
        let id = JobId::new();
        let store = ScriptedStore::new(vec![Ok(job_in(id, &[JobUpdate::Failed { error: "worker crashed".into() }]))]);

        let err = poll_until_done(&store, &id, &fast(10), &CancellationToken::new()).await.unwrap_err();
        match err {
            ExportError::WorkerFailure { message, .. } => assert_eq!(message, "worker crashed"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_poll_propagates_transport_error() {
        let id = JobId::new();
        let store = ScriptedStore::new(vec![Err(ExportError::Transport("reset".into())), Ok(job_in(id, &[]))]);

        assert!(matches!(poll_once(&store, &id).await, Err(ExportError::Transport(_))));
        // the next attempt is unaffected
        assert!(matches!(poll_once(&store, &id).await, Ok(PollOutcome::Pending { status: JobStatus::Pending, .. })));
    }

    #[tokio::test]
    async fn test_transient_errors_are_tolerated() {
        let id = JobId::new();
        let store = ScriptedStore::new(vec![
            Err(ExportError::Transport("reset".into())),
            Err(ExportError::Transport("reset".into())),
            Ok(job_in(id, &[JobUpdate::Processing, done()])),
        ]);

        let result = poll_until_done(&store, &id, &fast(10), &CancellationToken::new()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_too_many_consecutive_errors() {
        let id = JobId::new();
        let script = (0..3).map(|_| Err(ExportError::Transport("down".into()))).collect();
        let store = ScriptedStore::new(script);
        let policy = PollPolicy { max_consecutive_errors: 2, ..fast(10) };

        let err = poll_until_done(&store, &id, &policy, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ExportError::Transport(_)));
        assert_eq!(store.gets.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unknown_job_fails_on_first_attempt() {
        let store = ScriptedStore::new(Vec::new());
        let policy = PollPolicy::fixed(Duration::from_secs(5), 10);

        let started = std::time::Instant::now();
        let err = poll_until_done(&store, &JobId::new(), &policy, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::JobNotFound(_)));
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_memory_store_unknown_id_is_not_retried() {
        let store = MemoryJobStore::new();
        let policy = PollPolicy::fixed(Duration::from_secs(5), 10);

        let err = poll_until_done(&store, &JobId::new(), &policy, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_attempt_cap_times_out() {
        let store = MemoryJobStore::new();
        let id = JobId::new();
        store.create(ExportJob::new(id, JobType::Single, "a", "b")).await.unwrap();

        let err = poll_until_done(&store, &id, &fast(3), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ExportError::PollTimeout { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_cancellation_hides_late_result() {
        let store = MemoryJobStore::new();
        let id = JobId::new();
        store.create(ExportJob::new(id, JobType::Single, "a", "b")).await.unwrap();

        let cancel = CancellationToken::new();
        let policy = PollPolicy::fixed(Duration::from_millis(20), 100);
        let poller = {
            let cancel = cancel.clone();
            async move { poll_until_done(&store, &id, &policy, &cancel).await }
        };
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cancel.cancel();
        };

        let (result, ()) = tokio::join!(poller, trigger);
        assert!(matches!(result, Err(ExportError::Cancelled(_))));
    }

    #[tokio::test]
    async fn test_already_cancelled_never_polls() {
        let id = JobId::new();
        let store = ScriptedStore::new(vec![Ok(job_in(id, &[JobUpdate::Processing, done()]))]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = poll_until_done(&store, &id, &fast(10), &cancel).await;
        assert!(matches!(result, Err(ExportError::Cancelled(_))));
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = PollPolicy::default();
        let mut interval = policy.interval;
        for _ in 0..20 {
            interval = policy.next_interval(interval);
        }
        assert_eq!(interval, Duration::from_secs(10));
        assert_eq!(policy.next_interval(Duration::from_secs(1)), Duration::from_millis(1500));
    }
}
