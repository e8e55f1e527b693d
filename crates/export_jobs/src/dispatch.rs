//! At-least-once delivery of jobs to the rendering worker

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::job::{JobId, JobPayload, JobUpdate};
use crate::store::JobStore;
use crate::worker::RenderWorker;
use crate::{ExportError, Result};

const QUEUE_CAPACITY: usize = 256;

/// Timeout and retry schedule for worker hand-offs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Bound on a single `submit` call
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles afterwards
    pub backoff: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl DispatchPolicy {
    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// One job waiting to be handed to the worker
#[derive(Debug, Clone)]
pub struct DispatchTask {
    pub job_id: JobId,
    pub payload: JobPayload,
}

/// Background queue that delivers tasks to a worker
///
/// Every attempt is bounded by the policy timeout. A task that exhausts
/// its attempts marks its job failed, so no job stays pending because a
/// hand-off went unanswered.
pub struct DispatchQueue {
    sender: mpsc::Sender<DispatchTask>,
    runner: JoinHandle<()>,
}

impl DispatchQueue {
    /// Start the queue on the current runtime
    pub fn spawn<S, W>(store: Arc<S>, worker: Arc<W>, policy: DispatchPolicy) -> Self
    where
        S: JobStore + 'static,
        W: RenderWorker + 'static,
    {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let runner = tokio::spawn(run_queue(receiver, store, worker, policy));
        Self { sender, runner }
    }

    pub async fn enqueue(&self, task: DispatchTask) -> Result<()> {
        let job_id = task.job_id;
        self.sender
            .send(task)
            .await
            .map_err(|_| ExportError::Submission(format!("dispatch queue closed, job {} not queued", job_id)))?;
        tracing::debug!(%job_id, "Job queued for dispatch");
        Ok(())
    }

    /// Stop accepting tasks and wait for queued ones to finish delivery
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.runner.await {
            tracing::error!("Dispatch queue stopped abnormally: {}", e);
        }
    }
}

async fn run_queue<S, W>(
    mut receiver: mpsc::Receiver<DispatchTask>,
    store: Arc<S>,
    worker: Arc<W>,
    policy: DispatchPolicy,
) where
    S: JobStore + 'static,
    W: RenderWorker + 'static,
{
    let mut inflight = JoinSet::new();

    loop {
        tokio::select! {
            task = receiver.recv() => match task {
                Some(task) => {
                    inflight.spawn(deliver(Arc::clone(&store), Arc::clone(&worker), policy, task));
                }
                None => break,
            },
            Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!("Dispatch task panicked: {}", e);
                }
            }
        }
    }

    while let Some(joined) = inflight.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Dispatch task panicked: {}", e);
        }
    }
}

async fn deliver<S, W>(store: Arc<S>, worker: Arc<W>, policy: DispatchPolicy, task: DispatchTask)
where
    S: JobStore,
    W: RenderWorker,
{
    let job_id = task.job_id;
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match tokio::time::timeout(policy.timeout, worker.submit(&job_id, task.payload.clone())).await {
            Ok(Ok(())) => {
                tracing::debug!(%job_id, attempt, "Worker acknowledged job");
                return;
            }
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => last_error = format!("worker did not acknowledge within {:?}", policy.timeout),
        }

        tracing::warn!(%job_id, attempt, max_attempts, "Dispatch attempt failed: {}", last_error);
        if attempt < max_attempts {
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }

    let error = ExportError::Dispatch { job_id, message: last_error };
    tracing::error!(%job_id, "{}", error);

    match store.update(&job_id, JobUpdate::Failed { error: error.to_string() }).await {
        Ok(_) => {}
        Err(ExportError::InvalidTransition { from, .. }) => {
            tracing::debug!(%job_id, %from, "Job already settled, dispatch failure not recorded");
        }
        Err(e) => tracing::error!(%job_id, "Failed to mark job failed: {}", e),
    }
}
