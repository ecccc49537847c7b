use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::WorkerConfig;
use crate::domain::marshal_push;
use crate::error::JobError;
use crate::handle::JobHandle;
use crate::job::Job;
use crate::observability::{WorkerCounts, WorkerStats};
use crate::ports::RemoteQueue;
use crate::runtime::Runtime;

/// How a processed job was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handler succeeded; job acknowledged.
    Deleted,

    /// Handler failed; job re-published for another attempt.
    Released { delay: Duration },

    /// Out of tries; job deleted without running the handler.
    Failed,
}

/// Run one job through its handler and finalize it.
///
/// - attempts > max_tries: delete without running (`Failed`)
/// - handler ok: delete (`Deleted`)
/// - handler error: release with backoff (`Released`)
pub async fn process_job(
    runtime: &Runtime,
    job: &mut dyn Job,
    config: &WorkerConfig,
) -> Result<Outcome, JobError> {
    let payload = job.payload()?;
    let attempts = payload.attempts();

    if config.exceeds_max_tries(attempts) {
        error!(
            message_id = %job.job_id(),
            job = payload.job().unwrap_or_default(),
            attempts,
            max_tries = config.max_tries,
            "job has been attempted too many times"
        );
        job.delete().await?;
        return Ok(Outcome::Failed);
    }

    match runtime.execute(&payload).await {
        Ok(()) => {
            job.delete().await?;
            debug!(message_id = %job.job_id(), attempts, "job processed");
            Ok(Outcome::Deleted)
        }
        Err(err) => {
            let delay = config.retry.next_delay(attempts);
            warn!(
                message_id = %job.job_id(),
                job = payload.job().unwrap_or_default(),
                attempts,
                delay_secs = delay.as_secs(),
                error = %err,
                "job failed; releasing"
            );
            job.release(delay).await?;
            Ok(Outcome::Released { delay })
        }
    }
}

/// Push-mode entry point: the service delivered a message to us.
///
/// `Ok` means the callback may answer with success, which acknowledges the message.
pub async fn receive_pushed(
    remote: Arc<dyn RemoteQueue>,
    runtime: &Runtime,
    config: &WorkerConfig,
    headers: &HashMap<String, String>,
    body: impl Into<String>,
) -> Result<Outcome, JobError> {
    let message = marshal_push(headers, body)?;
    let mut handle = JobHandle::new(remote, message);
    process_job(runtime, &mut handle, config).await
}

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pull worker group handle.
/// - `request_shutdown` でワーカー全体が止まる（処理中のジョブは最後まで実行）
/// - `shutdown_and_join()` で全ワーカーの終了を待てる
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl WorkerGroup {
    /// Spawn `config.workers` pull workers.
    pub fn spawn(
        remote: Arc<dyn RemoteQueue>,
        runtime: Arc<Runtime>,
        config: WorkerConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(WorkerStats::default());
        let config = Arc::new(config);

        let mut joins = Vec::with_capacity(config.workers);
        for worker_id in 0..config.workers {
            let remote = Arc::clone(&remote);
            let runtime = Arc::clone(&runtime);
            let config = Arc::clone(&config);
            let stats = Arc::clone(&stats);
            let mut rx = shutdown_rx.clone();

            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, remote, runtime, config, stats, &mut rx).await;
            }));
        }

        info!(workers = config.workers, queue = %config.queue, "worker group started");
        Self {
            shutdown_tx,
            joins,
            stats,
        }
    }

    pub fn counts(&self) -> WorkerCounts {
        self.stats.snapshot()
    }

    /// Poll the counters until `done` holds or `timeout` elapses.
    ///
    /// Returns the matching snapshot, or `None` on timeout. The workers keep
    /// running either way.
    pub async fn wait_until(
        &self,
        timeout: Duration,
        mut done: impl FnMut(&WorkerCounts) -> bool,
    ) -> Option<WorkerCounts> {
        let poll = async {
            loop {
                let counts = self.counts();
                if done(&counts) {
                    return counts;
                }
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.ok()
    }

    /// Stop taking new messages. In-flight jobs are finished.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) -> WorkerCounts {
        self.request_shutdown();
        for j in self.joins {
            let _ = j.await;
        }
        self.stats.snapshot()
    }
}

/// One pull worker: reserve, process, repeat until shutdown.
///
/// A job that fails to process is logged and counted in `errors`, and its
/// handle is left unfinalized. For a body that does not decode, that means
/// nothing is sent to the remote and the message stays reserved until the
/// service's own reservation timeout returns it (the in-memory remote never
/// does).
async fn worker_loop(
    worker_id: usize,
    remote: Arc<dyn RemoteQueue>,
    runtime: Arc<Runtime>,
    config: Arc<WorkerConfig>,
    stats: Arc<WorkerStats>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let reserved = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            reserved = remote.reserve(&config.queue) => reserved,
        };

        let message = match reserved {
            Ok(Some(message)) => message,
            Ok(None) => {
                idle(shutdown_rx, config.poll_interval()).await;
                continue;
            }
            Err(e) => {
                warn!(worker_id, queue = %config.queue, error = %e, "reserve failed");
                idle(shutdown_rx, config.poll_interval()).await;
                continue;
            }
        };

        let mut handle = JobHandle::new(Arc::clone(&remote), message);
        match process_job(&runtime, &mut handle, &config).await {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                stats.record_error();
                error!(
                    worker_id,
                    message_id = %handle.job_id(),
                    job_lost = e.is_job_lost(),
                    error = %e,
                    "could not process job"
                );
            }
        }
    }
    debug!(worker_id, "worker stopped");
}

/// Sleep for `interval`, waking early on shutdown.
async fn idle(shutdown_rx: &mut watch::Receiver<bool>, interval: Duration) {
    tokio::select! {
        _ = shutdown_rx.changed() => {}
        _ = tokio::time::sleep(interval) => {}
    }
}
