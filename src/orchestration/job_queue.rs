//! # Print Job Queue
//!
//! Every trigger, scheduled or on demand, becomes a [`PrintJob`] handed to a bounded queue.
//! A single [`JobWorker`] drains the queue, so at most one pipeline job touches the order
//! tables at a time and a reprint can never interleave with a scheduled run.
//!
//! Callers get a job id back immediately; progress and failures are recorded in the
//! [`JobRegistry`] and can be looked up by id.
//!
//! A scheduled run submitted while another scheduled run is still queued is coalesced into
//! the queued one. Only the most recent finished records are retained.
//!
//! ```rust
//! use print_fulfillment_core::orchestration::{JobQueue, JobState, PrintJob};
//!
//! # tokio_test::block_on(async {
//! let (queue, _worker) = JobQueue::new(4);
//! let id = queue.submit(PrintJob::ScheduledRun).unwrap();
//! assert_eq!(queue.submit(PrintJob::ScheduledRun).unwrap(), id);
//! assert_eq!(queue.status(id).unwrap().state, JobState::Queued);
//! # });
//! ```

use super::fulfillment_coordinator::FulfillmentCoordinator;
use crate::constants::pipeline::JOB_HISTORY_LIMIT;
use crate::error::{FulfillmentError, Result};
use crate::models::{ReprintSheetLabelRequest, ReprintSheetRequest, ReprintSingleLabelRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum PrintJob {
    ScheduledRun,
    ForcePrintRemaining,
    ReprintSingleLabel(ReprintSingleLabelRequest),
    ReprintSheetLabels(ReprintSheetLabelRequest),
    ReprintSheet(ReprintSheetRequest),
}

impl PrintJob {
    pub fn kind(&self) -> &'static str {
        match self {
            PrintJob::ScheduledRun => "scheduled_run",
            PrintJob::ForcePrintRemaining => "force_print_remaining",
            PrintJob::ReprintSingleLabel(_) => "reprint_single_label",
            PrintJob::ReprintSheetLabels(_) => "reprint_sheet_labels",
            PrintJob::ReprintSheet(_) => "reprint_sheet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed { error: String },
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub kind: &'static str,
    #[serde(flatten)]
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Status of submitted jobs, by id. Unfinished jobs are always kept; finished ones beyond
/// `retained_finished` are evicted oldest first.
#[derive(Debug)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, JobRecord>>,
    retained_finished: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(JOB_HISTORY_LIMIT)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retained_finished: usize) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retained_finished,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Register a new job, or return the id of a queued scheduled run it coalesces into.
    /// The boolean is true when a new job was registered.
    fn register(&self, job: &PrintJob) -> (Uuid, bool) {
        let mut jobs = self.jobs.write();

        if matches!(job, PrintJob::ScheduledRun) {
            let queued = jobs.values().find(|record| {
                record.kind == job.kind() && record.state == JobState::Queued
            });
            if let Some(record) = queued {
                return (record.id, false);
            }
        }

        let id = Uuid::new_v4();
        jobs.insert(
            id,
            JobRecord {
                id,
                kind: job.kind(),
                state: JobState::Queued,
                submitted_at: Utc::now(),
                started_at: None,
                finished_at: None,
            },
        );
        (id, true)
    }

    fn mark_running(&self, id: Uuid) {
        if let Some(record) = self.jobs.write().get_mut(&id) {
            record.state = JobState::Running;
            record.started_at = Some(Utc::now());
        }
    }

    fn mark_finished(&self, id: Uuid, state: JobState) {
        let mut jobs = self.jobs.write();
        if let Some(record) = jobs.get_mut(&id) {
            record.state = state;
            record.finished_at = Some(Utc::now());
        }
        Self::evict_finished(&mut jobs, self.retained_finished);
    }

    fn evict_finished(jobs: &mut HashMap<Uuid, JobRecord>, retained: usize) {
        let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
            .values()
            .filter(|record| record.state.is_finished())
            .map(|record| (record.finished_at.unwrap_or(record.submitted_at), record.id))
            .collect();
        if finished.len() <= retained {
            return;
        }

        finished.sort_unstable();
        let excess = finished.len() - retained;
        for (_, id) in finished.into_iter().take(excess) {
            jobs.remove(&id);
        }
        debug!(evicted = excess, "Evicted finished job records");
    }
}

/// Executes one job to completion
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &PrintJob) -> Result<()>;
}

#[async_trait]
impl JobHandler for FulfillmentCoordinator {
    async fn handle(&self, job: &PrintJob) -> Result<()> {
        match job {
            PrintJob::ScheduledRun => self.print_sheets_and_labels().await.map(|_| ()),
            PrintJob::ForcePrintRemaining => self.force_print_remaining().await.map(|_| ()),
            PrintJob::ReprintSingleLabel(request) => {
                self.reprint_single_label(request).await.map(|_| ())
            }
            PrintJob::ReprintSheetLabels(request) => {
                self.reprint_sheet_labels(request).await.map(|_| ())
            }
            PrintJob::ReprintSheet(request) => self.reprint_sheet(request).await,
        }
    }
}

#[derive(Debug)]
struct QueuedJob {
    id: Uuid,
    job: PrintJob,
}

/// Submission side of the queue
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<QueuedJob>,
    registry: Arc<JobRegistry>,
}

impl JobQueue {
    /// A queue holding at most `capacity` waiting jobs, and the worker that drains it
    pub fn new(capacity: usize) -> (Self, JobWorker) {
        Self::with_registry(capacity, JobRegistry::new())
    }

    pub fn with_registry(capacity: usize, registry: JobRegistry) -> (Self, JobWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let registry = Arc::new(registry);
        (
            Self {
                sender,
                registry: Arc::clone(&registry),
            },
            JobWorker { receiver, registry },
        )
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn status(&self, id: Uuid) -> Option<JobRecord> {
        self.registry.get(id)
    }

    pub fn submit(&self, job: PrintJob) -> Result<Uuid> {
        let (id, is_new) = self.registry.register(&job);
        if !is_new {
            debug!(job_id = %id, "Scheduled run already queued");
            return Ok(id);
        }

        let kind = job.kind();
        match self.sender.try_send(QueuedJob { id, job }) {
            Ok(()) => {
                info!(job_id = %id, kind, "Job queued");
                Ok(id)
            }
            Err(e) => {
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "job queue is full",
                    mpsc::error::TrySendError::Closed(_) => "job worker has stopped",
                };
                self.registry.mark_finished(
                    id,
                    JobState::Failed {
                        error: reason.to_string(),
                    },
                );
                warn!(job_id = %id, kind, reason, "Job rejected");
                Err(FulfillmentError::Queue(reason.to_string()))
            }
        }
    }
}

/// The single consumer of the queue
#[derive(Debug)]
pub struct JobWorker {
    receiver: mpsc::Receiver<QueuedJob>,
    registry: Arc<JobRegistry>,
}

impl JobWorker {
    pub fn spawn(
        self,
        handler: Arc<dyn JobHandler>,
        shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(handler, shutdown))
    }

    /// Run jobs one at a time until shutdown or until every queue handle is dropped.
    /// A job in progress always runs to completion; jobs still waiting at shutdown are
    /// marked failed.
    pub async fn run(mut self, handler: Arc<dyn JobHandler>, mut shutdown: broadcast::Receiver<()>) {
        info!("Job worker started");

        loop {
            let queued = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Job worker shutting down");
                    self.abandon_waiting_jobs();
                    break;
                }
                queued = self.receiver.recv() => queued,
            };

            let Some(QueuedJob { id, job }) = queued else {
                info!("Job queue closed");
                break;
            };

            self.registry.mark_running(id);
            info!(job_id = %id, kind = job.kind(), "Job started");

            match handler.handle(&job).await {
                Ok(()) => {
                    self.registry.mark_finished(id, JobState::Succeeded);
                    info!(job_id = %id, kind = job.kind(), "Job succeeded");
                }
                Err(e) => {
                    error!(job_id = %id, kind = job.kind(), error = %e, "Job failed");
                    self.registry.mark_finished(
                        id,
                        JobState::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            }
        }
    }

    fn abandon_waiting_jobs(&mut self) {
        self.receiver.close();
        while let Ok(QueuedJob { id, job }) = self.receiver.try_recv() {
            warn!(job_id = %id, kind = job.kind(), "Job abandoned at shutdown");
            self.registry.mark_finished(
                id,
                JobState::Failed {
                    error: "shutdown".to_string(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks how many jobs run at once; fails reprints of negative ids
    #[derive(Default)]
    struct CountingHandler {
        running: AtomicUsize,
        max_running: AtomicUsize,
        handled: AtomicUsize,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn handle(&self, job: &PrintJob) -> Result<()> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.handled.fetch_add(1, Ordering::SeqCst);

            match job {
                PrintJob::ReprintSingleLabel(request) if request.order_custom_id < 0 => {
                    Err(FulfillmentError::NotFound("order custom".to_string()))
                }
                _ => Ok(()),
            }
        }
    }

    async fn wait_until_finished(queue: &JobQueue, id: Uuid) -> JobRecord {
        for _ in 0..200 {
            if let Some(record) = queue.status(id) {
                if record.state.is_finished() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {id} did not finish");
    }

    #[tokio::test]
    async fn test_jobs_run_one_at_a_time() {
        let (queue, worker) = JobQueue::new(16);
        let handler = Arc::new(CountingHandler::default());
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        worker.spawn(handler.clone(), shutdown_rx);

        let ids: Vec<Uuid> = vec![
            queue.submit(PrintJob::ScheduledRun).unwrap(),
            queue.submit(PrintJob::ForcePrintRemaining).unwrap(),
            queue
                .submit(PrintJob::ReprintSingleLabel(ReprintSingleLabelRequest {
                    order_custom_id: 1,
                }))
                .unwrap(),
        ];

        for id in ids {
            assert_eq!(wait_until_finished(&queue, id).await.state, JobState::Succeeded);
        }
        assert_eq!(handler.max_running.load(Ordering::SeqCst), 1);
        assert_eq!(handler.handled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_job_records_error() {
        let (queue, worker) = JobQueue::new(4);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        worker.spawn(Arc::new(CountingHandler::default()), shutdown_rx);

        let id = queue
            .submit(PrintJob::ReprintSingleLabel(ReprintSingleLabelRequest {
                order_custom_id: -1,
            }))
            .unwrap();

        let record = wait_until_finished(&queue, id).await;
        assert!(matches!(record.state, JobState::Failed { .. }));
        assert!(record.started_at.is_some());
        assert!(record.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_queued_scheduled_runs_coalesce() {
        let (queue, _worker) = JobQueue::new(4);

        let first = queue.submit(PrintJob::ScheduledRun).unwrap();
        let second = queue.submit(PrintJob::ScheduledRun).unwrap();
        let forced = queue.submit(PrintJob::ForcePrintRemaining).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, forced);
        assert_eq!(queue.registry().len(), 2);
        assert_eq!(queue.status(first).unwrap().state, JobState::Queued);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_job() {
        let (queue, _worker) = JobQueue::new(1);

        queue.submit(PrintJob::ForcePrintRemaining).unwrap();
        let err = queue.submit(PrintJob::ForcePrintRemaining).unwrap_err();

        assert!(matches!(err, FulfillmentError::Queue(_)));
        assert_eq!(queue.registry().len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_worker() {
        let (queue, worker) = JobQueue::new(4);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = worker.spawn(Arc::new(CountingHandler::default()), shutdown_rx);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        let id = queue.submit(PrintJob::ScheduledRun);
        assert!(id.is_err());
    }

    #[tokio::test]
    async fn test_registry_keeps_only_recent_finished_jobs() {
        let (queue, worker) = JobQueue::with_registry(16, JobRegistry::with_retention(3));
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        worker.spawn(Arc::new(CountingHandler::default()), shutdown_rx);

        let ids: Vec<Uuid> = (0..10)
            .map(|_| queue.submit(PrintJob::ForcePrintRemaining).unwrap())
            .collect();
        wait_until_finished(&queue, ids[9]).await;

        assert_eq!(queue.registry().len(), 3);
        assert!(queue.status(ids[0]).is_none());
        for id in &ids[7..] {
            assert_eq!(queue.status(*id).unwrap().state, JobState::Succeeded);
        }
    }

    #[tokio::test]
    async fn test_eviction_never_drops_unfinished_jobs() {
        let (queue, _worker) = JobQueue::with_registry(4, JobRegistry::with_retention(0));

        let waiting = queue.submit(PrintJob::ForcePrintRemaining).unwrap();
        queue.registry().mark_finished(
            Uuid::new_v4(),
            JobState::Failed {
                error: "unknown".to_string(),
            },
        );

        assert_eq!(queue.registry().len(), 1);
        assert_eq!(queue.status(waiting).unwrap().state, JobState::Queued);
    }

    #[tokio::test]
    async fn test_shutdown_fails_jobs_still_waiting() {
        let (queue, worker) = JobQueue::new(4);
        let handler = Arc::new(CountingHandler::default());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let first = queue.submit(PrintJob::ScheduledRun).unwrap();
        let second = queue.submit(PrintJob::ForcePrintRemaining).unwrap();
        shutdown_tx.send(()).unwrap();
        worker.run(handler.clone(), shutdown_rx).await;

        assert_eq!(handler.handled.load(Ordering::SeqCst), 0);
        for id in [first, second] {
            let record = queue.status(id).unwrap();
            assert_eq!(
                record.state,
                JobState::Failed {
                    error: "shutdown".to_string()
                }
            );
            assert!(record.finished_at.is_some());
        }
    }

    #[test]
    fn test_job_record_serializes_flat_state() {
        let record = JobRecord {
            id: Uuid::nil(),
            kind: "reprint_sheet",
            state: JobState::Failed {
                error: "refused".to_string(),
            },
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["state"], "failed");
        assert_eq!(value["error"], "refused");
        assert_eq!(value["kind"], "reprint_sheet");
    }
}
