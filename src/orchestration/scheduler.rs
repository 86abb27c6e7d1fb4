//! # Scheduler
//!
//! Submits a [`PrintJob::ScheduledRun`] to the job queue on a fixed interval. The first tick
//! fires immediately. Submission failures are logged and the loop keeps ticking.

use super::job_queue::{JobQueue, PrintJob};
use crate::config::SchedulerConfig;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Scheduler {
    queue: JobQueue,
    interval: Duration,
}

impl Scheduler {
    pub fn new(queue: JobQueue, interval: Duration) -> Self {
        Self { queue, interval }
    }

    pub fn from_config(queue: JobQueue, config: &SchedulerConfig) -> Self {
        Self::new(queue, config.interval())
    }

    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_seconds = self.interval.as_secs(), "Scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.queue.submit(PrintJob::ScheduledRun) {
                        warn!(error = %e, "Could not submit scheduled run");
                    }
                }
                _ = shutdown.recv() => {
                    info!("Scheduler shutting down");
                    break;
                }
            }
        }
    }
}
