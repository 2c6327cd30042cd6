//! Runs a job list with up to `num_workers` jobs in flight.
//!
//! FTP transfers block, so every job runs on tokio's blocking pool. A finished
//! job frees its slot for the next one in CSV order; completion order is not
//! guaranteed.

use crate::core::syncer::sync_job;
use crate::domain::model::{JobOutcome, JobReport, RunSummary, SyncJob, SyncMode};
use crate::domain::ports::Connector;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

pub struct SyncEngine<C: Connector + 'static> {
    connector: Arc<C>,
    num_workers: usize,
    mode: SyncMode,
}

impl<C: Connector + 'static> SyncEngine<C> {
    pub fn new(connector: C, num_workers: usize, mode: SyncMode) -> Self {
        Self {
            connector: Arc::new(connector),
            num_workers: num_workers.max(1),
            mode,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Attempts every job. Failures are logged and reported, never propagated.
    pub async fn run(&self, jobs: Vec<SyncJob>) -> RunSummary {
        let start = Instant::now();
        let total = jobs.len();
        tracing::info!(
            "Sync start: {} jobs, {} workers, mode {}",
            total,
            self.num_workers,
            self.mode
        );

        let mut queue = jobs.into_iter().enumerate();
        let mut join_set = JoinSet::new();
        let mut reports = Vec::with_capacity(total);
        // Jobs spawned but not yet reported, by CSV index.
        let mut in_flight = BTreeMap::new();

        loop {
            while join_set.len() < self.num_workers {
                let Some((index, job)) = queue.next() else {
                    break;
                };
                let connector = Arc::clone(&self.connector);
                let mode = self.mode;
                in_flight.insert(index, job.label());
                join_set.spawn_blocking(move || run_isolated(index, job, connector.as_ref(), mode));
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };

            match joined {
                Ok(report) => {
                    in_flight.remove(&report.index);
                    reports.push(report);
                }
                Err(e) => tracing::error!("Worker task join: {}", e),
            }
        }

        for (index, label) in in_flight {
            tracing::error!("Job {} ({}) never reported back", index, label);
            reports.push(failed_report(index, label, "worker task was lost".to_string()));
        }

        reports.sort_by_key(|report| report.index);
        let summary = RunSummary { reports };
        let totals = summary.totals();
        tracing::info!(
            "Sync complete in {:.1?}: {} jobs ok, {} failed; {} files downloaded ({} bytes), {} skipped, {} failed",
            start.elapsed(),
            summary.completed(),
            summary.failed(),
            totals.downloaded,
            totals.bytes,
            totals.skipped,
            totals.failed
        );
        summary
    }
}

/// A panicking job becomes a failed report instead of taking the run down.
fn run_isolated<C: Connector>(index: usize, job: SyncJob, connector: &C, mode: SyncMode) -> JobReport {
    match panic::catch_unwind(AssertUnwindSafe(|| sync_job(index, &job, connector, mode))) {
        Ok(report) => report,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            let label = job.label();
            tracing::error!("Job {} ({}) panicked: {}", index, label, message);
            failed_report(index, label, format!("worker panicked: {}", message))
        }
    }
}

fn failed_report(index: usize, label: String, error: String) -> JobReport {
    JobReport {
        index,
        label,
        outcome: JobOutcome::Failed { error },
    }
}
