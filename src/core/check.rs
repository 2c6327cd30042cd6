//! Dry run over a job list: what each row would sync and update, no downloads.

use crate::core::syncer::FtpSyncer;
use crate::domain::model::{SyncJob, SyncMode};
use crate::domain::ports::Connector;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub index: usize,
    pub label: String,
    pub files_to_sync: Vec<String>,
    pub files_to_update: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Checks one row. Failures end up in `error` next to whatever was listed before.
pub fn check_job<C: Connector>(index: usize, job: &SyncJob, connector: &C, mode: SyncMode) -> CheckReport {
    let mut report = CheckReport {
        index,
        label: job.label(),
        files_to_sync: Vec::new(),
        files_to_update: Vec::new(),
        error: None,
    };

    let result = FtpSyncer::new(job, connector).and_then(|syncer| {
        report.files_to_sync = syncer.files_to_sync()?;
        report.files_to_update = syncer.files_to_update(mode)?;
        Ok(())
    });
    if let Err(e) = result {
        tracing::debug!("check of {} failed: {}", report.label, e);
        report.error = Some(e.to_string());
    }
    report
}

/// One report per row, in CSV order. A failing row never stops the others.
pub fn check_jobs<C: Connector>(jobs: &[SyncJob], connector: &C, mode: SyncMode) -> Vec<CheckReport> {
    jobs.iter()
        .enumerate()
        .map(|(index, job)| check_job(index, job, connector, mode))
        .collect()
}
