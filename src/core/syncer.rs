use crate::domain::model::{JobOutcome, JobReport, SyncJob, SyncMode, SyncStats};
use crate::domain::ports::{Connector, RemoteDir};
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_pattern, validate_remote_dir};
use regex::Regex;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

/// Mirrors the matching files of one remote directory into `local_root/<cwd>`.
pub struct FtpSyncer<'a, C: Connector> {
    job: &'a SyncJob,
    connector: &'a C,
    pattern: Regex,
}

impl<'a, C: Connector> FtpSyncer<'a, C> {
    pub fn new(job: &'a SyncJob, connector: &'a C) -> Result<Self> {
        validate_job(job)?;
        let pattern = full_match_pattern(job.file_pattern())?;
        Ok(Self {
            job,
            connector,
            pattern,
        })
    }

    /// Remote names matching `file_reg`, without looking at the local disk.
    pub fn files_to_sync(&self) -> Result<Vec<String>> {
        let mut session = self.connector.connect(self.job)?;
        let files = self.matching_files(&mut session);
        session.close();
        files
    }

    /// Remote names that [`FtpSyncer::run`] would download in `mode`.
    pub fn files_to_update(&self, mode: SyncMode) -> Result<Vec<String>> {
        let mut session = self.connector.connect(self.job)?;
        let result = self.matching_files(&mut session).and_then(|files| {
            let mut pending = Vec::new();
            for name in files {
                if self.needs_download(&mut session, &name, mode)? {
                    pending.push(name);
                }
            }
            Ok(pending)
        });
        session.close();
        result
    }

    pub fn run(&self, mode: SyncMode) -> Result<SyncStats> {
        let local_dir = self.job.local_dir();
        fs::create_dir_all(&local_dir)?;

        let mut session = self.connector.connect(self.job)?;
        let files = self.matching_files(&mut session)?;
        let mut stats = SyncStats {
            matched: files.len(),
            ..SyncStats::default()
        };
        tracing::debug!("{}: {} files match '{}'", self.job.label(), files.len(), self.job.file_pattern());

        for name in files {
            let target = local_dir.join(base_name(&name));

            match self.needs_download(&mut session, &name, mode) {
                Ok(true) => {}
                Ok(false) => {
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!("{}: cannot check {}: {}", self.job.label(), name, e);
                    stats.failed += 1;
                    session = self.reconnect(session)?;
                    continue;
                }
            }

            tracing::info!("Downloading file {} to {} ...", name, target.display());
            let start = Instant::now();
            match download(&mut session, &name, &target) {
                Ok(bytes) => {
                    stats.downloaded += 1;
                    stats.bytes += bytes;
                    tracing::info!(
                        "Downloaded {} ({} bytes) in {:.1?}",
                        name,
                        bytes,
                        start.elapsed()
                    );
                }
                Err(e) => {
                    tracing::error!(
                        "{}: download of {} to {} failed after {:.1?}: {}",
                        self.job.label(),
                        name,
                        target.display(),
                        start.elapsed(),
                        e
                    );
                    stats.failed += 1;
                    session = self.reconnect(session)?;
                }
            }
        }

        session.close();
        Ok(stats)
    }

    fn matching_files(&self, session: &mut C::Session) -> Result<Vec<String>> {
        let entries = session.list()?;
        Ok(entries
            .into_iter()
            .filter(|entry| {
                let name = base_name(entry);
                !name.is_empty() && name != "." && name != ".." && self.pattern.is_match(name)
            })
            .collect())
    }

    fn needs_download(&self, session: &mut C::Session, name: &str, mode: SyncMode) -> Result<bool> {
        let target = self.job.local_dir().join(base_name(name));
        let local = match fs::metadata(&target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        };

        match mode {
            SyncMode::Override => Ok(true),
            SyncMode::NoOverride => {
                tracing::info!(
                    "{} already exists and won't be updated in `no_override` mode.",
                    target.display()
                );
                Ok(false)
            }
            SyncMode::Auto => match session.size(name)? {
                Some(remote) => Ok(remote != local.len()),
                None => Ok(true),
            },
        }
    }

    fn reconnect(&self, mut session: C::Session) -> Result<C::Session> {
        session.close();
        tracing::info!("Re-connecting to {}", self.job.label());
        self.connector.connect(self.job)
    }
}

/// Runs one job to completion, turning any failure into a failed report.
pub fn sync_job<C: Connector>(index: usize, job: &SyncJob, connector: &C, mode: SyncMode) -> JobReport {
    let label = job.label();
    tracing::info!("Job {} ({}) started", index, label);
    let start = Instant::now();

    let outcome = match FtpSyncer::new(job, connector).and_then(|syncer| syncer.run(mode)) {
        Ok(stats) => {
            tracing::info!(
                "Job {} ({}) finished in {:.1?}: {} matched, {} downloaded, {} skipped, {} failed",
                index,
                label,
                start.elapsed(),
                stats.matched,
                stats.downloaded,
                stats.skipped,
                stats.failed
            );
            JobOutcome::Completed(stats)
        }
        Err(e) => {
            tracing::error!("Job {} ({}) failed: {}", index, label, e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            JobOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    JobReport {
        index,
        label,
        outcome,
    }
}

pub fn validate_job(job: &SyncJob) -> Result<()> {
    validate_non_empty_string("host", &job.host)?;
    validate_remote_dir("cwd", &job.cwd)?;
    validate_path("local_root", &job.local_root.to_string_lossy())?;
    validate_pattern("file_reg", job.file_pattern())?;
    Ok(())
}

/// Anchors `pattern` so it has to match the whole file name.
pub fn full_match_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(SyncError::from)
}

/// Last `/`-separated component of a listing entry.
pub fn base_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// Temp files end in `.1`, e.g. `precip.1979.nc.Ab3xQz.1`.
pub const PARTIAL_SUFFIX: &str = ".1";

/// Streams into a temp file of its own next to `target` and moves it over
/// `target` once complete. On error the temp file is dropped, which removes it.
fn download<S: RemoteDir>(session: &mut S, name: &str, target: &Path) -> Result<u64> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let prefix = format!("{}.", base_name(name));
    let mut partial = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(PARTIAL_SUFFIX)
        .tempfile_in(dir)?;

    let bytes = session.retrieve(name, &mut partial)?;
    partial.flush()?;
    partial.as_file().sync_all()?;
    partial
        .persist(target)
        .map_err(|e| SyncError::IoError(e.error))?;
    Ok(bytes)
}
