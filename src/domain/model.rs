use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Pattern used when a row leaves `file_reg` blank.
pub const MATCH_ALL: &str = ".+";

/// One row of the job CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncJob {
    pub host: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub passwd: String,
    pub cwd: String,
    pub local_root: PathBuf,
    #[serde(default)]
    pub file_reg: String,
}

impl SyncJob {
    /// Local directory mirroring `cwd` under `local_root`.
    pub fn local_dir(&self) -> PathBuf {
        self.remote_segments()
            .fold(self.local_root.clone(), |dir, segment| dir.join(segment))
    }

    pub fn label(&self) -> String {
        format!("{}:/{}", self.host, self.remote_segments().collect::<Vec<_>>().join("/"))
    }

    pub fn file_pattern(&self) -> &str {
        if self.file_reg.trim().is_empty() {
            MATCH_ALL
        } else {
            &self.file_reg
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user.trim().is_empty()
    }

    fn remote_segments(&self) -> impl Iterator<Item = &str> {
        self.cwd
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
    }
}

/// How an already existing local file is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Download when the local file is missing or its size differs.
    #[default]
    Auto,
    Override,
    NoOverride,
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(SyncMode::Auto),
            "override" => Ok(SyncMode::Override),
            "no_override" => Ok(SyncMode::NoOverride),
            other => Err(format!(
                "unknown sync mode '{}' (expected auto, override or no_override)",
                other
            )),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncMode::Auto => "auto",
            SyncMode::Override => "override",
            SyncMode::NoOverride => "no_override",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub matched: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl SyncStats {
    pub fn merge(&mut self, other: &SyncStats) {
        self.matched += other.matched;
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.bytes += other.bytes;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed(SyncStats),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// Position of the job in the CSV (0-based, header excluded).
    pub index: usize,
    pub label: String,
    pub outcome: JobOutcome,
}

impl JobReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, JobOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub reports: Vec<JobReport>,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_failed()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }

    pub fn totals(&self) -> SyncStats {
        let mut totals = SyncStats::default();
        for report in &self.reports {
            if let JobOutcome::Completed(stats) = &report.outcome {
                totals.merge(stats);
            }
        }
        totals
    }
}
