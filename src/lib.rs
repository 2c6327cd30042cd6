pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::ftp::FtpConnector;
pub use config::settings::{Settings, SettingsFile};
pub use crate::core::{engine::SyncEngine, job_list::load_jobs, syncer::FtpSyncer};
pub use domain::model::{JobOutcome, JobReport, RunSummary, SyncJob, SyncMode, SyncStats};
pub use utils::error::{Result, SyncError};
