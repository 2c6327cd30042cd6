pub mod check;
pub mod engine;
pub mod job_list;
pub mod schedule;
pub mod syncer;

pub use crate::domain::model::{JobReport, RunSummary, SyncJob, SyncMode, SyncStats};
pub use crate::domain::ports::{Connector, RemoteDir};
pub use crate::utils::error::Result;
