use crate::domain::model::SyncJob;
use crate::utils::error::Result;
use std::io::Write;

/// A logged-in session positioned at a job's remote directory.
pub trait RemoteDir {
    /// Entry names in the current directory.
    fn list(&mut self) -> Result<Vec<String>>;

    /// Remote size in bytes, `None` when the server cannot tell.
    fn size(&mut self, name: &str) -> Result<Option<u64>>;

    /// Streams `name` into `dest`, returning the number of bytes written.
    fn retrieve(&mut self, name: &str, dest: &mut dyn Write) -> Result<u64>;

    fn close(&mut self) {}
}

/// Opens sessions for jobs. Shared between workers.
pub trait Connector: Send + Sync {
    type Session: RemoteDir;

    fn connect(&self, job: &SyncJob) -> Result<Self::Session>;
}
