#![allow(dead_code)]

use ftp_sync::domain::ports::{Connector, RemoteDir};
use ftp_sync::{Result, SyncError, SyncJob};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct RemoteFolder {
    files: BTreeMap<String, Vec<u8>>,
    broken: HashSet<String>,
    hide_sizes: bool,
}

/// In-memory FTP servers keyed by `(host, cwd)`.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    folders: HashMap<(String, String), RemoteFolder>,
    connects: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, host: &str, cwd: &str, files: &[(&str, &str)]) -> Self {
        let folder = self.folder_mut(host, cwd);
        for (name, content) in files {
            folder.files.insert(name.to_string(), content.as_bytes().to_vec());
        }
        self
    }

    /// Transfers of `name` die halfway through.
    pub fn with_broken_file(mut self, host: &str, cwd: &str, name: &str) -> Self {
        self.folder_mut(host, cwd).broken.insert(name.to_string());
        self
    }

    /// SIZE is refused for every file in the folder.
    pub fn without_sizes(mut self, host: &str, cwd: &str) -> Self {
        self.folder_mut(host, cwd).hide_sizes = true;
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn folder_mut(&mut self, host: &str, cwd: &str) -> &mut RemoteFolder {
        self.folders
            .entry((host.to_string(), cwd.to_string()))
            .or_default()
    }
}

impl Connector for MemoryConnector {
    type Session = MemorySession;

    fn connect(&self, job: &SyncJob) -> Result<MemorySession> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if !self.folders.keys().any(|(host, _)| host == &job.host) {
            return Err(SyncError::ConnectionError {
                host: job.host.clone(),
                message: "Connection refused".to_string(),
            });
        }

        match self.folders.get(&(job.host.clone(), job.cwd.clone())) {
            Some(folder) => Ok(MemorySession {
                folder: folder.clone(),
            }),
            None => Err(SyncError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("550 {}: No such file or directory", job.cwd),
            ))),
        }
    }
}

pub struct MemorySession {
    folder: RemoteFolder,
}

impl RemoteDir for MemorySession {
    fn list(&mut self) -> Result<Vec<String>> {
        Ok(self.folder.files.keys().cloned().collect())
    }

    fn size(&mut self, name: &str) -> Result<Option<u64>> {
        if self.folder.hide_sizes {
            return Ok(None);
        }
        Ok(self.folder.files.get(name).map(|content| content.len() as u64))
    }

    fn retrieve(&mut self, name: &str, dest: &mut dyn Write) -> Result<u64> {
        let content = self.folder.files.get(name).ok_or_else(|| {
            SyncError::IoError(io::Error::new(io::ErrorKind::NotFound, name.to_string()))
        })?;

        if self.folder.broken.contains(name) {
            dest.write_all(&content[..content.len() / 2])?;
            return Err(SyncError::IoError(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        dest.write_all(content)?;
        Ok(content.len() as u64)
    }
}

pub fn job(host: &str, cwd: &str, local_root: &Path, file_reg: &str) -> SyncJob {
    SyncJob {
        host: host.to_string(),
        user: String::new(),
        passwd: String::new(),
        cwd: cwd.to_string(),
        local_root: local_root.to_path_buf(),
        file_reg: file_reg.to_string(),
    }
}

/// Every file under `root`, relative to it.
pub fn files_under(root: &Path) -> BTreeSet<PathBuf> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeSet<PathBuf>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if let Ok(relative) = path.strip_prefix(root) {
                out.insert(relative.to_path_buf());
            }
        }
    }

    let mut out = BTreeSet::new();
    walk(root, root, &mut out);
    out
}
