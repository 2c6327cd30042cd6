use crate::config::settings::LogSettings;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber: compact output on stderr plus a plain-text
/// copy appended to the configured log file.
pub fn init_cli_logger(settings: &LogSettings, verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ftp_sync=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ftp_sync=info"))
    };

    let file_layer = match open_log_file(settings) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Arc::new(file)),
        ),
        Err(e) => {
            eprintln!(
                "⚠️ Cannot open log file {}: {} (logging to stderr only)",
                settings.log_file.display(),
                e
            );
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .with(file_layer)
        .init();
}

/// Stderr-only subscriber for helper tools that should not touch the log file.
pub fn init_stderr_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ftp_sync=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ftp_sync=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn open_log_file(settings: &LogSettings) -> io::Result<File> {
    if let Some(parent) = settings.log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    rotate_log_file(&settings.log_file, settings.max_bytes, settings.backups)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
}

/// Shifts `path` to `path.1` (and older backups up by one) once it grows past
/// `max_bytes`. At most `backups` old files are kept.
pub fn rotate_log_file(path: &Path, max_bytes: u64, backups: u32) -> io::Result<()> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if size <= max_bytes {
        return Ok(());
    }

    if backups == 0 {
        return fs::remove_file(path);
    }

    let oldest = backup_path(path, backups);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            fs::rename(&from, backup_path(path, n + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))
}

fn backup_path(path: &Path, n: u32) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_small_log_is_not_rotated() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("logs.log");
        fs::write(&log, b"short").unwrap();

        rotate_log_file(&log, 1024, 5).unwrap();

        assert!(log.exists());
        assert!(!backup_path(&log, 1).exists());
    }

    #[test]
    fn test_rotation_shifts_backups() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("logs.log");
        fs::write(&log, b"current-current").unwrap();
        fs::write(backup_path(&log, 1), b"one").unwrap();
        fs::write(backup_path(&log, 2), b"two").unwrap();

        rotate_log_file(&log, 4, 2).unwrap();

        assert!(!log.exists());
        assert_eq!(fs::read(backup_path(&log, 1)).unwrap(), b"current-current");
        assert_eq!(fs::read(backup_path(&log, 2)).unwrap(), b"one");
        assert!(!backup_path(&log, 3).exists());
    }

    #[test]
    fn test_missing_log_is_fine() {
        let dir = TempDir::new().unwrap();
        rotate_log_file(&dir.path().join("nope.log"), 1, 5).unwrap();
    }
}
