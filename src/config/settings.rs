use crate::adapters::ftp::DEFAULT_PORT;
use crate::core::job_list::substitute_env_vars;
use crate::domain::model::SyncMode;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{parse_time_of_day, validate_path, validate_range, Validate};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOG_FILE: &str = "logs.log";
pub const DEFAULT_LOG_MAX_BYTES: u64 = 20 * 1024;
pub const DEFAULT_LOG_BACKUPS: u32 = 5;
pub const DEFAULT_NUM_WORKERS: usize = 1;
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 30;
pub const MAX_NUM_WORKERS: usize = 100;

/// Optional `--config` TOML file; every key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSection {
    pub num_workers: Option<usize>,
    pub mode: Option<SyncMode>,
    pub port: Option<u16>,
    pub connect_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub log_file: Option<PathBuf>,
    pub max_bytes: Option<u64>,
    pub backups: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// Local time of day, `HH:MM`.
    pub daily_at: Option<String>,
}

impl SettingsFile {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// `${VAR}` references are replaced before parsing.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub log_file: PathBuf,
    pub max_bytes: u64,
    pub backups: u32,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            backups: DEFAULT_LOG_BACKUPS,
        }
    }
}

/// Values given on the command line; `None` falls through to the file, then the defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub num_workers: Option<usize>,
    pub mode: Option<SyncMode>,
    pub port: Option<u16>,
    pub connect_timeout_seconds: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub daily_at: Option<String>,
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub num_workers: usize,
    pub mode: SyncMode,
    pub port: u16,
    pub connect_timeout_seconds: u64,
    pub daily_at: Option<String>,
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_NUM_WORKERS,
            mode: SyncMode::default(),
            port: DEFAULT_PORT,
            connect_timeout_seconds: DEFAULT_CONNECT_TIMEOUT_SECONDS,
            daily_at: None,
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: Option<SettingsFile>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Settings::default();

        Settings {
            num_workers: overrides
                .num_workers
                .or(file.sync.num_workers)
                .unwrap_or(defaults.num_workers),
            mode: overrides.mode.or(file.sync.mode).unwrap_or(defaults.mode),
            port: overrides.port.or(file.sync.port).unwrap_or(defaults.port),
            connect_timeout_seconds: overrides
                .connect_timeout_seconds
                .or(file.sync.connect_timeout_seconds)
                .unwrap_or(defaults.connect_timeout_seconds),
            daily_at: overrides.daily_at.or(file.schedule.daily_at),
            log: LogSettings {
                log_file: overrides
                    .log_file
                    .or(file.logging.log_file)
                    .unwrap_or(defaults.log.log_file),
                max_bytes: file.logging.max_bytes.unwrap_or(defaults.log.max_bytes),
                backups: file.logging.backups.unwrap_or(defaults.log.backups),
            },
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn daily_at_time(&self) -> Result<Option<NaiveTime>> {
        self.daily_at
            .as_deref()
            .map(|value| parse_time_of_day("daily_at", value))
            .transpose()
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_range("num_workers", self.num_workers, 1, MAX_NUM_WORKERS)?;
        validate_range("connect_timeout_seconds", self.connect_timeout_seconds, 1, 3600)?;
        if self.port == 0 {
            return Err(SyncError::InvalidConfigValueError {
                field: "port".to_string(),
                value: "0".to_string(),
                reason: "Port must be non-zero".to_string(),
            });
        }
        validate_path("log_file", &self.log.log_file.to_string_lossy())?;
        self.daily_at_time()?;
        Ok(())
    }
}
