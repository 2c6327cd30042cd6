pub mod settings;

#[cfg(feature = "cli")]
use crate::domain::model::SyncMode;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use settings::Overrides;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ftp-sync")]
#[command(about = "Download files matching a pattern from the FTP directories listed in a CSV")]
pub struct CliConfig {
    /// CSV with columns host,user,passwd,cwd,local_root,file_reg
    pub csv: PathBuf,

    /// Log file [default: logs.log]
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Number of jobs processed at once [default: 1]
    #[arg(long)]
    pub num_workers: Option<usize>,

    /// auto, override or no_override [default: auto]
    #[arg(long)]
    pub mode: Option<SyncMode>,

    /// Repeat the sync every day at this local time (HH:MM)
    #[arg(long)]
    pub daily_at: Option<String>,

    /// Optional TOML settings file; command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// FTP port for hosts without an explicit :port [default: 21]
    #[arg(long)]
    pub port: Option<u16>,

    /// Connect timeout in seconds [default: 30]
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            num_workers: self.num_workers,
            mode: self.mode,
            port: self.port,
            connect_timeout_seconds: self.timeout,
            log_file: self.log_file.clone(),
            daily_at: self.daily_at.clone(),
        }
    }
}
