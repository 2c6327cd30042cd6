use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("FTP error: {0}")]
    FtpError(#[from] suppaftp::FtpError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid file pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Missing required column '{column}' in {path}")]
    MissingColumnError { column: String, path: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Connection to {host} failed: {message}")]
    ConnectionError { host: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Filesystem,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::FtpError(_) | SyncError::ConnectionError { .. } => ErrorCategory::Network,
            SyncError::CsvError(_)
            | SyncError::PatternError(_)
            | SyncError::TomlError(_)
            | SyncError::MissingColumnError { .. }
            | SyncError::InvalidConfigValueError { .. } => ErrorCategory::Input,
            SyncError::IoError(_) => ErrorCategory::Filesystem,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check the host name, credentials and that the remote directory exists"
            }
            ErrorCategory::Input => {
                "Check the CSV columns (host,user,passwd,cwd,local_root,file_reg) and the command line"
            }
            ErrorCategory::Filesystem => {
                "Check that local_root is writable and the disk is not full"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
