use crate::domain::model::SyncJob;
use crate::utils::error::{Result, SyncError};
use csv::{ReaderBuilder, Trim};
use regex::{Captures, Regex};
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

const REQUIRED_COLUMNS: [&str; 3] = ["host", "cwd", "local_root"];

/// Loads every job row from a CSV file with a `host,user,passwd,cwd,local_root,file_reg` header.
pub fn load_jobs<P: AsRef<Path>>(path: P) -> Result<Vec<SyncJob>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    read_jobs(file, &path.display().to_string())
}

/// Same as [`load_jobs`] over any reader; `source` names it in error messages.
pub fn read_jobs<R: Read>(input: R, source: &str) -> Result<Vec<SyncJob>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(SyncError::MissingColumnError {
                column: column.to_string(),
                path: source.to_string(),
            });
        }
    }

    let mut jobs = Vec::new();
    for row in reader.deserialize::<SyncJob>() {
        let mut job = row?;
        job.user = substitute_env_vars(&job.user);
        job.passwd = substitute_env_vars(&job.passwd);
        jobs.push(job);
    }

    tracing::debug!("Loaded {} jobs from {}", jobs.len(), source);
    Ok(jobs)
}

/// Replaces `${VAR}` with the value of `VAR`; unknown variables are left as written.
pub fn substitute_env_vars(content: &str) -> String {
    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

    re.replace_all(content, |caps: &Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}
