use anyhow::Context;
use clap::Parser;
use ftp_sync::adapters::ftp::DEFAULT_PORT;
use ftp_sync::core::check::{check_jobs, CheckReport};
use ftp_sync::utils::logger;
use ftp_sync::{load_jobs, FtpConnector, SyncMode};
use std::path::PathBuf;
use std::time::Duration;

/// Checks that each CSV row reaches the remote files it is meant to, without downloading.
#[derive(Parser)]
#[command(name = "check-csv")]
#[command(about = "List the files each CSV row would sync and update")]
struct Args {
    /// CSV filepath
    csv: PathBuf,

    /// Sync mode used to decide which files need an update
    #[arg(long, default_value = "auto")]
    mode: SyncMode,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Connect timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_stderr_logger(args.verbose);

    let jobs = load_jobs(&args.csv)
        .with_context(|| format!("Cannot read jobs from {}", args.csv.display()))?;
    let connector = FtpConnector::new(args.port, Duration::from_secs(args.timeout));

    let reports = check_jobs(&jobs, &connector, args.mode);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    Ok(())
}

fn print_report(report: &CheckReport) {
    println!("# [{}] {}", report.index, report.label);
    println!("===========  File list to sync: ===========");
    for file in &report.files_to_sync {
        println!("{}", file);
    }
    println!("=========== File list to update: ===========");
    for file in &report.files_to_update {
        println!("{}", file);
    }
    match &report.error {
        Some(error) => {
            println!("❌ Check failed: {}", error);
        }
        None => println!("✅ Done!"),
    }
    println!();
}
