use anyhow::Context;
use clap::Parser;
use ftp_sync::config::settings::{Settings, SettingsFile};
use ftp_sync::core::schedule;
use ftp_sync::utils::{logger, validation::Validate};
use ftp_sync::{load_jobs, CliConfig, FtpConnector, RunSummary, SyncEngine};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入設定 (command line > --config file > defaults)
    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_cli_logger(&settings.log, cli.verbose);
    tracing::info!("Starting ftp-sync");
    tracing::debug!("Effective settings: {:?}", settings);

    if !cli.csv.exists() {
        tracing::error!("❌ CSV file {} doesn't exist.", cli.csv.display());
        eprintln!("❌ CSV file {} doesn't exist.", cli.csv.display());
        std::process::exit(1);
    }
    tracing::info!("Sync files specified in {}", cli.csv.display());

    let connector = FtpConnector::new(settings.port, settings.connect_timeout());
    let engine = SyncEngine::new(connector, settings.num_workers, settings.mode);

    match settings.daily_at_time()? {
        Some(at) => {
            tracing::info!("Scheduled mode: syncing now and then every day at {}", at.format("%H:%M"));
            if let Err(e) = schedule::run_scheduled(&engine, &cli.csv, at, schedule::ctrl_c()).await {
                tracing::error!("❌ Cannot read jobs from {}: {}", cli.csv.display(), e);
                eprintln!("❌ Cannot read jobs from {}: {}", cli.csv.display(), e);
                std::process::exit(1);
            }
            // Blocking transfers still in flight are abandoned with the process.
            std::process::exit(0);
        }
        None => {
            let summary = match sync_once(&engine, &cli.csv).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::error!("❌ {:#}", e);
                    eprintln!("❌ {:#}", e);
                    std::process::exit(1);
                }
            };
            println!(
                "✅ {} jobs completed, {} failed. See {} for details.",
                summary.completed(),
                summary.failed(),
                settings.log.log_file.display()
            );
        }
    }

    Ok(())
}

fn load_settings(cli: &CliConfig) -> anyhow::Result<Settings> {
    let file = match &cli.config {
        Some(path) => Some(
            SettingsFile::from_file(path)
                .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        ),
        None => None,
    };

    let settings = Settings::resolve(cli.overrides(), file);
    settings
        .validate()
        .context("Invalid configuration")?;
    Ok(settings)
}

async fn sync_once(engine: &SyncEngine<FtpConnector>, csv: &Path) -> anyhow::Result<RunSummary> {
    let jobs = load_jobs(csv).with_context(|| format!("Cannot read jobs from {}", csv.display()))?;
    Ok(engine.run(jobs).await)
}
