use crate::core::engine::SyncEngine;
use crate::core::job_list::load_jobs;
use crate::domain::ports::Connector;
use crate::utils::error::Result;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::path::Path;

/// Next moment at `at`: today if it is still ahead of `now`, otherwise tomorrow.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Calls `run` once right away and then every day at `at` (local time) until
/// `stop` resolves. `stop` is polled for the whole loop, so it also cuts a run
/// short.
pub async fn run_daily<F, Fut, S>(at: NaiveTime, stop: S, mut run: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    S: Future<Output = ()>,
{
    tokio::pin!(stop);
    loop {
        tokio::select! {
            _ = run() => {}
            _ = &mut stop => {
                tracing::info!("Stop requested during a sync, stopping the scheduler.");
                return;
            }
        }

        let now = Local::now().naive_local();
        let next = next_run_after(now, at);
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::info!("Next scheduled sync at {} (in {:?})", next.format("%Y-%m-%d %H:%M"), wait);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = &mut stop => {
                tracing::info!("Stop requested, stopping the scheduler.");
                return;
            }
        }
    }
}

/// Runs the jobs in `csv` now and then daily at `at` until `stop` resolves.
///
/// The CSV is read once before anything runs and a bad file is returned as an
/// error. Later runs re-read it; if that fails the run is skipped and the
/// scheduler keeps going.
pub async fn run_scheduled<C, S>(engine: &SyncEngine<C>, csv: &Path, at: NaiveTime, stop: S) -> Result<()>
where
    C: Connector + 'static,
    S: Future<Output = ()>,
{
    let mut preloaded = Some(load_jobs(csv)?);

    run_daily(at, stop, move || {
        let jobs = preloaded.take();
        async move {
            let jobs = match jobs {
                Some(jobs) => jobs,
                None => match load_jobs(csv) {
                    Ok(jobs) => jobs,
                    Err(e) => {
                        tracing::error!("❌ Scheduled sync skipped: cannot read jobs from {}: {}", csv.display(), e);
                        return;
                    }
                },
            };
            engine.run(jobs).await;
        }
    })
    .await;
    Ok(())
}

/// Resolves on the first Ctrl-C. Create it once and keep it alive so the
/// signal is caught at any point of the loop.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("ctrl-c is pressed.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration as StdDuration;
    use tokio::sync::oneshot;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn moment(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_later_today() {
        assert_eq!(next_run_after(moment(10, 0, 15), at(1, 30)), moment(10, 1, 30));
    }

    #[test]
    fn test_already_passed_rolls_to_tomorrow() {
        assert_eq!(next_run_after(moment(10, 2, 0), at(1, 30)), moment(11, 1, 30));
        assert_eq!(next_run_after(moment(10, 1, 30), at(1, 30)), moment(11, 1, 30));
    }

    #[test]
    fn test_month_boundary() {
        let end_of_feb = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(next_run_after(end_of_feb, at(0, 0)), expected);
    }

    #[tokio::test]
    async fn test_run_daily_runs_now_then_waits() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut stop_tx = Some(stop_tx);

        let counter = Arc::clone(&runs);
        let stopped = tokio::time::timeout(
            StdDuration::from_secs(5),
            run_daily(at(0, 0), async { stop_rx.await.ok(); }, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                // Ask to stop during the first run.
                if let Some(tx) = stop_tx.take() {
                    let _ = tx.send(());
                }
                async {}
            }),
        )
        .await;

        assert!(stopped.is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_cuts_a_running_sync_short() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let stopped = tokio::time::timeout(
            StdDuration::from_secs(5),
            run_daily(at(0, 0), tokio::time::sleep(StdDuration::from_millis(50)), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<()>()
            }),
        )
        .await;

        assert!(stopped.is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
