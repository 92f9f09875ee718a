use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::pipeline::IngestPipeline;
use crate::run_log::RunReport;

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub interval: Duration,
    pub run_on_start: bool,
    /// Where run reports are written. `None` keeps them in the log only.
    pub report_dir: Option<PathBuf>,
}

/// Handle to the background ingest loop.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    thread: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling new runs and wait for the loop to exit. A run already in
    /// progress finishes first, so this blocks; call it off the async runtime.
    pub fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if self.thread.join().is_err() {
            error!("Ingest scheduler thread panicked");
        }
    }
}

/// Start the ingest interval loop on a dedicated thread with its own runtime,
/// so pipeline runs never compete with request handlers.
pub fn start_ingest_interval(
    pipeline: Arc<IngestPipeline>,
    config: ScheduleConfig,
) -> Result<SchedulerHandle> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create ingest runtime")?;
    if Instant::now().checked_add(config.interval).is_none() {
        anyhow::bail!("Ingest interval of {:?} is out of range", config.interval);
    }
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    info!(
        interval_secs = config.interval.as_secs(),
        run_on_start = config.run_on_start,
        "Starting ingest interval loop"
    );

    let thread = std::thread::Builder::new()
        .name("ingest-scheduler".into())
        .spawn(move || {
            runtime.block_on(async move {
                if config.run_on_start {
                    run_and_report(&pipeline, &config).await;
                }

                let Some(first_tick) = Instant::now().checked_add(config.interval) else {
                    error!(interval = ?config.interval, "Ingest interval out of range");
                    return;
                };
                let mut ticker = tokio::time::interval_at(first_tick, config.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => run_and_report(&pipeline, &config).await,
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }
                info!("Ingest interval loop stopped");
            });
        })
        .context("Failed to spawn ingest scheduler thread")?;

    Ok(SchedulerHandle { shutdown, thread })
}

/// One scheduled run. A panic inside the pipeline is contained here so the
/// next interval still fires.
async fn run_and_report(pipeline: &Arc<IngestPipeline>, config: &ScheduleConfig) {
    let pipeline = pipeline.clone();
    let report = match tokio::spawn(async move { pipeline.run().await }).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Ingest run aborted");
            return;
        }
    };
    save_report(&report, config);
}

fn save_report(report: &RunReport, config: &ScheduleConfig) {
    if let Some(dir) = &config.report_dir {
        if let Err(e) = report.save(dir) {
            warn!(run_id = report.run_id.as_str(), error = %e, "Failed to save ingest run report");
        }
    }
}
