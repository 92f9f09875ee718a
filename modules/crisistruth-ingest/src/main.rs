use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crisistruth_common::{CategoryTable, Config, ImpactSource, RandomImpact};
use crisistruth_ingest::{start_ingest_interval, IngestPipeline, ScheduleConfig};

#[derive(Parser)]
#[command(name = "ingest", about = "Collect, verify, and index news and flagged claims")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and exit.
    RunOnce,
    /// Run the pipeline on its interval until interrupted.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;
    config.log_summary();

    let cli = Cli::parse();

    let fact_checker = fact_checker_client::connect_optional(
        config.fact_checker_url.as_deref(),
        config.fact_checker_timeout,
    )
    .await;
    let categories = Arc::new(CategoryTable::load(config.category_table_path.as_deref())?);
    let impact: Arc<dyn ImpactSource> = Arc::new(RandomImpact::from_os_rng());
    let pipeline = Arc::new(IngestPipeline::from_config(
        &config,
        fact_checker,
        categories,
        impact,
    )?);

    match cli.command {
        Command::RunOnce => {
            let report = pipeline.run().await;
            let path = report.save(&config.data_dir)?;
            println!("{}", path.display());
            if report.failed_steps() > 0 {
                anyhow::bail!("{} step(s) failed, see {}", report.failed_steps(), path.display());
            }
        }
        Command::Serve => {
            let handle = start_ingest_interval(
                pipeline,
                ScheduleConfig {
                    interval: config.ingest_interval,
                    run_on_start: config.ingest_run_on_start,
                    report_dir: Some(config.data_dir.clone()),
                },
            )?;
            tokio::signal::ctrl_c().await?;
            info!("Shutting down ingest scheduler...");
            tokio::task::spawn_blocking(move || handle.shutdown()).await?;
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("crisistruth=info".parse()?)
        .add_directive("fact_checker_client=info".parse()?);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}
