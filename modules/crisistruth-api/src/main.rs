use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crisistruth_api::{build_router, AppState};
use crisistruth_common::{CategoryTable, Config, ImpactSource, RandomImpact};
use crisistruth_ingest::{start_ingest_interval, IngestPipeline, ScheduleConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;
    config.log_summary();

    // One shared instance for request handlers and the ingest job. A failed
    // init leaves it unset and /verify answers 503.
    let fact_checker = fact_checker_client::connect_optional(
        config.fact_checker_url.as_deref(),
        config.fact_checker_timeout,
    )
    .await;
    let categories = Arc::new(CategoryTable::load(config.category_table_path.as_deref())?);
    let impact: Arc<dyn ImpactSource> = Arc::new(RandomImpact::from_os_rng());

    let pipeline = Arc::new(IngestPipeline::from_config(
        &config,
        fact_checker.clone(),
        categories.clone(),
        impact.clone(),
    )?);
    let scheduler = start_ingest_interval(
        pipeline,
        ScheduleConfig {
            interval: config.ingest_interval,
            run_on_start: config.ingest_run_on_start,
            report_dir: Some(config.data_dir.clone()),
        },
    )?;

    let state = Arc::new(AppState::from_config(
        &config,
        fact_checker,
        categories,
        impact,
    ));
    let app = build_router(state, &config.allowed_origin)?;

    let addr = config.bind_addr();
    info!("CrisisTruth API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Waiting for the ingest scheduler to stop...");
    tokio::task::spawn_blocking(move || scheduler.shutdown()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("crisistruth=info".parse()?)
        .add_directive("fact_checker_client=info".parse()?)
        .add_directive("tower_http=info".parse()?);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}
