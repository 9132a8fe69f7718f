use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use kmet::domain::{LogSource, MetricsSource};
use kmet::provider::SyntheticProvider;
use kmet::runtime::spawn_shutdown_handler;
use kmet::tui::{self, EffectExecutor};
use kmet::{Args, Config, Dashboard, RuntimeConfig, TrendCapacity, load_config_with_fallback};

type Providers = (Arc<dyn MetricsSource>, Arc<dyn LogSource>);

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) = load_config_with_fallback(args.config.as_deref())?;
    config.apply_args(&args);
    config.validate()?;

    // Keep the guard alive until exit so buffered lines reach the file
    let _guard = kmet::logging::init_file_logging(&config.log.file, &config.log.level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Loaded configuration from {}",
        source.description()
    );

    let rt = RuntimeConfig::default().build_runtime()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: Config) -> Result<()> {
    let (metrics, logs) = build_providers(&args, config.dashboard.trend_capacity()).await?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let executor = EffectExecutor::new(
        metrics,
        logs,
        events_tx.clone(),
        config.dashboard.poll_timeout(),
    );
    let dashboard = Dashboard::new(config.dashboard.settings());
    let shutdown_rx = spawn_shutdown_handler();

    info!(
        namespace = %config.dashboard.initial_namespace,
        refresh_ms = config.dashboard.refresh_interval_ms,
        "Starting dashboard"
    );
    tui::run_tui(dashboard, executor, events_tx, events_rx, shutdown_rx).await?;
    info!("Dashboard closed");
    Ok(())
}

async fn build_providers(args: &Args, capacity: TrendCapacity) -> Result<Providers> {
    if args.mock {
        info!("Using synthetic cluster data");
        let provider = Arc::new(SyntheticProvider::new(capacity));
        let metrics: Arc<dyn MetricsSource> = provider.clone();
        let logs: Arc<dyn LogSource> = provider;
        return Ok((metrics, logs));
    }
    connect_cluster(args, capacity).await
}

#[cfg(feature = "kube")]
async fn connect_cluster(args: &Args, capacity: TrendCapacity) -> Result<Providers> {
    let provider =
        Arc::new(kmet::provider::KubeProvider::connect(&args.kube_settings(), capacity).await?);
    let metrics: Arc<dyn MetricsSource> = provider.clone();
    let logs: Arc<dyn LogSource> = provider;
    Ok((metrics, logs))
}

#[cfg(not(feature = "kube"))]
async fn connect_cluster(_args: &Args, _capacity: TrendCapacity) -> Result<Providers> {
    Err(kmet::ProviderError::configuration(
        "built without the `kube` feature; run with --mock",
    )
    .into())
}
