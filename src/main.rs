use ingest_ring::ENV;
use ingest_ring::adapters::coordination::FileCoordinator;
use ingest_ring::domains::ring::RingEngine;
use ingest_ring::observability::{MetricsState, RingMetrics, init_metrics, init_tracing, scrape};
use tracing::{info, trace, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(ENV.log_level)?;
    let metrics_state = init_metrics()?;
    let ring_metrics = RingMetrics::new();

    info!(dir = %ENV.dir, poll_ms = ENV.poll_mills, "watching ring in coordination directory");
    let watcher = FileCoordinator::new(&ENV.dir, ENV.poll_interval());
    let engine = RingEngine::run(watcher, ENV.ring_config());

    let mut ticker = tokio::time::interval(ENV.report_interval());
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(%err, "failed to listen for shutdown signal");
                }
                break;
            },
            _ = ticker.tick() => report(&engine, &ring_metrics, &metrics_state),
        }
    }

    info!("shutting down");
    engine.stop().await;
    Ok(())
}

fn report(engine: &RingEngine, ring_metrics: &RingMetrics, metrics_state: &MetricsState) {
    let (report, exposition) =
        match scrape(engine, ring_metrics, &metrics_state.prometheus_handle) {
            | Ok(scraped) => scraped,
            | Err(err) => {
                warn!(%err, "failed to compute ring report");
                return;
            },
        };

    info!(
        healthy = report.healthy,
        unhealthy = report.unhealthy,
        tokens = report.tokens,
        members = report.ownership.len(),
        "ring report"
    );
    trace!(%exposition);
}
