//! RateAgg Simulator
//!
//! Runs the aggregation engine against simulated providers and prints every
//! result as a JSON line on stdout.

use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod metrics;
mod provider;
mod scenario;

use controller::SimulationController;
use rateagg_common::Currency;
use rateagg_engine::EngineConfig;
use scenario::Scenario;

/// RateAgg Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Run the rate aggregator against simulated providers")]
struct Args {
    /// Currency code to request
    #[arg(short, long, default_value = "USD")]
    currency: String,

    /// Built-in scenario name or path to a JSON scenario file
    #[arg(short, long, default_value = "healthy")]
    scenario: String,

    /// Per-call deadline in milliseconds (overrides RATEAGG_DEADLINE_MS)
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Number of aggregation calls to run
    #[arg(long, default_value = "1")]
    calls: usize,

    /// Maximum calls in flight at once
    #[arg(long, default_value = "1")]
    parallel: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print engine metrics in Prometheus format to stderr when done
    #[arg(long)]
    prometheus: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays machine-readable.
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    info!("Starting RateAgg Simulator");

    let mut config = EngineConfig::from_env();
    if let Some(ms) = args.deadline_ms {
        config.deadline = Duration::from_millis(ms);
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let currency = Currency::new(&args.currency);
    if currency.is_empty() {
        return Err(anyhow::anyhow!("Currency code cannot be empty"));
    }

    let scenario = Scenario::load(&args.scenario)?;
    info!("Running scenario: {} - {}", scenario.name, scenario.description);

    let controller = SimulationController::new(&scenario, config, currency, args.seed);
    let results = controller.run(args.calls, args.parallel).await;

    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }

    let metrics = controller.get_metrics();
    info!("Simulation complete");
    info!("Total calls: {}", metrics.total_calls);
    info!("Complete: {}", metrics.complete_calls);
    info!("Degraded: {}", metrics.degraded_calls);
    info!("Empty: {}", metrics.empty_calls);
    info!("Average latency: {}ms", metrics.average_latency_ms());
    info!("p50 latency: {}ms", metrics.p50_latency_ms());
    info!("p99 latency: {}ms", metrics.p99_latency_ms());
    info!("Completeness: {:.1}%", metrics.completeness_rate() * 100.0);

    let engine = controller.dispatcher().metrics().snapshot();
    info!(
        quotes_published = engine.quotes_published,
        providers_failed = engine.providers_failed,
        providers_timed_out = engine.providers_timed_out,
        providers_skipped = engine.providers_skipped,
        quotes_abandoned = engine.quotes_abandoned,
        worker_panics = engine.worker_panics,
        "Engine metrics"
    );

    if args.prometheus {
        eprint!("{}", controller.dispatcher().metrics().to_prometheus());
    }

    Ok(())
}
