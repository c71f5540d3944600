//! drifter-tracks — Binary Entrypoint
//! Loads the drifter config, rebuilds every track and writes one `.dat` file
//! per drifter.

use std::process::ExitCode;

use drifter_tracks::feed::AutoFetcher;
use drifter_tracks::telemetry::Metrics;
use drifter_tracks::{pipeline, Config, RunSettings};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("drifter_tracks=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

async fn run(settings: &RunSettings) -> anyhow::Result<bool> {
    let config = Config::load_default()?;
    let fetcher = AutoFetcher::new(settings.fetch_timeout)?;

    let report = pipeline::run(&config, &fetcher, &settings.output_dir).await?;
    Ok(report.is_success())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = match RunSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = ?e, "invalid run settings");
            return ExitCode::FAILURE;
        }
    };

    // Opt-in: without a metrics path the `metrics` macros stay no-ops.
    let metrics = match settings.metrics_path.as_ref().map(|_| Metrics::install()) {
        Some(Ok(m)) => Some(m),
        Some(Err(e)) => {
            tracing::warn!(error = ?e, "metrics disabled");
            None
        }
        None => None,
    };

    let outcome = run(&settings).await;

    if let (Some(m), Some(path)) = (&metrics, &settings.metrics_path) {
        if let Err(e) = m.write_textfile(path) {
            tracing::warn!(error = ?e, "could not write metrics");
        }
    }

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            tracing::error!("some drifters could not be exported");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = ?e, "run aborted");
            ExitCode::FAILURE
        }
    }
}
