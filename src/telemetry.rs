// src/telemetry.rs
use anyhow::{Context, Result};
use metrics::describe_counter;
use metrics::describe_histogram;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder as the process-wide `metrics` sink.
    /// Can only succeed once per process.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("drifter_records_total", "Feed rows scanned.");
        describe_counter!(
            "drifter_points_kept_total",
            "Points kept for declared transmitters."
        );
        describe_counter!(
            "drifter_source_errors_total",
            "Sources that could not be fetched."
        );
        describe_counter!(
            "drifter_export_errors_total",
            "Drifter tracks that could not be written."
        );
        describe_histogram!("drifter_decode_ms", "Per-source decode time in milliseconds.");

        Ok(Self { handle })
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Dump the exposition to `path` for a textfile collector.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating metrics dir {}", dir.display()))?;
        }
        fs::write(path, self.render())
            .with_context(|| format!("writing metrics to {}", path.display()))
    }
}
