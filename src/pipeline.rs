// src/pipeline.rs
//! One batch run: fetch → decode → merge → aggregate → export.
//!
//! Any source that cannot be fetched or tabulated aborts the run before a
//! single track is written, since a missing feed would silently thin out
//! every drifter that depends on it.

use anyhow::{Context, Result};
use metrics::counter;
use std::path::Path;

use crate::aggregate::{aggregate_all, DrifterTrack};
use crate::config::{Config, Source};
use crate::export::{export_all, ExportReport};
use crate::feed::FeedFetcher;
use crate::reconstruct::decode_source;
use crate::store::PointStore;

/// Fetch and decode a single source into its own store.
pub async fn process_source(fetcher: &dyn FeedFetcher, source: &Source) -> Result<PointStore> {
    tracing::info!(source = %source.location, fetcher = fetcher.name(), "downloading");
    let body = match fetcher.fetch(&source.location).await {
        Ok(b) => b,
        Err(e) => {
            counter!("drifter_source_errors_total").increment(1);
            return Err(e).with_context(|| format!("fetching source {}", source.location));
        }
    };
    decode_source(source, &body).with_context(|| format!("decoding source {}", source.location))
}

/// Process every source in config order and merge the results.
pub async fn collect_points(config: &Config, fetcher: &dyn FeedFetcher) -> Result<PointStore> {
    let mut global = PointStore::new();
    for source in &config.sources {
        let store = process_source(fetcher, source).await?;
        global.merge(store);
    }
    Ok(global)
}

/// Everything up to (but not including) writing files.
pub async fn build_tracks(config: &Config, fetcher: &dyn FeedFetcher) -> Result<Vec<DrifterTrack>> {
    let store = collect_points(config, fetcher).await?;
    Ok(aggregate_all(&config.drifters, &store))
}

/// Full run. `Err` means nothing was exported; export failures for
/// individual drifters are carried in the returned report instead.
pub async fn run(
    config: &Config,
    fetcher: &dyn FeedFetcher,
    output_dir: &Path,
) -> Result<ExportReport> {
    let tracks = build_tracks(config, fetcher).await?;
    let report = export_all(output_dir, &tracks);
    tracing::info!(
        written = report.written.len(),
        failed = report.failed.len(),
        output = %output_dir.display(),
        "run finished"
    );
    Ok(report)
}
