// src/export.rs
use anyhow::{Context, Result};
use metrics::counter;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::aggregate::DrifterTrack;
use crate::store::DataPoint;

/// File extension of per-drifter track files.
pub const TRACK_EXTENSION: &str = "dat";

/// Write one `<timestamp> <latitude> <longitude>` line per point.
pub fn write_series<W: Write>(mut w: W, points: &[DataPoint]) -> std::io::Result<()> {
    for p in points {
        writeln!(w, "{} {} {}", p.timestamp, p.latitude, p.longitude)?;
    }
    w.flush()
}

pub fn track_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{name}.{TRACK_EXTENSION}"))
}

/// Create (or truncate) `<output_dir>/<name>.dat` and write the track to it.
pub fn export_track(output_dir: &Path, track: &DrifterTrack) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output dir {}", output_dir.display()))?;
    let path = track_path(output_dir, &track.name);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    write_series(BufWriter::new(file), &track.points)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Outcome of exporting a batch of tracks.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, anyhow::Error)>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Export every track. A failing drifter is logged and recorded in the
/// report; the remaining drifters are still written.
pub fn export_all(output_dir: &Path, tracks: &[DrifterTrack]) -> ExportReport {
    let mut report = ExportReport::default();
    for track in tracks {
        tracing::info!(drifter = %track.name, "saving");
        match export_track(output_dir, track) {
            Ok(path) => report.written.push(path),
            Err(e) => {
                tracing::error!(drifter = %track.name, error = ?e, "export failed");
                counter!("drifter_export_errors_total").increment(1);
                report.failed.push((track.name.clone(), e));
            }
        }
    }
    report
}
