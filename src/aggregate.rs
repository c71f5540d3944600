// src/aggregate.rs
use crate::config::Drifter;
use crate::store::{DataPoint, PointSeries, PointStore};

/// Final ordered series for one drifter.
#[derive(Debug, Clone, PartialEq)]
pub struct DrifterTrack {
    pub name: String,
    pub points: PointSeries,
}

impl DrifterTrack {
    pub fn first_timestamp(&self) -> Option<i64> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.points.last().map(|p| p.timestamp)
    }
}

/// Drop everything before `start`: keep from the first point with
/// `timestamp >= start`. If no point qualifies the series is left as is.
pub fn trim_start(points: &mut PointSeries, start: i64) {
    let idx = points
        .iter()
        .position(|p| p.timestamp >= start)
        .unwrap_or(0);
    points.drain(..idx);
}

/// Drop the tail: find the last point with `timestamp <= end` and keep only
/// what comes strictly before it, so a point exactly at `end` is excluded.
/// With no such point the scan stops at the last position, which is dropped.
pub fn trim_end(points: &mut PointSeries, end: i64) {
    if points.is_empty() {
        return;
    }
    let idx = points
        .iter()
        .rposition(|p| p.timestamp <= end)
        .unwrap_or(points.len() - 1);
    points.truncate(idx);
}

/// Apply an optional `[start, end)` window to a sorted series. A bound of
/// `0` counts as unset.
pub fn apply_window(points: &mut PointSeries, start: Option<i64>, end: Option<i64>) {
    if let Some(start) = start.filter(|&t| t != 0) {
        trim_start(points, start);
    }
    if let Some(end) = end.filter(|&t| t != 0) {
        trim_end(points, end);
    }
}

/// Union the series of every transmitter the drifter lists, sort by time
/// (stable, so equal timestamps keep listing order), then window.
pub fn aggregate_drifter(drifter: &Drifter, store: &PointStore) -> PointSeries {
    let mut points: Vec<DataPoint> = drifter
        .transmitter_ids
        .iter()
        .flat_map(|&id| store.series(id).iter().copied())
        .collect();
    points.sort_by_key(|p| p.timestamp);
    apply_window(&mut points, drifter.window_start, drifter.window_end);
    points
}

/// Build every drifter's track, in configuration order.
pub fn aggregate_all(drifters: &[Drifter], store: &PointStore) -> Vec<DrifterTrack> {
    drifters
        .iter()
        .map(|d| {
            let track = DrifterTrack {
                name: d.name.clone(),
                points: aggregate_drifter(d, store),
            };
            tracing::info!(
                drifter = %track.name,
                points = track.points.len(),
                first = ?track.first_timestamp(),
                last = ?track.last_timestamp(),
                "processed drifter"
            );
            track
        })
        .collect()
}
