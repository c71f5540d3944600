// src/store.rs
use std::collections::BTreeMap;

use crate::record::TransmitterId;

/// A single dated position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    /// Unix seconds, UTC.
    pub timestamp: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl DataPoint {
    pub fn new(timestamp: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
        }
    }
}

pub type PointSeries = Vec<DataPoint>;

/// Transmitter id → point series, in the order points were recorded.
///
/// Each source pass fills its own store; stores are then merged into one
/// global view which is only read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointStore {
    series: BTreeMap<TransmitterId, PointSeries>,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: TransmitterId, point: DataPoint) {
        self.series.entry(id).or_default().push(point);
    }

    /// Fold `other` into `self`. A transmitter present in both keeps its
    /// existing points and gets `other`'s appended after them.
    pub fn merge(&mut self, other: PointStore) {
        for (id, mut points) in other.series {
            self.series.entry(id).or_default().append(&mut points);
        }
    }

    /// Points for `id`, empty if the transmitter never reported.
    pub fn series(&self, id: TransmitterId) -> &[DataPoint] {
        self.series.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, id: TransmitterId) -> bool {
        self.series.contains_key(&id)
    }

    pub fn transmitter_ids(&self) -> impl Iterator<Item = TransmitterId> + '_ {
        self.series.keys().copied()
    }

    pub fn point_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
