// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod config;
pub mod export;
pub mod feed;
pub mod pipeline;
pub mod reconstruct;
pub mod record;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::DrifterTrack;
pub use crate::config::{Config, Drifter, RunSettings, Source};
pub use crate::store::{DataPoint, PointSeries, PointStore};
