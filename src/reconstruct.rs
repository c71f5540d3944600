// src/reconstruct.rs
//! # Year reconstruction
//!
//! Feed rows carry month/day/time and a fractional day-of-year, but no year.
//! The year is inferred by scanning rows in feed order:
//!
//! - a change of transmitter restarts at the source's base year;
//! - a drop in fractional day for the same transmitter means the counter
//!   wrapped past 31 December, so the year advances by one.
//!
//! The scan is order-dependent and must see every row of a source, including
//! rows for transmitters that are not kept.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use metrics::{counter, histogram};

use crate::config::Source;
use crate::feed::parse_table;
use crate::record::{RawRecord, TransmitterId};
use crate::store::{DataPoint, PointStore};

/// Explicit state of the year scan over one source.
#[derive(Debug, Clone, PartialEq)]
pub struct YearReconstructor {
    base_year: i32,
    year: i32,
    last_transmitter: Option<TransmitterId>,
    last_fractional_day: f64,
}

impl YearReconstructor {
    pub fn new(base_year: i32) -> Self {
        Self {
            base_year,
            year: base_year,
            last_transmitter: None,
            last_fractional_day: 0.0,
        }
    }

    /// Feed one record through the state machine and return the year it
    /// belongs to.
    pub fn advance(&mut self, rec: &RawRecord) -> i32 {
        if self.last_transmitter != Some(rec.transmitter_id) {
            self.year = self.base_year;
        } else if rec.fractional_day < self.last_fractional_day {
            self.year = self.year.saturating_add(1);
        }
        self.last_fractional_day = rec.fractional_day;
        self.last_transmitter = Some(rec.transmitter_id);
        self.year
    }

    pub fn current_year(&self) -> i32 {
        self.year
    }
}

/// Unix seconds for the given calendar fields in UTC.
///
/// Out-of-range month/day/hour/minute values carry into the neighbouring
/// unit (month 0 is December of the previous year, day 0 the last day of the
/// previous month). `None` only when the year is outside chrono's range.
pub fn utc_timestamp(year: i32, month: i32, day: i32, hour: i32, minute: i32) -> Option<i64> {
    let months_from_jan = month - 1;
    let y = year.checked_add(months_from_jan.div_euclid(12))?;
    let m = u32::try_from(months_from_jan.rem_euclid(12) + 1).ok()?;

    let first: NaiveDateTime = NaiveDate::from_ymd_opt(y, m, 1)?.and_hms_opt(0, 0, 0)?;
    let offset = TimeDelta::try_days(i64::from(day) - 1)?
        .checked_add(&TimeDelta::try_hours(i64::from(hour))?)?
        .checked_add(&TimeDelta::try_minutes(i64::from(minute))?)?;
    Some(first.checked_add_signed(offset)?.and_utc().timestamp())
}

/// Run one source's rows through the year scan, keeping only points for the
/// transmitters the source declares.
pub fn reconstruct<S: AsRef<str>>(source: &Source, rows: &[Vec<S>]) -> PointStore {
    let t0 = std::time::Instant::now();
    let mut scan = YearReconstructor::new(source.base_year);
    let mut store = PointStore::new();

    for row in rows {
        let rec = RawRecord::decode(row);
        let year = scan.advance(&rec);

        if !source.transmitter_ids.contains(&rec.transmitter_id) {
            continue;
        }
        match utc_timestamp(year, rec.month, rec.day, rec.hour, rec.minute) {
            Some(ts) => store.push(
                rec.transmitter_id,
                DataPoint::new(ts, rec.latitude, rec.longitude),
            ),
            None => tracing::warn!(
                source = %source.location,
                esn = rec.transmitter_id,
                year,
                "record date out of range; dropped"
            ),
        }
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("drifter_decode_ms").record(ms);
    counter!("drifter_records_total").increment(rows.len() as u64);
    counter!("drifter_points_kept_total").increment(store.point_count() as u64);

    store
}

/// Parse a raw feed body as a table and reconstruct its points.
pub fn decode_source(source: &Source, body: &str) -> Result<PointStore> {
    let rows = parse_table(body)?;
    let store = reconstruct(source, &rows);
    tracing::info!(
        source = %source.location,
        records = rows.len(),
        points = store.point_count(),
        transmitters = store.transmitter_ids().count(),
        "decoded source"
    );
    Ok(store)
}
