// src/record.rs
use std::str::FromStr;

/// Transmitter identifier (ESN) as it appears in the feed.
pub type TransmitterId = i64;

/// Minimum number of columns a feed row must carry:
/// `ID ESN MONTH DAY HOUR MINUTE DECIMAL_DATE LONGITUDE LATITUDE ...`
pub const MIN_RECORD_ARITY: usize = 9;

const COL_ESN: usize = 1;
const COL_MONTH: usize = 2;
const COL_DAY: usize = 3;
const COL_HOUR: usize = 4;
const COL_MINUTE: usize = 5;
const COL_DECIMAL_DATE: usize = 6;
const COL_LONGITUDE: usize = 7;
const COL_LATITUDE: usize = 8;

/// One decoded feed row. Ephemeral: lives only for the duration of a decoding pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    pub transmitter_id: TransmitterId,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    /// Day-of-year plus time-of-day fraction, e.g. `364.9`.
    pub fractional_day: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl RawRecord {
    /// Decode one row of fields. Any numeric field that fails to parse, or is
    /// missing, decodes as zero.
    pub fn decode<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            transmitter_id: lenient(fields, COL_ESN),
            month: lenient(fields, COL_MONTH),
            day: lenient(fields, COL_DAY),
            hour: lenient(fields, COL_HOUR),
            minute: lenient(fields, COL_MINUTE),
            fractional_day: lenient(fields, COL_DECIMAL_DATE),
            latitude: lenient(fields, COL_LATITUDE),
            longitude: lenient(fields, COL_LONGITUDE),
        }
    }
}

fn lenient<S: AsRef<str>, T: FromStr + Default>(fields: &[S], idx: usize) -> T {
    fields
        .get(idx)
        .and_then(|f| f.as_ref().trim().parse().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_columns_in_feed_order() {
        let row = [
            "1", "995094", "12", "31", "21", "36", "365.9", "-65.123", "41.5", "0", "0",
        ];
        let r = RawRecord::decode(&row);
        assert_eq!(r.transmitter_id, 995094);
        assert_eq!((r.month, r.day, r.hour, r.minute), (12, 31, 21, 36));
        assert_eq!(r.fractional_day, 365.9);
        assert_eq!(r.longitude, -65.123);
        assert_eq!(r.latitude, 41.5);
    }

    #[test]
    fn malformed_fields_become_zero() {
        let row = ["x", "abc", "1", "2", "3", "4", "nan?", "--1", "4x", "0"];
        let r = RawRecord::decode(&row);
        assert_eq!(r.transmitter_id, 0);
        assert_eq!(r.month, 1);
        assert_eq!(r.fractional_day, 0.0);
        assert_eq!(r.longitude, 0.0);
        assert_eq!(r.latitude, 0.0);
    }

    #[test]
    fn short_rows_do_not_panic() {
        let r = RawRecord::decode(&["1", "5"]);
        assert_eq!(r.transmitter_id, 5);
        assert_eq!(r.minute, 0);
        assert_eq!(r.latitude, 0.0);
    }
}
