//! Turns the raw records of one series into a time-keyed series.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::series::SeriesId;

/// Field holding the record's local timestamp
pub const TIMESTAMP_FIELD: &str = "ltu";
pub const VALUE_FIELD: &str = "value";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("{series}: record {index} has no usable timestamp ({raw})")]
    Timestamp {
        series: SeriesId,
        index: usize,
        raw: String,
    },
}

/// One series keyed by unique timestamps; a `None` cell is a record without a numeric value.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub series: SeriesId,
    pub points: BTreeMap<NaiveDateTime, Option<f64>>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Normalizes the records of `series`.
///
/// Returns `Ok(None)` when there is nothing to work with: no records, or no
/// record carrying both the timestamp and the value field. A timestamp that
/// cannot be parsed fails the whole series. When a timestamp repeats, the
/// first record wins.
pub fn normalize(
    raw: &[Value],
    series: SeriesId,
) -> Result<Option<NormalizedSeries>, NormalizeError> {
    if raw.is_empty() {
        info!(series = %series, "no data received");
        return Ok(None);
    }

    let has_shape = raw.iter().any(|record| {
        record.get(TIMESTAMP_FIELD).is_some() && record.get(VALUE_FIELD).is_some()
    });
    if !has_shape {
        let fields: Vec<&str> = raw
            .first()
            .and_then(Value::as_object)
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();
        warn!(series = %series, ?fields, "unexpected record fields");
        return Ok(None);
    }

    let mut points = BTreeMap::new();
    for (index, record) in raw.iter().enumerate() {
        let ts = record
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .ok_or_else(|| NormalizeError::Timestamp {
                series,
                index,
                raw: record
                    .get(TIMESTAMP_FIELD)
                    .map(Value::to_string)
                    .unwrap_or_else(|| "missing".to_string()),
            })?;
        let value = record.get(VALUE_FIELD).and_then(Value::as_f64);
        points.entry(ts).or_insert(value);
    }

    info!(series = %series, records = points.len(), "normalized");
    Ok(Some(NormalizedSeries { series, points }))
}

/// Parses a timestamp into local wall-clock time, dropping any UTC offset.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
