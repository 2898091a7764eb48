use chrono::{Duration, NaiveDate, NaiveDateTime};

pub mod dataset;
pub mod series;

/// Length of the rolling analysis window, roughly six months.
pub const SIX_MONTH_DAYS: i64 = 182;

pub trait FormatToApiFmt {
    fn to_api_format(&self) -> String;
}

impl FormatToApiFmt for NaiveDate {
    fn to_api_format(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

/// Inclusive date range sent as `nuo`/`iki`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The `days` long range ending on the date of `now`.
    pub fn last_days(now: NaiveDateTime, days: i64) -> Self {
        DateRange {
            start: (now - Duration::days(days)).date(),
            end: now.date(),
        }
    }

    fn to_query_string(&self) -> Vec<(String, String)> {
        vec![
            ("nuo".to_string(), self.start.to_api_format()),
            ("iki".to_string(), self.end.to_api_format()),
        ]
    }
}
