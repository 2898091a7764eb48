//! Outer join of the normalized series onto one time axis.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info};

use crate::api::series::SeriesId;
use crate::api::SIX_MONTH_DAYS;
use crate::normalize::NormalizedSeries;

/// One cell per entry of [`SeriesId::ALL`]
pub type Cells = [Option<f64>; SeriesId::COUNT];

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub timestamp: NaiveDateTime,
    pub cells: Cells,
}

impl AlignedRow {
    pub fn get(&self, series: SeriesId) -> Option<f64> {
        self.cells[series.index()]
    }
}

/// Rows sorted by strictly increasing timestamp
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedTable {
    rows: Vec<AlignedRow>,
    present: Vec<SeriesId>,
}

/// Tables that can be cut down to the trailing window before their newest row
pub trait RollingWindow: Sized {
    fn timestamps(&self) -> Vec<NaiveDateTime>;

    fn retain_since(self, cutoff: NaiveDateTime) -> Self;

    /// Keeps the rows no older than `days` before the newest timestamp.
    fn trim_to_window(self, days: i64) -> Self {
        let newest = match self.timestamps().into_iter().max() {
            Some(t) => t,
            None => return self,
        };
        let cutoff = newest - Duration::days(days);
        debug!(%cutoff, "trimming to window");
        self.retain_since(cutoff)
    }

    fn trim_to_six_months(self) -> Self {
        self.trim_to_window(SIX_MONTH_DAYS)
    }
}

impl AlignedTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    /// Series which contributed to the table, in registry order.
    pub fn present(&self) -> &[SeriesId] {
        &self.present
    }

    pub fn has_series(&self, series: SeriesId) -> bool {
        self.present.contains(&series)
    }

    pub fn column(&self, series: SeriesId) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(series)).collect()
    }

    pub fn into_parts(self) -> (Vec<AlignedRow>, Vec<SeriesId>) {
        (self.rows, self.present)
    }
}

impl RollingWindow for AlignedTable {
    fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }

    fn retain_since(mut self, cutoff: NaiveDateTime) -> Self {
        self.rows.retain(|r| r.timestamp >= cutoff);
        self
    }
}

/// Full outer join of `series` on their timestamps.
///
/// Cells a series has no record for stay `None`. A series given twice only
/// contributes its first occurrence.
pub fn merge(series: Vec<NormalizedSeries>) -> AlignedTable {
    if series.is_empty() {
        info!("nothing to merge");
        return AlignedTable::empty();
    }

    let mut by_time: BTreeMap<NaiveDateTime, Cells> = BTreeMap::new();
    let mut present: Vec<SeriesId> = vec![];

    for s in series {
        if present.contains(&s.series) {
            debug!(series = %s.series, "duplicate series ignored");
            continue;
        }
        present.push(s.series);

        let col = s.series.index();
        for (ts, value) in s.points {
            by_time.entry(ts).or_insert([None; SeriesId::COUNT])[col] = value;
        }
    }
    present.sort();

    let rows: Vec<AlignedRow> = by_time
        .into_iter()
        .map(|(timestamp, cells)| AlignedRow { timestamp, cells })
        .collect();

    info!(rows = rows.len(), series = present.len(), "merged");
    AlignedTable { rows, present }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series(id: SeriesId, points: &[(NaiveDateTime, f64)]) -> NormalizedSeries {
        NormalizedSeries {
            series: id,
            points: points.iter().map(|(t, v)| (*t, Some(*v))).collect(),
        }
    }

    #[test]
    fn merge_is_an_outer_join() {
        let a = series(SeriesId::Solar, &[(day(1), 1.0), (day(2), 2.0)]);
        let b = series(SeriesId::Wind, &[(day(2), 20.0), (day(3), 30.0)]);

        let table = merge(vec![a, b]);

        assert_eq!(table.timestamps(), vec![day(1), day(2), day(3)]);
        assert_eq!(table.column(SeriesId::Solar), vec![Some(1.0), Some(2.0), None]);
        assert_eq!(table.column(SeriesId::Wind), vec![None, Some(20.0), Some(30.0)]);
        assert_eq!(table.present(), &[SeriesId::Solar, SeriesId::Wind]);
        assert!(!table.has_series(SeriesId::Hydro));
    }

    #[test]
    fn rows_are_sorted_whatever_the_input_order() {
        let a = series(SeriesId::Consumption, &[(day(5), 5.0)]);
        let b = series(SeriesId::Storage, &[(day(9), 9.0), (day(1), 1.0)]);

        let table = merge(vec![a, b]);

        assert_eq!(table.timestamps(), vec![day(1), day(5), day(9)]);
        assert_eq!(table.present(), &[SeriesId::Storage, SeriesId::Consumption]);
    }

    #[test]
    fn no_series_gives_the_empty_table() {
        let table = merge(vec![]);
        assert!(table.is_empty());
        assert_eq!(table, AlignedTable::empty());
    }

    #[test]
    fn repeated_series_keeps_the_first() {
        let a = series(SeriesId::Solar, &[(day(1), 1.0)]);
        let b = series(SeriesId::Solar, &[(day(1), 100.0), (day(2), 200.0)]);

        let table = merge(vec![a, b]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.column(SeriesId::Solar), vec![Some(1.0)]);
    }

    #[test]
    fn trim_keeps_inclusive_window() {
        let newest = day(1) + Duration::days(200);
        let cutoff = newest - Duration::days(SIX_MONTH_DAYS);
        let points = [
            (cutoff - Duration::hours(1), 1.0),
            (cutoff, 2.0),
            (cutoff + Duration::days(10), 3.0),
            (newest, 4.0),
        ];
        let table = merge(vec![series(SeriesId::Hydro, &points)]);

        let trimmed = table.trim_to_six_months();

        assert_eq!(
            trimmed.timestamps(),
            vec![cutoff, cutoff + Duration::days(10), newest]
        );
        let again = trimmed.clone().trim_to_six_months();
        assert_eq!(again, trimmed);
    }

    #[test]
    fn trim_of_empty_is_noop() {
        assert_eq!(AlignedTable::empty().trim_to_six_months(), AlignedTable::empty());
    }
}
