//! Gap filling and the derived columns.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::api::series::SeriesId;
use crate::table::{AlignedTable, RollingWindow};

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRow {
    pub timestamp: NaiveDateTime,
    /// Indexed like [`SeriesId::GENERATION`]; gaps are already zero.
    pub generation: [f64; 6],
    /// Forward filled, `None` only before the first reading
    pub consumption: Option<f64>,
    pub total_generation: f64,
    /// `total_generation - consumption`
    pub imbalance: Option<f64>,
}

impl ProcessedRow {
    pub fn generation_of(&self, source: SeriesId) -> Option<f64> {
        SeriesId::GENERATION
            .iter()
            .position(|s| *s == source)
            .map(|i| self.generation[i])
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessedTable {
    rows: Vec<ProcessedRow>,
}

impl ProcessedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[ProcessedRow] {
        &self.rows
    }

    pub fn total_generation(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.total_generation).collect()
    }

    pub fn consumption(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.consumption).collect()
    }

    pub fn imbalance(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.imbalance).collect()
    }
}

impl RollingWindow for ProcessedTable {
    fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }

    fn retain_since(mut self, cutoff: NaiveDateTime) -> Self {
        self.rows.retain(|r| r.timestamp >= cutoff);
        self
    }
}

/// Fills the gaps of `table` and adds total generation and imbalance.
///
/// A missing generation reading means the source was not producing and
/// becomes zero. A missing consumption reading carries the last known value
/// forward; rows before the first reading keep no consumption and no imbalance.
pub fn process(table: AlignedTable) -> ProcessedTable {
    if table.is_empty() {
        warn!("processing skipped: table is empty");
        return ProcessedTable::default();
    }

    let table = table.trim_to_six_months();
    let (aligned, present) = table.into_parts();
    if !present.contains(&SeriesId::Consumption) {
        warn!("no consumption series, imbalance stays undefined");
    }

    let mut last_consumption: Option<f64> = None;
    let rows: Vec<ProcessedRow> = aligned
        .into_iter()
        .map(|row| {
            let mut generation = [0.0; 6];
            for (slot, source) in generation.iter_mut().zip(SeriesId::GENERATION) {
                *slot = row.get(source).unwrap_or(0.0);
            }

            if let Some(c) = row.get(SeriesId::Consumption) {
                last_consumption = Some(c);
            }
            let consumption = last_consumption;

            let total_generation: f64 = generation.iter().sum();
            ProcessedRow {
                timestamp: row.timestamp,
                generation,
                consumption,
                total_generation,
                imbalance: consumption.map(|c| total_generation - c),
            }
        })
        .collect();

    info!(rows = rows.len(), "processed");
    ProcessedTable { rows }
}
