use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use polars::prelude::*;
use polars::{frame::DataFrame, series::Series};
use tracing::info;

use crate::api::series::SeriesId;
use crate::process::ProcessedTable;

pub const TIMESTAMP_COLUMN: &str = "data";
pub const TOTAL_GENERATION_COLUMN: &str = "Sumine_Generacija";
pub const IMBALANCE_COLUMN: &str = "Disbalansas";

impl ProcessedTable {
    /// One column per series in registry order, then the derived columns.
    pub fn as_polars_df(&self) -> Result<DataFrame, anyhow::Error> {
        let mut timestamps: Vec<NaiveDateTime> = vec![];
        let mut generation: Vec<Vec<f64>> = vec![vec![]; SeriesId::GENERATION.len()];
        let mut consumption: Vec<Option<f64>> = vec![];
        let mut totals: Vec<f64> = vec![];
        let mut imbalances: Vec<Option<f64>> = vec![];

        for row in self.rows() {
            timestamps.push(row.timestamp);
            for (column, value) in generation.iter_mut().zip(row.generation) {
                column.push(value);
            }
            consumption.push(row.consumption);
            totals.push(row.total_generation);
            imbalances.push(row.imbalance);
        }

        let mut columns = vec![Series::new(TIMESTAMP_COLUMN.into(), timestamps)];
        for (source, values) in SeriesId::GENERATION.iter().zip(generation) {
            columns.push(Series::new(source.column_name().into(), values));
        }
        columns.push(Series::new(
            SeriesId::Consumption.column_name().into(),
            consumption,
        ));
        columns.push(Series::new(TOTAL_GENERATION_COLUMN.into(), totals));
        columns.push(Series::new(IMBALANCE_COLUMN.into(), imbalances));

        let df = DataFrame::new(columns)?;

        Ok(df)
    }

    /// Writes the table as comma separated text with a header row.
    pub fn write_csv(&self, path: &Path) -> Result<(), anyhow::Error> {
        let mut df = self.as_polars_df()?;
        let mut file = File::create(path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_datetime_format(Some("%Y-%m-%d %H:%M:%S".to_string()))
            .finish(&mut df)?;

        info!(path = %path.display(), rows = df.height(), "exported");
        Ok(())
    }
}
