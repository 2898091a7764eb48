//! The whole run: fetch, align, process, export and report.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use crate::api::dataset::{Dataset, RetryPolicy};
use crate::api::series::SeriesId;
use crate::api::{DateRange, SIX_MONTH_DAYS};
use crate::normalize::normalize;
use crate::process::{process, ProcessedTable};
use crate::report::write_reports;
use crate::table::{merge, AlignedTable, RollingWindow};
use crate::ApiClient;

pub const EXPORT_FILE: &str = "processed_data.csv";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pause after each series to go easy on the API
    pub courtesy_delay: Duration,
    pub retry: RetryPolicy,
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            courtesy_delay: Duration::from_secs(1),
            retry: RetryPolicy::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    /// No series returned any data, nothing was written
    NoData,
    Completed {
        table: ProcessedTable,
        export: PathBuf,
        reports: Vec<PathBuf>,
    },
}

pub struct Pipeline<'a> {
    client: &'a dyn ApiClient,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(client: &'a dyn ApiClient) -> Self {
        Self {
            client,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetches every series for the window ending at `now` and aligns them.
    ///
    /// Series that return nothing, have an unexpected shape or carry bad
    /// timestamps are left out. If none survive the table is empty.
    pub fn fetch_all(&self, now: NaiveDateTime) -> AlignedTable {
        let range = DateRange::last_days(now, SIX_MONTH_DAYS);
        let dataset = Dataset::new(self.client).with_retry_policy(self.config.retry);
        info!(start = %range.start, end = %range.end, "fetching data");

        let mut normalized = vec![];
        for series in SeriesId::ALL {
            info!(series = %series, dataset = series.dataset_id(), "fetching");
            let raw = dataset.fetch(series, range);

            match normalize(&raw, series) {
                Ok(Some(s)) => normalized.push(s),
                Ok(None) => {}
                Err(e) => warn!("skipping series: {}", e),
            }

            thread::sleep(self.config.courtesy_delay);
        }

        merge(normalized).trim_to_six_months()
    }

    /// Runs everything and writes the export and reports into the output directory.
    ///
    /// Nothing is written when no series could be fetched.
    pub fn run(&self, now: NaiveDateTime) -> Result<RunOutcome, anyhow::Error> {
        let aligned = self.fetch_all(now);
        if aligned.is_empty() {
            error!("analysis failed: no data could be fetched");
            return Ok(RunOutcome::NoData);
        }

        let table = process(aligned);

        let dir = &self.config.output_dir;
        fs::create_dir_all(dir)?;

        let export = dir.join(EXPORT_FILE);
        table.write_csv(&export)?;

        let reports = write_reports(&table, dir)?;

        info!(dir = %dir.display(), files = reports.len() + 1, "analysis complete");
        Ok(RunOutcome::Completed {
            table,
            export,
            reports,
        })
    }
}
