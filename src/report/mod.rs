use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::process::ProcessedTable;

pub mod analysis;
pub mod charts;
pub mod polyfit;

pub const GENERATION_CONSUMPTION_CHART: &str = "generation_consumption.svg";
pub const IMBALANCE_CHART: &str = "imbalance.svg";
pub const PIE_CHART_DIR: &str = "pie_charts";
pub const WEEKLY_PROFILE_CHART: &str = "weekly_profile.svg";
pub const ANALYSIS_REPORT: &str = "analysis_report.txt";

/// Renders every chart and the text report into `dir`.
///
/// Charts with nothing to draw are left out of the returned paths.
pub fn write_reports(table: &ProcessedTable, dir: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
    if table.is_empty() {
        info!("reporting skipped: table is empty");
        return Ok(vec![]);
    }

    let mut written = vec![];
    written.extend(charts::generation_consumption_chart(
        table,
        &dir.join(GENERATION_CONSUMPTION_CHART),
    )?);
    written.extend(charts::imbalance_chart(table, &dir.join(IMBALANCE_CHART))?);
    written.extend(charts::monthly_pies(table, &dir.join(PIE_CHART_DIR))?);

    let report = analysis::analyze(table);
    written.extend(charts::weekly_profile_chart(
        &report.weekly_profile,
        report.coefficients.as_deref(),
        &dir.join(WEEKLY_PROFILE_CHART),
    )?);

    let path = dir.join(ANALYSIS_REPORT);
    fs::write(&path, report.to_string())?;
    info!(path = %path.display(), "report saved");
    written.push(path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::api::series::SeriesId;
    use crate::normalize::NormalizedSeries;
    use crate::process::process;
    use crate::table::merge;

    #[test]
    fn only_written_files_are_returned() {
        let dir = tempfile::tempdir().unwrap();
        let day = |d: u32| {
            NaiveDate::from_ymd_opt(2024, 3, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let wind = NormalizedSeries {
            series: SeriesId::Wind,
            points: [(day(1), Some(3.0)), (day(2), Some(5.0))].into_iter().collect(),
        };

        let written = write_reports(&process(merge(vec![wind])), dir.path()).unwrap();

        assert!(written.iter().all(|p| p.exists()));
        assert!(written.contains(&dir.path().join(GENERATION_CONSUMPTION_CHART)));
        assert!(written.contains(&dir.path().join(ANALYSIS_REPORT)));
        assert!(!written.contains(&dir.path().join(IMBALANCE_CHART)));
        assert!(!written.contains(&dir.path().join(WEEKLY_PROFILE_CHART)));
    }
}
