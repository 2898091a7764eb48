use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Timelike, Weekday};

use crate::api::series::SeriesId;
use crate::process::ProcessedTable;
use crate::table::RollingWindow;

use super::polyfit::polyfit;

/// Degree of the polynomial fitted to the average week
pub const PROFILE_DEGREE: usize = 12;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HydroActivity {
    /// Rows where hydro produces and the previous row did not
    pub starts: usize,
    /// Rows where hydro produces, one per hour for hourly data
    pub active_hours: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub hydro: HydroActivity,
    /// Highest average first
    pub weekday_averages: Vec<(Weekday, f64)>,
    /// Average consumption per hour of the week, Monday 00:00 is hour 0
    pub weekly_profile: Vec<(u32, f64)>,
    pub coefficients: Option<Vec<f64>>,
}

impl AnalysisReport {
    pub fn peak_weekday(&self) -> Option<Weekday> {
        self.weekday_averages.first().map(|(day, _)| *day)
    }
}

pub fn analyze(table: &ProcessedTable) -> AnalysisReport {
    let table = table.clone().trim_to_six_months();

    let weekly_profile = weekly_profile(&table);
    let (x, y): (Vec<f64>, Vec<f64>) = weekly_profile
        .iter()
        .map(|(hour, avg)| (f64::from(*hour), *avg))
        .unzip();

    AnalysisReport {
        hydro: hydro_activity(&table),
        weekday_averages: weekday_averages(&table),
        coefficients: polyfit(&x, &y, PROFILE_DEGREE),
        weekly_profile,
    }
}

pub fn hydro_activity(table: &ProcessedTable) -> HydroActivity {
    let mut activity = HydroActivity::default();
    let mut was_active = false;
    for row in table.rows() {
        let active = row.generation_of(SeriesId::Hydro).unwrap_or(0.0) > 0.0;
        if active {
            activity.active_hours += 1;
            if !was_active {
                activity.starts += 1;
            }
        }
        was_active = active;
    }
    activity
}

/// Mean consumption per weekday, skipping rows without consumption.
pub fn weekday_averages(table: &ProcessedTable) -> Vec<(Weekday, f64)> {
    let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        if let Some(c) = row.consumption {
            let entry = sums
                .entry(row.timestamp.weekday().num_days_from_monday())
                .or_insert((0.0, 0));
            entry.0 += c;
            entry.1 += 1;
        }
    }

    let mut averages: Vec<(Weekday, f64)> = sums
        .into_iter()
        .map(|(day, (sum, n))| (WEEKDAYS[day as usize], sum / n as f64))
        .collect();
    averages.sort_by(|a, b| b.1.total_cmp(&a.1));
    averages
}

pub fn weekly_profile(table: &ProcessedTable) -> Vec<(u32, f64)> {
    let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        if let Some(c) = row.consumption {
            let hour = row.timestamp.weekday().num_days_from_monday() * 24 + row.timestamp.hour();
            let entry = sums.entry(hour).or_insert((0.0, 0));
            entry.0 += c;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(hour, (sum, n))| (hour, sum / n as f64))
        .collect()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis report (last 6 months)")?;
        writeln!(f, "{}", "-".repeat(50))?;
        writeln!(f)?;
        writeln!(f, "Hydro power plants:")?;
        writeln!(f, "   - Starts: {}", self.hydro.starts)?;
        writeln!(f, "   - Hours in operation: {}", self.hydro.active_hours)?;
        writeln!(f)?;
        writeln!(f, "Weekday with the highest consumption:")?;
        let peak = self.peak_weekday().map(weekday_name).unwrap_or("N/A");
        writeln!(f, "   - Highest average consumption: {}", peak)?;
        writeln!(f, "   - Average consumption per weekday (MW):")?;
        for (day, avg) in &self.weekday_averages {
            writeln!(f, "     {:<10} {:>12.3}", weekday_name(*day), avg)?;
        }
        writeln!(f)?;
        writeln!(f, "Polynomial coefficients (degree {}):", PROFILE_DEGREE)?;
        match &self.coefficients {
            Some(coeffs) => {
                let formatted: Vec<String> = coeffs.iter().map(|c| format!("{:.8e}", c)).collect();
                writeln!(f, "   [{}]", formatted.join(", "))?;
            }
            None => writeln!(f, "   not enough data for the fit")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::normalize::NormalizedSeries;
    use crate::process::process;
    use crate::report::polyfit::polyval;
    use crate::table::merge;

    // 2024-01-01 is a Monday
    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn table(
        hydro: &[(NaiveDateTime, f64)],
        consumption: &[(NaiveDateTime, f64)],
    ) -> ProcessedTable {
        let to_series = |series, points: &[(NaiveDateTime, f64)]| NormalizedSeries {
            series,
            points: points.iter().map(|(t, v)| (*t, Some(*v))).collect(),
        };
        process(merge(vec![
            to_series(SeriesId::Hydro, hydro),
            to_series(SeriesId::Consumption, consumption),
        ]))
    }

    #[test]
    fn hydro_starts_and_hours() {
        let hydro = [
            (at(1, 0), 5.0),
            (at(1, 1), 5.0),
            (at(1, 2), 0.0),
            (at(1, 3), 2.0),
            (at(1, 4), 0.0),
            (at(1, 5), 1.0),
        ];
        let processed = table(&hydro, &[]);

        let activity = hydro_activity(&processed);

        assert_eq!(activity, HydroActivity { starts: 3, active_hours: 4 });
    }

    #[test]
    fn hydro_gap_counts_as_idle() {
        let processed = table(&[(at(1, 0), 5.0), (at(1, 2), 5.0)], &[(at(1, 1), 1.0)]);
        assert_eq!(
            hydro_activity(&processed),
            HydroActivity { starts: 2, active_hours: 2 }
        );
    }

    #[test]
    fn weekday_with_highest_consumption() {
        let consumption = [
            (at(1, 0), 10.0),
            (at(1, 12), 20.0),
            (at(2, 0), 40.0),
            (at(3, 0), 5.0),
            (at(8, 0), 30.0),
        ];
        let report = analyze(&table(&[], &consumption));

        assert_eq!(report.peak_weekday(), Some(Weekday::Tue));
        assert_eq!(
            report.weekday_averages,
            vec![(Weekday::Tue, 40.0), (Weekday::Mon, 20.0), (Weekday::Wed, 5.0)]
        );
        assert_eq!(report.coefficients, None);
        assert!(report.to_string().contains("Highest average consumption: Tuesday"));
    }

    #[test]
    fn weekly_profile_averages_by_hour_of_week() {
        let consumption = [(at(1, 3), 10.0), (at(8, 3), 20.0), (at(7, 23), 7.0)];
        let profile = weekly_profile(&table(&[], &consumption));
        assert_eq!(profile, vec![(3, 15.0), (167, 7.0)]);
    }

    #[test]
    fn full_week_gets_a_fit() {
        let consumption: Vec<(NaiveDateTime, f64)> = (0..14 * 24)
            .map(|h| {
                let t = at(1, 0) + chrono::Duration::hours(h);
                let hour_of_week = (h % 168) as f64;
                (t, 1000.0 + 2.0 * hour_of_week)
            })
            .collect();

        let report = analyze(&table(&[], &consumption));

        assert_eq!(report.weekly_profile.len(), 168);
        let coeffs = report.coefficients.unwrap();
        assert_eq!(coeffs.len(), PROFILE_DEGREE + 1);
        assert!((polyval(&coeffs, 100.0) - 1200.0).abs() < 1e-3);
    }

    #[test]
    fn empty_report_text() {
        let report = analyze(&ProcessedTable::default());
        assert_eq!(report.peak_weekday(), None);
        let text = report.to_string();
        assert!(text.contains("Starts: 0"));
        assert!(text.contains("N/A"));
        assert!(text.contains("not enough data"));
    }
}
