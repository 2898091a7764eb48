use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDateTime};
use plotters::prelude::*;
use tracing::info;

use crate::api::series::SeriesId;
use crate::process::ProcessedTable;
use crate::table::RollingWindow;

use super::polyfit::polyval;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 600;

const SOURCE_COLORS: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// Time axis covering the table; a single row gets one hour of width.
fn time_axis(points: &[(NaiveDateTime, f64)]) -> Option<RangedDateTime<NaiveDateTime>> {
    let first = points.first()?.0;
    let mut last = points.last()?.0;
    if last <= first {
        last = first + Duration::hours(1);
    }
    Some(RangedDateTime::from(first..last))
}

/// Padded `(min, max)` of the values, never an empty range.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1.0);
    (min - pad, max + pad)
}

/// Total generation and consumption over time.
pub fn generation_consumption_chart(
    table: &ProcessedTable,
    path: &Path,
) -> Result<Option<PathBuf>, anyhow::Error> {
    let table = table.clone().trim_to_six_months();
    let generation: Vec<(NaiveDateTime, f64)> = table
        .rows()
        .iter()
        .map(|r| (r.timestamp, r.total_generation))
        .collect();
    let consumption: Vec<(NaiveDateTime, f64)> = table
        .rows()
        .iter()
        .filter_map(|r| r.consumption.map(|c| (r.timestamp, c)))
        .collect();
    let axis = match time_axis(&generation) {
        Some(axis) => axis,
        None => return Ok(None),
    };
    let (y_min, y_max) = value_range(generation.iter().chain(&consumption).map(|(_, v)| *v));

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Electricity generation and consumption (last 6 months)", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(axis, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("MW")
        .x_label_formatter(&|dt| dt.format("%Y-%m-%d").to_string())
        .draw()?;

    chart
        .draw_series(LineSeries::new(generation, &BLUE))?
        .label("Total generation")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(consumption, &RED))?
        .label("Consumption")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %path.display(), "chart saved");
    Ok(Some(path.to_path_buf()))
}

/// Imbalance with surplus shaded green and deficit shaded red.
///
/// Nothing is drawn, and `None` returned, when no row has an imbalance.
pub fn imbalance_chart(
    table: &ProcessedTable,
    path: &Path,
) -> Result<Option<PathBuf>, anyhow::Error> {
    let table = table.clone().trim_to_six_months();
    let points: Vec<(NaiveDateTime, f64)> = table
        .rows()
        .iter()
        .filter_map(|r| r.imbalance.map(|i| (r.timestamp, i)))
        .collect();
    let axis = match time_axis(&points) {
        Some(axis) => axis,
        None => return Ok(None),
    };
    let (y_min, y_max) = value_range(points.iter().map(|(_, v)| *v).chain([0.0]));

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Generation and consumption imbalance", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(axis, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("MW")
        .x_label_formatter(&|dt| dt.format("%Y-%m-%d").to_string())
        .draw()?;

    chart
        .draw_series(AreaSeries::new(
            points.iter().map(|(t, v)| (*t, v.max(0.0))),
            0.0,
            GREEN.mix(0.3),
        ))?
        .label("Surplus")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], GREEN.mix(0.3).filled()));

    chart
        .draw_series(AreaSeries::new(
            points.iter().map(|(t, v)| (*t, v.min(0.0))),
            0.0,
            RED.mix(0.3),
        ))?
        .label("Deficit")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], RED.mix(0.3).filled()));

    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        BLACK.mix(0.5).stroke_width(1),
    ))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %path.display(), "chart saved");
    Ok(Some(path.to_path_buf()))
}

/// Generation per source summed by calendar month, sources without output left out.
pub fn monthly_generation_mix(table: &ProcessedTable) -> BTreeMap<String, Vec<(SeriesId, f64)>> {
    let mut sums: BTreeMap<String, [f64; 6]> = BTreeMap::new();
    for row in table.rows() {
        let month = format!("{:04}-{:02}", row.timestamp.year(), row.timestamp.month());
        let entry = sums.entry(month).or_insert([0.0; 6]);
        for (acc, value) in entry.iter_mut().zip(row.generation) {
            *acc += value;
        }
    }

    sums.into_iter()
        .map(|(month, totals)| {
            let shares: Vec<(SeriesId, f64)> = SeriesId::GENERATION
                .into_iter()
                .zip(totals)
                .filter(|(_, total)| *total > 0.0)
                .collect();
            (month, shares)
        })
        .filter(|(_, shares)| !shares.is_empty())
        .collect()
}

/// One pie per month into `dir`, returns the written files.
pub fn monthly_pies(table: &ProcessedTable, dir: &Path) -> Result<Vec<PathBuf>, anyhow::Error> {
    let table = table.clone().trim_to_six_months();
    let months = monthly_generation_mix(&table);
    if months.is_empty() {
        return Ok(vec![]);
    }
    fs::create_dir_all(dir)?;

    let mut written = vec![];
    for (month, shares) in months {
        let path = dir.join(format!("generation_{}.svg", month));

        let sizes: Vec<f64> = shares.iter().map(|(_, v)| *v).collect();
        let labels: Vec<String> = shares.iter().map(|(s, _)| s.to_string()).collect();
        let colors: Vec<RGBColor> = shares
            .iter()
            .map(|(s, _)| SOURCE_COLORS[s.index()])
            .collect();

        {
            let root = SVGBackend::new(&path, (800, 800)).into_drawing_area();
            root.fill(&WHITE)?;
            let root = root.titled(
                &format!("Generation sources - {}", month),
                ("sans-serif", 24),
            )?;

            let (w, h) = root.dim_in_pixel();
            let center = (w as i32 / 2, h as i32 / 2);
            let radius = f64::from(w.min(h)) * 0.35;

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.start_angle(140.0);
            pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
            pie.percentages(("sans-serif", 14).into_font().color(&BLACK));
            root.draw(&pie)?;
            root.present()?;
        }

        written.push(path);
    }

    info!(dir = %dir.display(), count = written.len(), "monthly pies saved");
    Ok(written)
}

/// Average week of consumption and its polynomial fit.
pub fn weekly_profile_chart(
    profile: &[(u32, f64)],
    coefficients: Option<&[f64]>,
    path: &Path,
) -> Result<Option<PathBuf>, anyhow::Error> {
    if profile.is_empty() {
        return Ok(None);
    }
    let fitted: Vec<(f64, f64)> = match coefficients {
        Some(coeffs) => profile
            .iter()
            .map(|(h, _)| (f64::from(*h), polyval(coeffs, f64::from(*h))))
            .collect(),
        None => vec![],
    };
    let (y_min, y_max) = value_range(
        profile
            .iter()
            .map(|(_, v)| *v)
            .chain(fitted.iter().map(|(_, v)| *v)),
    );

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average consumption week and polynomial model", ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..168f64, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Day of week")
        .y_desc("MW")
        .x_labels(8)
        .x_label_formatter(&|h| {
            let day = (*h / 24.0).floor() as usize;
            ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
                .get(day)
                .map(|d| d.to_string())
                .unwrap_or_default()
        })
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            profile.iter().map(|(h, v)| (f64::from(*h), *v)),
            BLUE.mix(0.6),
        ))?
        .label("Average consumption")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    if !fitted.is_empty() {
        chart
            .draw_series(LineSeries::new(fitted, &RED))?
            .label("Polynomial fit")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    info!(path = %path.display(), "chart saved");
    Ok(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::normalize::NormalizedSeries;
    use crate::process::process;
    use crate::table::merge;

    fn at(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn table() -> ProcessedTable {
        let series = |id, points: Vec<(NaiveDateTime, f64)>| NormalizedSeries {
            series: id,
            points: points.into_iter().map(|(t, v)| (t, Some(v))).collect(),
        };
        process(merge(vec![
            series(SeriesId::Solar, vec![(at(1, 10), 10.0), (at(2, 10), 30.0)]),
            series(SeriesId::Wind, vec![(at(1, 11), 5.0), (at(3, 1), 0.0)]),
            series(
                SeriesId::Consumption,
                vec![(at(1, 10), 12.0), (at(2, 10), 20.0), (at(3, 1), 8.0)],
            ),
        ]))
    }

    #[test]
    fn mix_per_month_skips_idle_sources_and_months() {
        let mix = monthly_generation_mix(&table());

        assert_eq!(mix.len(), 2);
        assert_eq!(
            mix["2024-01"],
            vec![(SeriesId::Solar, 10.0), (SeriesId::Wind, 5.0)]
        );
        assert_eq!(mix["2024-02"], vec![(SeriesId::Solar, 30.0)]);
        assert!(!mix.contains_key("2024-03"));
    }

    #[test]
    fn charts_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let table = table();

        let lines = dir.path().join("lines.svg");
        assert_eq!(
            generation_consumption_chart(&table, &lines).unwrap(),
            Some(lines.clone())
        );
        let imbalance = dir.path().join("imbalance.svg");
        assert_eq!(
            imbalance_chart(&table, &imbalance).unwrap(),
            Some(imbalance.clone())
        );
        let pies = monthly_pies(&table, &dir.path().join("pies")).unwrap();

        assert!(fs::read_to_string(&lines).unwrap().contains("<svg"));
        assert!(imbalance.exists());
        assert_eq!(pies.len(), 2);
        assert!(pies[0].ends_with("generation_2024-01.svg"));
    }

    #[test]
    fn empty_table_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.svg");
        assert_eq!(
            generation_consumption_chart(&ProcessedTable::default(), &path).unwrap(),
            None
        );
        assert!(!path.exists());
        assert!(monthly_pies(&ProcessedTable::default(), dir.path()).unwrap().is_empty());
    }

    #[test]
    fn no_imbalance_chart_without_consumption() {
        let dir = tempfile::tempdir().unwrap();
        let wind = NormalizedSeries {
            series: SeriesId::Wind,
            points: [(at(3, 1), Some(4.0)), (at(3, 2), Some(6.0))].into_iter().collect(),
        };
        let table = process(merge(vec![wind]));

        let path = dir.path().join("imbalance.svg");
        assert_eq!(imbalance_chart(&table, &path).unwrap(), None);
        assert!(!path.exists());
    }
}
