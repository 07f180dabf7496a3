use crate::analyzers::types::{FilterSummary, PeakPeriod, PeakPeriodsReport};
use crate::analyzers::utility::{pct, sort_by_volume_desc, sum_by};
use crate::analyzers::{AnalysisError, top_n};
use crate::dataset::Dataset;
use crate::dataset::record::monday_index;
use crate::filter::filter_crz_data;
use crate::registry::params::PeakPeriodsParams;

const DEFAULT_TOP_N: usize = 5;

/// Time bucket used to find peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hour,
    DayOfWeek,
    Date,
    TenMinute,
}

impl Granularity {
    pub fn parse(value: Option<&str>) -> Result<Self, AnalysisError> {
        match value.map(str::trim) {
            None | Some("") | Some("hour") => Ok(Granularity::Hour),
            Some("day_of_week") => Ok(Granularity::DayOfWeek),
            Some("date") => Ok(Granularity::Date),
            Some("10_minute") => Ok(Granularity::TenMinute),
            Some(other) => Err(AnalysisError::unsupported("granularity", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::DayOfWeek => "day_of_week",
            Granularity::Date => "date",
            Granularity::TenMinute => "10_minute",
        }
    }
}

/// Finds the busiest periods at the requested granularity.
///
/// Candidates are grouped in natural order (hours ascending, weekdays
/// Monday..Sunday, dates chronologically) and then ranked by volume with a
/// stable sort before truncation, so ties keep their natural order.
pub fn analyze_peak_periods(
    dataset: &Dataset,
    params: &PeakPeriodsParams,
) -> Result<PeakPeriodsReport, AnalysisError> {
    let granularity = Granularity::parse(params.granularity.as_deref())?;
    let view = filter_crz_data(dataset, &params.filters);

    let mut periods: Vec<(String, u64)> = match granularity {
        Granularity::Hour => sum_by(&view, |r| r.hour_of_day, |r| r.crz_entries)
            .into_iter()
            .map(|(h, v)| (format!("{h:02}:00"), v))
            .collect(),
        Granularity::DayOfWeek => {
            // unrecognized day names sort after Sunday
            sum_by(
                &view,
                |r| (monday_index(&r.day_of_week).unwrap_or(7), r.day_of_week.clone()),
                |r| r.crz_entries,
            )
            .into_iter()
            .map(|((_, day), v)| (day, v))
            .collect()
        }
        Granularity::Date => sum_by(&view, |r| r.toll_date, |r| r.crz_entries)
            .into_iter()
            .map(|(d, v)| (d.format("%Y-%m-%d").to_string(), v))
            .collect(),
        Granularity::TenMinute => {
            sum_by(&view, |r| (r.hour_of_day, r.minute_of_hour), |r| r.crz_entries)
                .into_iter()
                .map(|((h, m), v)| (format!("{h:02}:{m:02}"), v))
                .collect()
        }
    };

    let total_volume: u64 = periods.iter().map(|(_, v)| v).sum();
    let peak_volume = periods.iter().map(|(_, v)| *v).max().unwrap_or(0);
    let average_volume = if periods.is_empty() {
        0.0
    } else {
        total_volume as f64 / periods.len() as f64
    };
    let peak_to_average_ratio = if average_volume > 0.0 {
        peak_volume as f64 / average_volume
    } else {
        0.0
    };

    sort_by_volume_desc(&mut periods);
    let peak_periods = periods
        .into_iter()
        .take(top_n(params.top_n, DEFAULT_TOP_N))
        .map(|(period, volume)| PeakPeriod {
            period,
            volume,
            percentage_of_total: pct(volume, total_volume),
        })
        .collect();

    let mut filter_summary = FilterSummary::new(&params.filters, &view);
    filter_summary.granularity = Some(granularity.as_str().to_string());

    Ok(PeakPeriodsReport {
        peak_periods,
        peak_to_average_ratio,
        average_volume,
        total_volume,
        filter_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use chrono::NaiveDate;

    /// One row per weekday of the week starting Monday 2025-01-06.
    fn week_fixture(volumes: [u64; 7]) -> Dataset {
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let records = volumes
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let date = monday + chrono::Duration::days(i as i64);
                Record::new(date, 8, 0, "Peak", "1 - Passenger Vehicle", "A", "R", *v, 0)
            })
            .collect();
        Dataset::new(records)
    }

    #[test]
    fn test_day_of_week_top_one_is_busiest_day() {
        let dataset = week_fixture([10, 20, 90, 30, 40, 5, 5]);
        let params = PeakPeriodsParams {
            granularity: Some("day_of_week".into()),
            top_n: Some(1),
            ..Default::default()
        };
        let report = analyze_peak_periods(&dataset, &params).unwrap();

        assert_eq!(report.peak_periods.len(), 1);
        assert_eq!(report.peak_periods[0].period, "Wednesday");
        assert_eq!(report.peak_periods[0].volume, 90);
        assert_eq!(report.total_volume, 200);
    }

    #[test]
    fn test_day_of_week_ties_keep_calendar_order() {
        let dataset = week_fixture([10, 10, 10, 10, 10, 10, 10]);
        let params = PeakPeriodsParams {
            granularity: Some("day_of_week".into()),
            top_n: Some(7),
            ..Default::default()
        };
        let report = analyze_peak_periods(&dataset, &params).unwrap();
        let days: Vec<&str> = report.peak_periods.iter().map(|p| p.period.as_str()).collect();

        assert_eq!(
            days,
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert_eq!(report.peak_to_average_ratio, 1.0);
    }

    #[test]
    fn test_hour_labels_and_ratio() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let dataset = Dataset::new(vec![
            Record::new(date, 7, 0, "Peak", "5 - Bus", "A", "R", 30, 0),
            Record::new(date, 8, 0, "Peak", "5 - Bus", "A", "R", 90, 0),
            Record::new(date, 9, 0, "Peak", "5 - Bus", "A", "R", 30, 0),
        ]);
        let report = analyze_peak_periods(&dataset, &PeakPeriodsParams::default()).unwrap();

        assert_eq!(report.peak_periods[0].period, "08:00");
        assert_eq!(report.peak_periods[0].percentage_of_total, 60.0);
        assert_eq!(report.average_volume, 50.0);
        assert!((report.peak_to_average_ratio - 1.8).abs() < 1e-9);
        assert_eq!(report.filter_summary.granularity.as_deref(), Some("hour"));
    }

    #[test]
    fn test_ten_minute_labels() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let dataset = Dataset::new(vec![Record::new(date, 8, 30, "Peak", "5 - Bus", "A", "R", 3, 0)]);
        let params = PeakPeriodsParams {
            granularity: Some("10_minute".into()),
            ..Default::default()
        };
        let report = analyze_peak_periods(&dataset, &params).unwrap();
        assert_eq!(report.peak_periods[0].period, "08:30");
    }

    #[test]
    fn test_unsupported_granularity() {
        let dataset = week_fixture([1; 7]);
        let params = PeakPeriodsParams {
            granularity: Some("fortnight".into()),
            ..Default::default()
        };
        assert_eq!(
            analyze_peak_periods(&dataset, &params).unwrap_err(),
            AnalysisError::unsupported("granularity", "fortnight")
        );
    }

    #[test]
    fn test_empty_view() {
        let dataset = Dataset::default();
        let report = analyze_peak_periods(&dataset, &PeakPeriodsParams::default()).unwrap();
        assert_eq!(report.total_volume, 0);
        assert_eq!(report.peak_to_average_ratio, 0.0);
        assert!(report.peak_periods.is_empty());
        assert_eq!(report.filter_summary.date_range, "No data");
    }
}
