use crate::analyzers::types::{FilterSummary, TimePoint, TimeTrendsReport, TrendStats};
use crate::analyzers::utility::{mean, sample_stddev, sum_by};
use crate::analyzers::{AnalysisError, Metric};
use crate::dataset::Dataset;
use crate::dataset::record::sunday_index;
use crate::filter::filter_crz_data;
use crate::registry::params::TimeTrendsParams;

/// Bucket used to build a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hour,
    Day,
    DayOfWeek,
    Week,
    Month,
}

impl TimeUnit {
    pub fn parse(value: Option<&str>) -> Result<Self, AnalysisError> {
        match value.map(str::trim) {
            None | Some("") | Some("day") => Ok(TimeUnit::Day),
            Some("hour") => Ok(TimeUnit::Hour),
            Some("day_of_week") => Ok(TimeUnit::DayOfWeek),
            Some("week") => Ok(TimeUnit::Week),
            Some("month") => Ok(TimeUnit::Month),
            Some(other) => Err(AnalysisError::unsupported("time_unit", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::DayOfWeek => "day_of_week",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
        }
    }

    /// Day, week and month series run along the calendar; hour and weekday
    /// series are cyclic profiles.
    pub fn is_chronological(&self) -> bool {
        matches!(self, TimeUnit::Day | TimeUnit::Week | TimeUnit::Month)
    }
}

/// Builds a volume time series and summary statistics.
pub fn analyze_time_trends(
    dataset: &Dataset,
    params: &TimeTrendsParams,
) -> Result<TimeTrendsReport, AnalysisError> {
    let metric = Metric::parse(params.metric.as_deref())?;
    let time_unit = TimeUnit::parse(params.time_unit.as_deref())?;
    let view = filter_crz_data(dataset, &params.filters);
    let value = |r: &crate::dataset::Record| metric.of(r);

    let time_series: Vec<TimePoint> = match time_unit {
        TimeUnit::Hour => sum_by(&view, |r| r.hour_of_day, value)
            .into_iter()
            .map(|(h, v)| point(format!("{h:02}:00"), v))
            .collect(),
        TimeUnit::Day => sum_by(&view, |r| r.toll_date, value)
            .into_iter()
            .map(|(d, v)| point(d.format("%Y-%m-%d").to_string(), v))
            .collect(),
        TimeUnit::DayOfWeek => sum_by(
            &view,
            |r| (sunday_index(&r.day_of_week).unwrap_or(7), r.day_of_week.clone()),
            value,
        )
        .into_iter()
        .map(|((_, d), v)| point(d, v))
        .collect(),
        TimeUnit::Week => sum_by(&view, |r| r.toll_week, value)
            .into_iter()
            .map(|(d, v)| point(d.format("%Y-%m-%d").to_string(), v))
            .collect(),
        TimeUnit::Month => sum_by(&view, |r| (r.year, r.month), value)
            .into_iter()
            .map(|((y, m), v)| point(format!("{y:04}-{m:02}"), v))
            .collect(),
    };

    let total_volume = time_series.iter().map(|p| p.volume).sum();
    let values: Vec<f64> = time_series.iter().map(|p| p.volume as f64).collect();

    Ok(TimeTrendsReport {
        trend_stats: trend_stats(&values, time_unit),
        time_series,
        metric: metric.label().to_string(),
        time_unit: time_unit.as_str().to_string(),
        total_volume,
        filter_summary: FilterSummary::new(&params.filters, &view),
    })
}

fn point(period: String, volume: u64) -> TimePoint {
    TimePoint { period, volume }
}

fn trend_stats(values: &[f64], unit: TimeUnit) -> TrendStats {
    let min_value = values.iter().copied().reduce(f64::min);
    let max_value = values.iter().copied().reduce(f64::max);

    if !unit.is_chronological() || values.len() < 2 {
        return TrendStats::Summary {
            min_value: min_value.unwrap_or(0.0),
            max_value: max_value.unwrap_or(0.0),
            avg_value: mean(values),
        };
    }

    let first = values[0];
    let last = values[values.len() - 1];
    let total_growth = last - first;
    let percent_growth = if first == 0.0 {
        0.0
    } else {
        total_growth / first * 100.0
    };
    let avg_daily_change = (unit == TimeUnit::Day).then(|| {
        let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
        mean(&changes)
    });

    TrendStats::Chronological {
        total_growth,
        percent_growth,
        avg_daily_change,
        min_value: min_value.unwrap_or(0.0),
        max_value: max_value.unwrap_or(0.0),
        std_dev: sample_stddev(values),
    }
}
