//! Rule-based congestion forecast from recent history.
//!
//! The forecast is the mean of comparable historical observations (same
//! weekday, optionally the same hour), scaled by a clamped linear trend and
//! wrapped in a normal-approximation confidence band. There are no learned
//! parameters.

use crate::analyzers::AnalysisError;
use crate::analyzers::types::{CongestionForecast, ConfidenceInterval, ForecastFilters};
use crate::analyzers::utility::{argmax, linear_slope, mean, stddev, sum_by};
use crate::dataset::record::WEEKDAYS_SUNDAY_FIRST;
use crate::dataset::{Dataset, parse_date};
use crate::filter::{FilterSpec, HourRange, filter_crz_data};
use crate::registry::params::ForecastParams;
use chrono::{Datelike, Duration, NaiveDate, TimeDelta, Weekday};

const DEFAULT_LOOKBACK_DAYS: i64 = 30;
const MIN_TREND_DAYS: usize = 7;
const TREND_FACTOR_BOUNDS: (f64, f64) = (0.5, 1.5);
const Z_95: f64 = 1.96;

/// Forecasts CRZ entries for a target day (and optionally hour).
///
/// `today` anchors relative day types such as `"weekend"`; callers pass the
/// current date. An empty historical window yields a forecast with no volume
/// and an explanatory status, not an error.
pub fn forecast_congestion(
    dataset: &Dataset,
    params: &ForecastParams,
    today: NaiveDate,
) -> Result<CongestionForecast, AnalysisError> {
    let target = target_date(params, today)?;
    let target_day = weekday_name(target);
    let forecast_hour = match params.forecast_hour {
        None => None,
        Some(h) if (0..=23).contains(&h) => Some(h as u8),
        Some(h) => {
            return Err(AnalysisError::Validation(format!(
                "forecast_hour must be between 0 and 23, got {h}"
            )));
        }
    };
    let lookback_days = params.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS).max(0);
    let use_trends = params.use_historical_trends.unwrap_or(true);

    let mut forecast = CongestionForecast {
        target_date: target.format("%Y-%m-%d").to_string(),
        target_day: target_day.to_string(),
        forecast_hour,
        forecast_volume: None,
        base_forecast: None,
        trend_factor: 1.0,
        confidence_interval: None,
        historical_window: "No data".to_string(),
        historical_days: 0,
        status: String::new(),
        contextual_factors: Vec::new(),
        filters: ForecastFilters {
            region: label(&params.region, "All regions"),
            entry_point: label(&params.entry_point, "All entry points"),
            vehicle_class: label(&params.vehicle_class, "All vehicles"),
            lookback_days,
            use_historical_trends: use_trends,
        },
    };

    let (Some(earliest), Some(latest)) = (dataset.earliest_date(), dataset.latest_date()) else {
        forecast.status = "Insufficient data: the dataset is empty".to_string();
        return Ok(forecast);
    };
    let window_start = lookback_start(earliest, latest, lookback_days);
    forecast.historical_window = format!(
        "{} to {}",
        window_start.format("%Y-%m-%d"),
        latest.format("%Y-%m-%d")
    );

    // same location and vehicle constraints, any weekday and hour
    let context_spec = FilterSpec {
        start_date: Some(window_start.format("%Y-%m-%d").to_string()),
        end_date: Some(latest.format("%Y-%m-%d").to_string()),
        entry_region: params.region.clone(),
        entry_point: params.entry_point.clone(),
        vehicle_class: params.vehicle_class.clone(),
        ..Default::default()
    };
    let window_spec = FilterSpec {
        day_type: Some(target_day.to_string()),
        hour_range: forecast_hour.map(|h| HourRange(h, h)),
        ..context_spec.clone()
    };
    let context = filter_crz_data(dataset, &context_spec);
    let window = filter_crz_data(dataset, &window_spec);

    if window.is_empty() {
        forecast.status = format!(
            "Insufficient data: no historical {target_day} records match the filters in {}",
            forecast.historical_window
        );
        return Ok(forecast);
    }

    let daily = sum_by(&window, |r| r.toll_date, |r| r.crz_entries);
    let daily_totals: Vec<f64> = daily.values().map(|v| *v as f64).collect();
    let entries: Vec<f64> = window.iter().map(|r| r.crz_entries as f64).collect();

    let base = match forecast_hour {
        Some(_) => mean(&entries),
        None => mean(&daily_totals),
    };

    let days_ahead = (target - latest).num_days();
    let trend_factor = if use_trends && daily.len() > MIN_TREND_DAYS {
        trend_factor(&daily_totals, days_ahead)
    } else {
        1.0
    };

    let volume = base * trend_factor;
    let sigma = stddev(&entries, mean(&entries));

    forecast.base_forecast = Some(base);
    forecast.trend_factor = trend_factor;
    forecast.forecast_volume = Some(volume);
    forecast.confidence_interval = Some(ConfidenceInterval {
        low: (volume - Z_95 * sigma).max(0.0),
        high: volume + Z_95 * sigma,
    });
    forecast.historical_days = daily.len();
    forecast.status = format!("Forecast based on {} days of historical data", daily.len());

    let peak_hour = argmax(sum_by(&context, |r| r.hour_of_day, |r| r.crz_entries));
    let peak_day = argmax(sum_by(&context, |r| r.day_of_week.clone(), |r| r.crz_entries));

    if let (Some(hour), Some(peak)) = (forecast_hour, peak_hour) {
        if hours_apart(hour, peak) <= 1 {
            forecast.contextual_factors.push(format!(
                "{hour:02}:00 is within an hour of the historical peak hour ({peak:02}:00)"
            ));
        }
    }
    if peak_day.as_deref() == Some(target_day) {
        forecast
            .contextual_factors
            .push(format!("{target_day} is historically the busiest day of the week"));
    }
    if (trend_factor - 1.0).abs() > 0.05 {
        let direction = if trend_factor > 1.0 { "upward" } else { "downward" };
        forecast.contextual_factors.push(format!(
            "Recent {direction} trend adjusts the forecast by {:+.1}%",
            (trend_factor - 1.0) * 100.0
        ));
    }

    Ok(forecast)
}

/// First day of the lookback window, never earlier than the first recorded day.
fn lookback_start(earliest: NaiveDate, latest: NaiveDate, lookback_days: i64) -> NaiveDate {
    TimeDelta::try_days(lookback_days)
        .and_then(|span| latest.checked_sub_signed(span))
        .map_or(earliest, |start| start.max(earliest))
}

/// Distance between two hours of the day on a 24-hour clock.
fn hours_apart(a: u8, b: u8) -> u8 {
    let d = a.abs_diff(b) % 24;
    d.min(24 - d)
}

/// Projects the OLS slope of daily totals `days_ahead` days forward as a
/// multiplicative factor, clamped to [0.5, 1.5].
fn trend_factor(daily_totals: &[f64], days_ahead: i64) -> f64 {
    let avg = mean(daily_totals);
    if avg <= 0.0 {
        return 1.0;
    }
    let change_per_day = linear_slope(daily_totals) / avg;
    let (low, high) = TREND_FACTOR_BOUNDS;
    (1.0 + change_per_day * days_ahead as f64).clamp(low, high)
}

fn target_date(params: &ForecastParams, today: NaiveDate) -> Result<NaiveDate, AnalysisError> {
    if let Some(date) = params.forecast_date.as_deref().filter(|d| !d.is_empty()) {
        return parse_date(date).ok_or_else(|| {
            AnalysisError::Validation(format!("forecast_date '{date}' is not a valid date"))
        });
    }

    let tomorrow = today + Duration::days(1);
    let Some(day_type) = params.forecast_day_type.as_deref().filter(|d| !d.is_empty()) else {
        return Ok(tomorrow);
    };

    match day_type.trim().to_lowercase().as_str() {
        "weekday" => Ok(next_matching(tomorrow, |d| !is_weekend(d))),
        "weekend" => Ok(next_matching(tomorrow, is_weekend)),
        name => {
            let index = WEEKDAYS_SUNDAY_FIRST
                .iter()
                .position(|d| d.to_lowercase() == name)
                .ok_or_else(|| AnalysisError::unsupported("forecast_day_type", day_type))?;
            let current = today.weekday().num_days_from_sunday() as i64;
            let ahead = match (index as i64 - current).rem_euclid(7) {
                0 => 7,
                n => n,
            };
            Ok(today + Duration::days(ahead))
        }
    }
}

fn next_matching(from: NaiveDate, predicate: impl Fn(NaiveDate) -> bool) -> NaiveDate {
    from.iter_days().take(7).find(|d| predicate(*d)).unwrap_or(from)
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS_SUNDAY_FIRST[date.weekday().num_days_from_sunday() as usize]
}

fn label(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// One row per Monday, starting 2025-01-06.
    fn mondays(volumes: &[u64]) -> Dataset {
        let records = volumes
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let day = date(2025, 1, 6) + Duration::weeks(i as i64);
                Record::new(day, 8, 0, "Peak", "1 - Passenger Vehicle", "Holland Tunnel", "New Jersey", *v, 0)
            })
            .collect();
        Dataset::new(records)
    }

    fn day_type(d: &str) -> ForecastParams {
        ForecastParams {
            forecast_day_type: Some(d.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_target_date_resolution() {
        // 2025-01-08 is a Wednesday
        let wednesday = date(2025, 1, 8);
        assert_eq!(target_date(&ForecastParams::default(), wednesday).unwrap(), date(2025, 1, 9));
        assert_eq!(target_date(&day_type("weekday"), wednesday).unwrap(), date(2025, 1, 9));
        assert_eq!(target_date(&day_type("weekend"), wednesday).unwrap(), date(2025, 1, 11));
        assert_eq!(target_date(&day_type("Friday"), wednesday).unwrap(), date(2025, 1, 10));
        assert_eq!(target_date(&day_type("wednesday"), wednesday).unwrap(), date(2025, 1, 15));

        let friday = date(2025, 1, 10);
        assert_eq!(target_date(&day_type("weekday"), friday).unwrap(), date(2025, 1, 13));

        let explicit = ForecastParams {
            forecast_date: Some("2025-03-01".into()),
            forecast_day_type: Some("Monday".into()),
            ..Default::default()
        };
        assert_eq!(target_date(&explicit, wednesday).unwrap(), date(2025, 3, 1));
    }

    #[test]
    fn test_bad_day_type_and_date() {
        let today = date(2025, 1, 8);
        assert_eq!(
            target_date(&day_type("holiday"), today).unwrap_err(),
            AnalysisError::unsupported("forecast_day_type", "holiday")
        );
        let params = ForecastParams {
            forecast_date: Some("next week".into()),
            ..Default::default()
        };
        assert!(matches!(
            target_date(&params, today),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_window_is_not_an_error() {
        let dataset = mondays(&[100, 120, 140]);
        let params = ForecastParams {
            region: Some("Nowhere".into()),
            ..day_type("Monday")
        };
        let result = forecast_congestion(&dataset, &params, date(2025, 1, 21)).unwrap();

        assert_eq!(result.forecast_volume, None);
        assert_eq!(result.confidence_interval, None);
        assert!(!result.status.is_empty());
        assert_eq!(result.filters.region, "Nowhere");
    }

    #[test]
    fn test_hourly_forecast_with_context() {
        let dataset = mondays(&[100, 120, 140]);
        let params = ForecastParams {
            forecast_hour: Some(8),
            ..day_type("Monday")
        };
        let result = forecast_congestion(&dataset, &params, date(2025, 1, 21)).unwrap();

        assert_eq!(result.target_date, "2025-01-27");
        assert_eq!(result.target_day, "Monday");
        assert_eq!(result.forecast_volume, Some(120.0));
        assert_eq!(result.trend_factor, 1.0);
        assert_eq!(result.historical_days, 3);
        // the 30-day window starts before the first recorded Monday
        assert_eq!(result.historical_window, "2025-01-06 to 2025-01-20");

        let ci = result.confidence_interval.unwrap();
        assert!(ci.low > 0.0 && ci.low < 120.0);
        assert!((ci.high - 120.0 - 1.96 * (800.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(result.contextual_factors.len(), 2);
    }

    #[test]
    fn test_low_bound_is_floored() {
        let dataset = mondays(&[0, 0, 300]);
        let result = forecast_congestion(&dataset, &day_type("Monday"), date(2025, 1, 21)).unwrap();
        assert_eq!(result.forecast_volume, Some(100.0));
        assert_eq!(result.confidence_interval.unwrap().low, 0.0);
    }

    #[test]
    fn test_trend_factor_is_clamped() {
        let rising: Vec<u64> = (1..=10).map(|i| i * 100).collect();
        let params = ForecastParams {
            forecast_date: Some("2025-06-02".into()),
            lookback_days: Some(100),
            ..Default::default()
        };
        let result = forecast_congestion(&mondays(&rising), &params, date(2025, 3, 11)).unwrap();
        assert_eq!(result.trend_factor, 1.5);
        assert_eq!(result.forecast_volume, Some(825.0));
        assert_eq!(result.contextual_factors.len(), 2);

        let falling: Vec<u64> = rising.iter().rev().copied().collect();
        let result = forecast_congestion(&mondays(&falling), &params, date(2025, 3, 11)).unwrap();
        assert_eq!(result.trend_factor, 0.5);
    }

    #[test]
    fn test_trends_can_be_disabled() {
        let rising: Vec<u64> = (1..=10).map(|i| i * 100).collect();
        let params = ForecastParams {
            forecast_date: Some("2025-06-02".into()),
            lookback_days: Some(100),
            use_historical_trends: Some(false),
            ..Default::default()
        };
        let result = forecast_congestion(&mondays(&rising), &params, date(2025, 3, 11)).unwrap();
        assert_eq!(result.trend_factor, 1.0);
        assert_eq!(result.forecast_volume, Some(550.0));
    }

    #[test]
    fn test_hour_out_of_range() {
        let params = ForecastParams {
            forecast_hour: Some(24),
            ..Default::default()
        };
        assert!(matches!(
            forecast_congestion(&mondays(&[1]), &params, date(2025, 1, 8)),
            Err(AnalysisError::Validation(_))
        ));
    }

    #[test]
    fn test_lookback_start_is_bounded_by_the_data() {
        let (first, last) = (date(2025, 1, 6), date(2025, 1, 20));
        assert_eq!(lookback_start(first, last, 0), last);
        assert_eq!(lookback_start(first, last, 7), date(2025, 1, 13));
        assert_eq!(lookback_start(first, last, 30), first);
        assert_eq!(lookback_start(first, last, 100_000_000), first);
        assert_eq!(lookback_start(first, last, i64::MAX), first);
    }

    #[test]
    fn test_hours_apart_wraps_midnight() {
        assert_eq!(hours_apart(23, 0), 1);
        assert_eq!(hours_apart(0, 23), 1);
        assert_eq!(hours_apart(7, 9), 2);
        assert_eq!(hours_apart(12, 0), 12);
        assert_eq!(hours_apart(5, 5), 0);
    }

    #[test]
    fn test_late_hour_is_near_a_midnight_peak() {
        let monday = date(2025, 1, 6);
        let dataset = Dataset::new(vec![
            Record::new(monday, 0, 0, "Overnight", "1 - Passenger Vehicle", "Holland Tunnel", "New Jersey", 100, 0),
            Record::new(monday, 23, 0, "Overnight", "1 - Passenger Vehicle", "Holland Tunnel", "New Jersey", 10, 0),
        ]);
        let params = ForecastParams {
            forecast_hour: Some(23),
            ..day_type("Monday")
        };
        let result = forecast_congestion(&dataset, &params, date(2025, 1, 8)).unwrap();

        assert_eq!(result.forecast_volume, Some(10.0));
        assert!(
            result
                .contextual_factors
                .iter()
                .any(|f| f.contains("historical peak hour (00:00)")),
            "{:?}",
            result.contextual_factors
        );
    }
}
