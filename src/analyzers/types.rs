//! Result records returned by the analysis functions.
//!
//! Every record is created once by its function and never mutated after; the
//! pipeline serializes it to JSON for answer synthesis.

use crate::dataset::{Record, View};
use crate::filter::{FilterSpec, HourRange};
use serde::Serialize;
use std::collections::BTreeMap;

/// Echo of the filters an analysis actually applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub date_range: String,
    pub day_type: String,
    pub hour_range: String,
    pub time_period: String,
    pub vehicle_class: String,
    pub entry_point: String,
    pub entry_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
}

impl FilterSummary {
    pub fn new(spec: &FilterSpec, view: &View<'_>) -> Self {
        Self {
            date_range: view.date_range_label(),
            day_type: spec.day_type().unwrap_or("All days").to_string(),
            hour_range: spec
                .hour_range
                .as_ref()
                .map(HourRange::to_string)
                .unwrap_or_else(|| "All hours".to_string()),
            time_period: spec.time_period().unwrap_or("All periods").to_string(),
            vehicle_class: spec.vehicle_class().unwrap_or("All vehicles").to_string(),
            entry_point: spec.entry_point().unwrap_or("All entry points").to_string(),
            entry_region: spec.entry_region().unwrap_or("All regions").to_string(),
            granularity: None,
            destination_region: None,
            entry_count: None,
        }
    }
}

/// Result of `filter_crz_data`.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredData {
    pub row_count: usize,
    pub total_crz_entries: u64,
    pub total_excluded_entries: u64,
    pub entry_point_count: usize,
    pub sample: Vec<Record>,
    pub filter_summary: FilterSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPointVolume {
    pub entry_point: String,
    pub region: String,
    pub volume: u64,
    pub percentage: f64,
}

/// Result of `analyze_entry_point_volume`.
#[derive(Debug, Clone, Serialize)]
pub struct EntryPointVolumeReport {
    pub top_entry_points: Vec<EntryPointVolume>,
    pub total_volume: u64,
    pub filter_summary: FilterSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakPeriod {
    pub period: String,
    pub volume: u64,
    pub percentage_of_total: f64,
}

/// Result of `analyze_peak_periods`.
#[derive(Debug, Clone, Serialize)]
pub struct PeakPeriodsReport {
    pub peak_periods: Vec<PeakPeriod>,
    pub peak_to_average_ratio: f64,
    pub average_volume: f64,
    pub total_volume: u64,
    pub filter_summary: FilterSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleShare {
    pub vehicle_class: String,
    pub volume: u64,
    pub percentage: f64,
}

/// Distribution for one named comparison period.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonDistribution {
    pub vehicle_distribution: Vec<VehicleShare>,
    pub total_volume: u64,
    pub filters: FilterSpec,
}

/// Result of `analyze_vehicle_distribution`.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleDistributionReport {
    pub vehicle_distribution: Vec<VehicleShare>,
    pub total_volume: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub comparisons: BTreeMap<String, ComparisonDistribution>,
    pub filter_summary: FilterSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    pub period: String,
    pub volume: u64,
}

/// Trend statistics; the chronological form is only produced for
/// day/week/month series with more than one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrendStats {
    Chronological {
        total_growth: f64,
        percent_growth: f64,
        avg_daily_change: Option<f64>,
        min_value: f64,
        max_value: f64,
        std_dev: f64,
    },
    Summary {
        min_value: f64,
        max_value: f64,
        avg_value: f64,
    },
}

/// Result of `analyze_time_trends`.
#[derive(Debug, Clone, Serialize)]
pub struct TimeTrendsReport {
    pub time_series: Vec<TimePoint>,
    pub trend_stats: TrendStats,
    pub metric: String,
    pub time_unit: String,
    pub total_volume: u64,
    pub filter_summary: FilterSummary,
}

/// CRZ versus excluded-roadway split for one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExclusionSplit {
    pub crz_entries: u64,
    pub excluded_entries: u64,
    pub total: u64,
    pub excluded_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallUsage {
    pub total_entries: u64,
    pub crz_entries: u64,
    pub excluded_entries: u64,
    pub excluded_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPointExclusion {
    pub entry_point: String,
    #[serde(flatten)]
    pub split: ExclusionSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleExclusion {
    pub vehicle_class: String,
    #[serde(flatten)]
    pub split: ExclusionSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyExclusion {
    pub hour: u8,
    #[serde(flatten)]
    pub split: ExclusionSplit,
}

/// Result of `analyze_excluded_roadway_usage`.
#[derive(Debug, Clone, Serialize)]
pub struct ExcludedRoadwayReport {
    pub overall_usage: OverallUsage,
    pub by_entry_point: Vec<EntryPointExclusion>,
    pub by_vehicle_class: Vec<VehicleExclusion>,
    pub by_time: Vec<HourlyExclusion>,
    pub filter_summary: FilterSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourShare {
    pub hour: u8,
    pub volume: u64,
    pub percentage: f64,
}

/// A named share of a segment's volume, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub name: String,
    pub volume: u64,
    pub percentage: f64,
}

/// Result of `analyze_vehicle_patterns`.
#[derive(Debug, Clone, Serialize)]
pub struct VehiclePatternsReport {
    pub vehicle_class: String,
    pub total_volume: u64,
    pub share_of_all_traffic: f64,
    pub peak_hour: Option<u8>,
    pub peak_day: Option<String>,
    pub hourly_distribution: Vec<HourShare>,
    pub day_distribution: Vec<Share>,
    pub top_entry_points: Vec<Share>,
    pub filter_summary: FilterSummary,
}

/// A signed percentage-point change from segment A to segment B.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub name: String,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentProfile {
    pub name: String,
    pub total_volume: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_distribution: Option<BTreeMap<u8, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_distribution: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_distribution: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_entry_points: Option<Vec<Share>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_roadway_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentDifferences {
    pub total_volume_diff: i64,
    pub total_volume_pct_diff: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_distribution_diff: Option<Vec<Delta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point_diff: Option<Vec<Delta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour_distribution_diff: Option<Vec<Delta>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hour_diff: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_roadway_pct_diff: Option<f64>,
}

/// Result of `compare_traffic_segments`.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentComparison {
    pub comparison_type: String,
    pub segment_a: SegmentProfile,
    pub segment_b: SegmentProfile,
    pub differences: SegmentDifferences,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: u64,
}

/// Result of `generate_visualization`: a chart description, not an image.
#[derive(Debug, Clone, Serialize)]
pub struct VisualizationSpec {
    pub chart_type: String,
    pub title: String,
    pub x_column: String,
    pub y_column: String,
    pub data: Vec<ChartPoint>,
    pub filter_summary: FilterSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionVolume {
    pub region: String,
    pub volume: u64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_distribution: Option<Vec<HourShare>>,
}

/// Result of `analyze_regional_traffic_flow`.
#[derive(Debug, Clone, Serialize)]
pub struct RegionalFlowReport {
    pub top_regions: Vec<RegionVolume>,
    pub total_volume: u64,
    pub region_count: usize,
    pub filter_summary: FilterSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

/// Filters echoed back by `forecast_congestion`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastFilters {
    pub region: String,
    pub entry_point: String,
    pub vehicle_class: String,
    pub lookback_days: i64,
    pub use_historical_trends: bool,
}

/// Result of `forecast_congestion`.
#[derive(Debug, Clone, Serialize)]
pub struct CongestionForecast {
    pub target_date: String,
    pub target_day: String,
    pub forecast_hour: Option<u8>,
    pub forecast_volume: Option<f64>,
    pub base_forecast: Option<f64>,
    pub trend_factor: f64,
    pub confidence_interval: Option<ConfidenceInterval>,
    pub historical_window: String,
    pub historical_days: usize,
    pub status: String,
    pub contextual_factors: Vec<String>,
    pub filters: ForecastFilters,
}
