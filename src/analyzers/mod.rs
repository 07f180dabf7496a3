//! The fixed library of analysis functions.
//!
//! Every function filters the dataset with its [`FilterSpec`](crate::filter::FilterSpec),
//! aggregates the resulting view and returns a serializable report carrying
//! a `filter_summary`. An empty view is a valid input: functions return zeroed
//! reports with a `"No data"` date range instead of failing.

pub mod comparison;
pub mod entry_points;
pub mod excluded;
pub mod filtered;
pub mod forecast;
pub mod peaks;
pub mod regions;
pub mod segments;
pub mod trends;
pub mod types;
pub mod utility;
pub mod vehicles;
pub mod visualization;

pub use comparison::resolve_comparison;
pub use entry_points::analyze_entry_point_volume;
pub use excluded::analyze_excluded_roadway_usage;
pub use filtered::filter_records;
pub use forecast::forecast_congestion;
pub use peaks::analyze_peak_periods;
pub use regions::analyze_regional_traffic_flow;
pub use segments::compare_traffic_segments;
pub use trends::analyze_time_trends;
pub use vehicles::{analyze_vehicle_distribution, analyze_vehicle_patterns};
pub use visualization::generate_visualization;

use thiserror::Error;

/// Errors raised by an analysis function. Empty results are never errors.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("unsupported {parameter}: '{value}'")]
    UnsupportedValue {
        parameter: &'static str,
        value: String,
    },
    #[error("invalid parameters: {0}")]
    Validation(String),
}

impl AnalysisError {
    pub(crate) fn unsupported(parameter: &'static str, value: &str) -> Self {
        AnalysisError::UnsupportedValue {
            parameter,
            value: value.to_string(),
        }
    }
}

/// Volume column an analysis sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    CrzEntries,
    ExcludedRoadwayEntries,
}

impl Metric {
    pub fn parse(value: Option<&str>) -> Result<Self, AnalysisError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Metric::CrzEntries),
            Some(v) => match v.to_lowercase().replace(['_', '-'], " ").as_str() {
                "crz entries" => Ok(Metric::CrzEntries),
                "excluded roadway entries" => Ok(Metric::ExcludedRoadwayEntries),
                _ => Err(AnalysisError::unsupported("metric", v)),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::CrzEntries => "CRZ Entries",
            Metric::ExcludedRoadwayEntries => "Excluded Roadway Entries",
        }
    }

    pub fn of(&self, r: &crate::dataset::Record) -> u64 {
        match self {
            Metric::CrzEntries => r.crz_entries,
            Metric::ExcludedRoadwayEntries => r.excluded_roadway_entries,
        }
    }
}

/// Converts an optional model-supplied count into a `usize`, clamping
/// negatives to zero.
pub(crate) fn top_n(value: Option<i64>, default: usize) -> usize {
    value.map(|n| n.max(0) as usize).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse() {
        assert_eq!(Metric::parse(None).unwrap(), Metric::CrzEntries);
        assert_eq!(Metric::parse(Some("CRZ Entries")).unwrap(), Metric::CrzEntries);
        assert_eq!(
            Metric::parse(Some("excluded_roadway_entries")).unwrap(),
            Metric::ExcludedRoadwayEntries
        );
        assert!(matches!(
            Metric::parse(Some("revenue")),
            Err(AnalysisError::UnsupportedValue { parameter: "metric", .. })
        ));
    }

    #[test]
    fn test_top_n_clamps() {
        assert_eq!(top_n(None, 5), 5);
        assert_eq!(top_n(Some(-2), 5), 0);
        assert_eq!(top_n(Some(3), 5), 3);
    }
}
