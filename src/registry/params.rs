//! Typed parameter sets, one per registry function.
//!
//! The shared [`FilterSpec`] is flattened into every set that filters the
//! table, so only the function-specific fields are declared here. Fields that
//! a language model tends to emit loosely (numbers as strings, `"True"` for
//! booleans) are accepted in either form.

use crate::filter::{FilterSpec, string_or_number};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryPointVolumeParams {
    #[serde(flatten)]
    pub filters: FilterSpec,
    #[serde(deserialize_with = "loose_int", skip_serializing_if = "Option::is_none")]
    pub top_n: Option<i64>,
    #[serde(deserialize_with = "loose_bool", skip_serializing_if = "Option::is_none")]
    pub include_excluded_roadways: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakPeriodsParams {
    #[serde(flatten)]
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
    #[serde(deserialize_with = "loose_int", skip_serializing_if = "Option::is_none")]
    pub top_n: Option<i64>,
}

/// Comparison periods for the vehicle distribution.
///
/// Usually a list of keywords such as `["weekend", "rush_hour"]`; a single
/// keyword or an explicit filter mapping is accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompareWith {
    Names(Vec<String>),
    Name(String),
    Filters(FilterSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleDistributionParams {
    #[serde(flatten)]
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_with: Option<CompareWith>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeTrendsParams {
    #[serde(flatten)]
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludedRoadwayParams {
    #[serde(flatten)]
    pub filters: FilterSpec,
}

/// `vehicle_class` inside `filters` is required for this function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehiclePatternsParams {
    #[serde(flatten)]
    pub filters: FilterSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSegmentsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_a: Option<FilterSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_b: Option<FilterSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationParams {
    #[serde(flatten)]
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionalFlowParams {
    #[serde(flatten)]
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_region: Option<String>,
    #[serde(deserialize_with = "loose_int", skip_serializing_if = "Option::is_none")]
    pub top_n: Option<i64>,
    #[serde(deserialize_with = "loose_bool", skip_serializing_if = "Option::is_none")]
    pub include_time_variation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_day_type: Option<String>,
    #[serde(deserialize_with = "loose_int", skip_serializing_if = "Option::is_none")]
    pub forecast_hour: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    #[serde(
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub vehicle_class: Option<String>,
    #[serde(deserialize_with = "loose_int", skip_serializing_if = "Option::is_none")]
    pub lookback_days: Option<i64>,
    #[serde(deserialize_with = "loose_bool", skip_serializing_if = "Option::is_none")]
    pub use_historical_trends: Option<bool>,
}

/// Accepts `10`, `10.0` or `"10"`.
fn loose_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Int(n)) => Ok(Some(n)),
        Some(Loose::Float(f)) => Ok(Some(f.trunc() as i64)),
        Some(Loose::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got '{s}'"))),
        None => Ok(None),
    }
}

/// Accepts `true`, `"True"`, `"false"`, `1` or `0`.
fn loose_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Bool(b)) => Ok(Some(b)),
        Some(Loose::Int(n)) => Ok(Some(n != 0)),
        Some(Loose::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(serde::de::Error::custom(format!("expected a boolean, got '{s}'"))),
        },
        None => Ok(None),
    }
}
