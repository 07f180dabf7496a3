//! The fixed catalogue of analysis functions the pipeline may dispatch to.
//!
//! Function names are a closed enum and their parameter sets are typed, so
//! an unknown name fails when it is parsed and a call can never reach an
//! analysis function with the wrong parameter shape.

pub mod call;
pub mod catalog;
pub mod params;

pub use call::{AnalysisResult, FunctionCall, execute};
pub use catalog::{FunctionDescriptor, ParameterOption};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown function '{0}'")]
    NotFound(String),
    #[error("invalid parameters for {function}: {source}")]
    InvalidParameters {
        function: FunctionName,
        source: serde_json::Error,
    },
}

/// Name of a registered analysis function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionName {
    FilterCrzData,
    AnalyzeEntryPointVolume,
    AnalyzePeakPeriods,
    AnalyzeVehicleDistribution,
    AnalyzeTimeTrends,
    AnalyzeExcludedRoadwayUsage,
    AnalyzeVehiclePatterns,
    CompareTrafficSegments,
    GenerateVisualization,
    AnalyzeRegionalTrafficFlow,
    ForecastCongestion,
}

impl FunctionName {
    pub const ALL: [FunctionName; 11] = [
        FunctionName::FilterCrzData,
        FunctionName::AnalyzeEntryPointVolume,
        FunctionName::AnalyzePeakPeriods,
        FunctionName::AnalyzeVehicleDistribution,
        FunctionName::AnalyzeTimeTrends,
        FunctionName::AnalyzeExcludedRoadwayUsage,
        FunctionName::AnalyzeVehiclePatterns,
        FunctionName::CompareTrafficSegments,
        FunctionName::GenerateVisualization,
        FunctionName::AnalyzeRegionalTrafficFlow,
        FunctionName::ForecastCongestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionName::FilterCrzData => "filter_crz_data",
            FunctionName::AnalyzeEntryPointVolume => "analyze_entry_point_volume",
            FunctionName::AnalyzePeakPeriods => "analyze_peak_periods",
            FunctionName::AnalyzeVehicleDistribution => "analyze_vehicle_distribution",
            FunctionName::AnalyzeTimeTrends => "analyze_time_trends",
            FunctionName::AnalyzeExcludedRoadwayUsage => "analyze_excluded_roadway_usage",
            FunctionName::AnalyzeVehiclePatterns => "analyze_vehicle_patterns",
            FunctionName::CompareTrafficSegments => "compare_traffic_segments",
            FunctionName::GenerateVisualization => "generate_visualization",
            FunctionName::AnalyzeRegionalTrafficFlow => "analyze_regional_traffic_flow",
            FunctionName::ForecastCongestion => "forecast_congestion",
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        FunctionName::ALL
            .into_iter()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}

/// Descriptor for a function given by name.
pub fn describe(name: &str) -> Result<&'static FunctionDescriptor, RegistryError> {
    let function: FunctionName = name.parse()?;
    Ok(catalog::descriptor(function))
}

/// Every registered function, in catalogue order.
pub fn functions() -> &'static [FunctionDescriptor] {
    &catalog::FUNCTIONS
}

/// JSON schema for the parameter object of `name`.
///
/// Enumerated options are embedded as `enum` constraints to guide
/// extraction; they are not enforced when a call is executed.
pub fn parameter_schema(name: &str) -> Result<Value, RegistryError> {
    let descriptor = describe(name)?;

    let mut properties = Map::new();
    for param in descriptor.parameters() {
        properties.insert(param.to_string(), catalog::property_schema(param));
    }

    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": descriptor.required,
        "additionalProperties": false,
    }))
}

/// Allowed values or format hints for each parameter of `name`.
pub fn enumerated_options(
    name: &str,
) -> Result<Vec<(&'static str, ParameterOption)>, RegistryError> {
    let descriptor = describe(name)?;
    Ok(descriptor
        .parameters()
        .filter_map(|param| catalog::option_for(param).map(|o| (param, o)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_exactly() {
        for function in FunctionName::ALL {
            assert_eq!(function.as_str().parse::<FunctionName>().unwrap(), function);
            assert_eq!(
                serde_json::to_value(function).unwrap(),
                Value::String(function.as_str().to_string())
            );
        }
        assert_eq!(functions().len(), FunctionName::ALL.len());
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        assert!(matches!(describe("predict_weather"), Err(RegistryError::NotFound(n)) if n == "predict_weather"));
        assert!(matches!(parameter_schema("nope"), Err(RegistryError::NotFound(_))));
        assert!(matches!(enumerated_options("nope"), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_parameter_schema() {
        let schema = parameter_schema("analyze_vehicle_patterns").unwrap();
        assert_eq!(schema["required"], json!(["vehicle_class"]));
        assert_eq!(schema["properties"]["hour_range"]["type"], "array");
        assert_eq!(
            schema["properties"]["time_period"]["enum"],
            json!(["Peak", "Overnight"])
        );

        let schema = parameter_schema("compare_traffic_segments").unwrap();
        assert_eq!(schema["properties"]["segment_a"]["type"], "object");
        assert_eq!(
            schema["required"],
            json!(["dimension", "segment_a", "segment_b"])
        );
    }

    #[test]
    fn test_enumerated_options() {
        let options = enumerated_options("analyze_peak_periods").unwrap();
        let granularity = options.iter().find(|(p, _)| *p == "granularity").unwrap();
        assert_eq!(
            granularity.1,
            ParameterOption::Choices(&["hour", "day_of_week", "date", "10_minute"])
        );
    }
}
