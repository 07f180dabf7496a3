use crate::analyzers::comparison::COMPARISON_KEYWORDS;
use crate::analyzers::visualization::CHART_TYPES;
use crate::filter::FILTER_FIELDS;
use crate::registry::FunctionName;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Static description of one analysis function.
#[derive(Debug, Serialize)]
pub struct FunctionDescriptor {
    pub name: FunctionName,
    pub description: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub returns: &'static str,
}

impl FunctionDescriptor {
    /// Required parameters followed by optional ones.
    pub fn parameters(&self) -> impl Iterator<Item = &'static str> {
        self.required.iter().chain(self.optional).copied()
    }

    pub fn accepts(&self, parameter: &str) -> bool {
        self.parameters().any(|p| p == parameter)
    }
}

/// Allowed values for a parameter, or a format hint when the values are
/// open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterOption {
    Choices(&'static [&'static str]),
    Hint(&'static str),
}

const DAY_TYPES: &[&str] = &[
    "weekday",
    "weekend",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const TIME_PERIODS: &[&str] = &["Peak", "Overnight"];

const VEHICLE_CLASSES: &[&str] = &[
    "1 - Passenger Vehicle",
    "2 - Commercial Vehicle",
    "3 - Small Truck",
    "4 - Large Truck",
    "5 - Bus",
    "TLC Taxi/FHV",
];

const METRICS: &[&str] = &["CRZ Entries", "Excluded Roadway Entries"];

pub static FUNCTIONS: [FunctionDescriptor; 11] = [
    FunctionDescriptor {
        name: FunctionName::FilterCrzData,
        description: "Filter the CRZ dataset by multiple parameters",
        required: &[],
        optional: &[
            "start_date",
            "end_date",
            "day_type",
            "hour_range",
            "time_period",
            "vehicle_class",
            "entry_point",
            "entry_region",
        ],
        returns: "Row count, entry totals, date range and a sample of the matching records",
    },
    FunctionDescriptor {
        name: FunctionName::AnalyzeEntryPointVolume,
        description: "Analyze traffic volumes for different entry points",
        required: &[],
        optional: &[
            "start_date",
            "end_date",
            "day_type",
            "hour_range",
            "time_period",
            "vehicle_class",
            "top_n",
            "include_excluded_roadways",
        ],
        returns: "Top entry points by volume and percentage",
    },
    FunctionDescriptor {
        name: FunctionName::AnalyzePeakPeriods,
        description: "Identify peak traffic periods at different time granularities",
        required: &[],
        optional: &[
            "start_date",
            "end_date",
            "day_type",
            "vehicle_class",
            "entry_point",
            "entry_region",
            "granularity",
            "top_n",
        ],
        returns: "Peak periods with volumes and the peak-to-average ratio",
    },
    FunctionDescriptor {
        name: FunctionName::AnalyzeVehicleDistribution,
        description: "Analyze distribution of traffic by vehicle type",
        required: &[],
        optional: &[
            "start_date",
            "end_date",
            "day_type",
            "hour_range",
            "time_period",
            "entry_point",
            "entry_region",
            "compare_with",
        ],
        returns: "Vehicle class breakdown, optionally with comparison periods",
    },
    FunctionDescriptor {
        name: FunctionName::AnalyzeTimeTrends,
        description: "Analyze traffic trends over time",
        required: &[],
        optional: &[
            "start_date",
            "end_date",
            "day_type",
            "vehicle_class",
            "entry_point",
            "entry_region",
            "metric",
            "time_unit",
        ],
        returns: "Time series data and trend statistics",
    },
    FunctionDescriptor {
        name: FunctionName::AnalyzeExcludedRoadwayUsage,
        description: "Analyze usage patterns of excluded roadways vs. congestion zone",
        required: &[],
        optional: &[
            "start_date",
            "end_date",
            "day_type",
            "hour_range",
            "time_period",
            "vehicle_class",
            "entry_region",
        ],
        returns: "Excluded roadway usage overall, by entry point, vehicle class and hour",
    },
    FunctionDescriptor {
        name: FunctionName::AnalyzeVehiclePatterns,
        description: "Analyze traffic patterns for a specific vehicle class",
        required: &["vehicle_class"],
        optional: &[
            "start_date",
            "end_date",
            "day_type",
            "hour_range",
            "time_period",
            "entry_point",
            "entry_region",
        ],
        returns: "Time and location patterns for the vehicle class",
    },
    FunctionDescriptor {
        name: FunctionName::CompareTrafficSegments,
        description: "Compare traffic patterns between two segments",
        required: &["dimension", "segment_a", "segment_b"],
        optional: &["metric"],
        returns: "Profiles of both segments and their key differences",
    },
    FunctionDescriptor {
        name: FunctionName::GenerateVisualization,
        description: "Generate a visualization based on the data",
        required: &["chart_type", "x_column", "y_column"],
        optional: &[
            "title",
            "start_date",
            "end_date",
            "day_type",
            "hour_range",
            "time_period",
            "vehicle_class",
            "entry_point",
            "entry_region",
        ],
        returns: "Chart specification with axis columns and data points",
    },
    FunctionDescriptor {
        name: FunctionName::AnalyzeRegionalTrafficFlow,
        description: "Analyze traffic flows between different regions in the Congestion Relief Zone",
        required: &[],
        optional: &[
            "start_date",
            "end_date",
            "day_type",
            "hour_range",
            "time_period",
            "vehicle_class",
            "source_region",
            "destination_region",
            "top_n",
            "include_time_variation",
        ],
        returns: "Regional traffic flow analysis",
    },
    FunctionDescriptor {
        name: FunctionName::ForecastCongestion,
        description: "Forecast traffic congestion based on historical patterns and trends",
        required: &[],
        optional: &[
            "forecast_date",
            "forecast_day_type",
            "forecast_hour",
            "region",
            "entry_point",
            "vehicle_class",
            "lookback_days",
            "use_historical_trends",
        ],
        returns: "Congestion forecast with confidence interval and contextual factors",
    },
];

pub fn descriptor(name: FunctionName) -> &'static FunctionDescriptor {
    // FUNCTIONS is laid out in FunctionName::ALL order
    &FUNCTIONS[name as usize]
}

pub fn option_for(parameter: &str) -> Option<ParameterOption> {
    use ParameterOption::{Choices, Hint};

    Some(match parameter {
        "start_date" | "end_date" | "forecast_date" => Hint("YYYY-MM-DD format"),
        "day_type" | "forecast_day_type" => Choices(DAY_TYPES),
        "hour_range" => Hint("List of two integers from 0-23, e.g. [6, 10]"),
        "time_period" => Choices(TIME_PERIODS),
        "vehicle_class" => Choices(VEHICLE_CLASSES),
        "entry_point" => Hint("Detection Group values from dataset"),
        "entry_region" | "region" | "source_region" | "destination_region" => {
            Hint("Detection Region values from dataset")
        }
        "top_n" => Hint("Integer"),
        "lookback_days" => Hint("Integer, default is 30"),
        "forecast_hour" => Hint("Integer from 0-23"),
        "include_excluded_roadways" | "include_time_variation" | "use_historical_trends" => {
            Choices(&["True", "False"])
        }
        "granularity" => Choices(&["hour", "day_of_week", "date", "10_minute"]),
        "metric" => Choices(METRICS),
        "time_unit" => Choices(&["hour", "day", "day_of_week", "week", "month"]),
        "compare_with" => Choices(COMPARISON_KEYWORDS),
        "dimension" => Choices(&["time", "vehicle", "location"]),
        "segment_a" | "segment_b" => Hint("Dictionary of filter parameters"),
        "chart_type" => Choices(CHART_TYPES),
        "x_column" => Choices(&[
            "hour_of_day",
            "day_of_week",
            "toll_date",
            "toll_week",
            "month",
            "vehicle_class",
            "detection_group",
            "detection_region",
            "time_period",
            "minute_of_hour",
        ]),
        "y_column" => Choices(&["crz_entries", "excluded_roadway_entries", "total_entries"]),
        "title" => Hint("Chart title"),
        _ => return None,
    })
}

/// JSON schema fragment for a single parameter.
pub fn property_schema(parameter: &str) -> Value {
    let mut schema = match parameter {
        "hour_range" => json!({
            "type": "array",
            "items": {"type": "integer", "minimum": 0, "maximum": 23},
            "minItems": 2,
            "maxItems": 2,
        }),
        "top_n" | "lookback_days" => json!({"type": "integer", "minimum": 0}),
        "forecast_hour" => json!({"type": "integer", "minimum": 0, "maximum": 23}),
        "include_excluded_roadways" | "include_time_variation" | "use_historical_trends" => {
            json!({"type": "boolean"})
        }
        "compare_with" => json!({
            "type": "array",
            "items": {"type": "string", "enum": COMPARISON_KEYWORDS},
        }),
        "segment_a" | "segment_b" => {
            let properties: Map<String, Value> = FILTER_FIELDS
                .iter()
                .map(|f| (f.to_string(), property_schema(f)))
                .collect();
            json!({"type": "object", "properties": properties})
        }
        _ => match option_for(parameter) {
            Some(ParameterOption::Choices(values)) => json!({"type": "string", "enum": values}),
            _ => json!({"type": "string"}),
        },
    };

    if let (Some(ParameterOption::Hint(hint)), Some(obj)) =
        (option_for(parameter), schema.as_object_mut())
    {
        obj.insert("description".to_string(), json!(hint));
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_names() {
        for function in FunctionName::ALL {
            assert_eq!(descriptor(function).name, function);
        }
    }

    #[test]
    fn test_every_parameter_has_an_option() {
        for descriptor in &FUNCTIONS {
            for param in descriptor.parameters() {
                assert!(option_for(param).is_some(), "{param} has no option entry");
            }
        }
    }

    #[test]
    fn test_accepts() {
        let forecast = descriptor(FunctionName::ForecastCongestion);
        assert!(forecast.accepts("forecast_hour"));
        assert!(!forecast.accepts("day_type"));
    }

    #[test]
    fn test_hint_becomes_description() {
        let schema = property_schema("start_date");
        assert_eq!(schema["type"], "string");
        assert_eq!(schema["description"], "YYYY-MM-DD format");
    }
}
