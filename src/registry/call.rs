use crate::analyzers::types::{
    CongestionForecast, EntryPointVolumeReport, ExcludedRoadwayReport, FilteredData,
    PeakPeriodsReport, RegionalFlowReport, SegmentComparison, TimeTrendsReport,
    VehicleDistributionReport, VehiclePatternsReport, VisualizationSpec,
};
use crate::analyzers::{self, AnalysisError};
use crate::dataset::Dataset;
use crate::filter::FilterSpec;
use crate::registry::params::{
    CompareSegmentsParams, EntryPointVolumeParams, ExcludedRoadwayParams, ForecastParams,
    PeakPeriodsParams, RegionalFlowParams, TimeTrendsParams, VehicleDistributionParams,
    VehiclePatternsParams, VisualizationParams,
};
use crate::registry::{FunctionName, RegistryError};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A function name bound to its typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionCall {
    FilterCrzData(FilterSpec),
    AnalyzeEntryPointVolume(EntryPointVolumeParams),
    AnalyzePeakPeriods(PeakPeriodsParams),
    AnalyzeVehicleDistribution(VehicleDistributionParams),
    AnalyzeTimeTrends(TimeTrendsParams),
    AnalyzeExcludedRoadwayUsage(ExcludedRoadwayParams),
    AnalyzeVehiclePatterns(VehiclePatternsParams),
    CompareTrafficSegments(CompareSegmentsParams),
    GenerateVisualization(VisualizationParams),
    AnalyzeRegionalTrafficFlow(RegionalFlowParams),
    ForecastCongestion(ForecastParams),
}

impl FunctionCall {
    /// Binds a parameter object to the function's parameter type.
    pub fn from_parameters(
        name: FunctionName,
        parameters: Map<String, Value>,
    ) -> Result<Self, RegistryError> {
        let value = Value::Object(parameters);
        let call = match name {
            FunctionName::FilterCrzData => parse(value).map(FunctionCall::FilterCrzData),
            FunctionName::AnalyzeEntryPointVolume => {
                parse(value).map(FunctionCall::AnalyzeEntryPointVolume)
            }
            FunctionName::AnalyzePeakPeriods => parse(value).map(FunctionCall::AnalyzePeakPeriods),
            FunctionName::AnalyzeVehicleDistribution => {
                parse(value).map(FunctionCall::AnalyzeVehicleDistribution)
            }
            FunctionName::AnalyzeTimeTrends => parse(value).map(FunctionCall::AnalyzeTimeTrends),
            FunctionName::AnalyzeExcludedRoadwayUsage => {
                parse(value).map(FunctionCall::AnalyzeExcludedRoadwayUsage)
            }
            FunctionName::AnalyzeVehiclePatterns => {
                parse(value).map(FunctionCall::AnalyzeVehiclePatterns)
            }
            FunctionName::CompareTrafficSegments => {
                parse(value).map(FunctionCall::CompareTrafficSegments)
            }
            FunctionName::GenerateVisualization => {
                parse(value).map(FunctionCall::GenerateVisualization)
            }
            FunctionName::AnalyzeRegionalTrafficFlow => {
                parse(value).map(FunctionCall::AnalyzeRegionalTrafficFlow)
            }
            FunctionName::ForecastCongestion => parse(value).map(FunctionCall::ForecastCongestion),
        };
        call.map_err(|source| RegistryError::InvalidParameters {
            function: name,
            source,
        })
    }

    pub fn name(&self) -> FunctionName {
        match self {
            FunctionCall::FilterCrzData(_) => FunctionName::FilterCrzData,
            FunctionCall::AnalyzeEntryPointVolume(_) => FunctionName::AnalyzeEntryPointVolume,
            FunctionCall::AnalyzePeakPeriods(_) => FunctionName::AnalyzePeakPeriods,
            FunctionCall::AnalyzeVehicleDistribution(_) => FunctionName::AnalyzeVehicleDistribution,
            FunctionCall::AnalyzeTimeTrends(_) => FunctionName::AnalyzeTimeTrends,
            FunctionCall::AnalyzeExcludedRoadwayUsage(_) => {
                FunctionName::AnalyzeExcludedRoadwayUsage
            }
            FunctionCall::AnalyzeVehiclePatterns(_) => FunctionName::AnalyzeVehiclePatterns,
            FunctionCall::CompareTrafficSegments(_) => FunctionName::CompareTrafficSegments,
            FunctionCall::GenerateVisualization(_) => FunctionName::GenerateVisualization,
            FunctionCall::AnalyzeRegionalTrafficFlow(_) => FunctionName::AnalyzeRegionalTrafficFlow,
            FunctionCall::ForecastCongestion(_) => FunctionName::ForecastCongestion,
        }
    }
}

fn parse<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value)
}

/// The report produced by any analysis function.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Filtered(FilteredData),
    EntryPointVolume(EntryPointVolumeReport),
    PeakPeriods(PeakPeriodsReport),
    VehicleDistribution(VehicleDistributionReport),
    TimeTrends(TimeTrendsReport),
    ExcludedRoadway(ExcludedRoadwayReport),
    VehiclePatterns(VehiclePatternsReport),
    SegmentComparison(SegmentComparison),
    Visualization(VisualizationSpec),
    RegionalFlow(RegionalFlowReport),
    Forecast(CongestionForecast),
}

/// Runs `call` against `dataset`. `today` anchors relative dates in
/// forecasts.
#[tracing::instrument(skip(dataset, call), fields(function = %call.name()))]
pub fn execute(
    dataset: &Dataset,
    call: &FunctionCall,
    today: NaiveDate,
) -> Result<AnalysisResult, AnalysisError> {
    let result = match call {
        FunctionCall::FilterCrzData(spec) => {
            AnalysisResult::Filtered(analyzers::filter_records(dataset, spec))
        }
        FunctionCall::AnalyzeEntryPointVolume(p) => {
            AnalysisResult::EntryPointVolume(analyzers::analyze_entry_point_volume(dataset, p))
        }
        FunctionCall::AnalyzePeakPeriods(p) => {
            AnalysisResult::PeakPeriods(analyzers::analyze_peak_periods(dataset, p)?)
        }
        FunctionCall::AnalyzeVehicleDistribution(p) => AnalysisResult::VehicleDistribution(
            analyzers::analyze_vehicle_distribution(dataset, p),
        ),
        FunctionCall::AnalyzeTimeTrends(p) => {
            AnalysisResult::TimeTrends(analyzers::analyze_time_trends(dataset, p)?)
        }
        FunctionCall::AnalyzeExcludedRoadwayUsage(p) => AnalysisResult::ExcludedRoadway(
            analyzers::analyze_excluded_roadway_usage(dataset, p),
        ),
        FunctionCall::AnalyzeVehiclePatterns(p) => {
            AnalysisResult::VehiclePatterns(analyzers::analyze_vehicle_patterns(dataset, p)?)
        }
        FunctionCall::CompareTrafficSegments(p) => {
            AnalysisResult::SegmentComparison(analyzers::compare_traffic_segments(dataset, p)?)
        }
        FunctionCall::GenerateVisualization(p) => {
            AnalysisResult::Visualization(analyzers::generate_visualization(dataset, p)?)
        }
        FunctionCall::AnalyzeRegionalTrafficFlow(p) => AnalysisResult::RegionalFlow(
            analyzers::analyze_regional_traffic_flow(dataset, p),
        ),
        FunctionCall::ForecastCongestion(p) => {
            AnalysisResult::Forecast(analyzers::forecast_congestion(dataset, p, today)?)
        }
    };
    Ok(result)
}
