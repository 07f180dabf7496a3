use crate::analyzers::AnalysisError;
use crate::analyzers::types::{ChartPoint, FilterSummary, VisualizationSpec};
use crate::analyzers::utility::sum_by;
use crate::dataset::record::sunday_index;
use crate::dataset::{Dataset, Record};
use crate::filter::filter_crz_data;
use crate::registry::params::VisualizationParams;
use std::collections::BTreeMap;

pub const CHART_TYPES: &[&str] = &["bar", "line", "pie", "scatter", "area"];

const DEFAULT_TITLE: &str = "Congestion Relief Zone Analysis";

/// Categorical or time column plotted along the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XColumn {
    HourOfDay,
    DayOfWeek,
    TollDate,
    TollWeek,
    Month,
    VehicleClass,
    EntryPoint,
    EntryRegion,
    TimePeriod,
    MinuteOfHour,
}

impl XColumn {
    pub fn parse(value: Option<&str>) -> Result<Self, AnalysisError> {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(XColumn::HourOfDay);
        };
        match raw.to_lowercase().replace(' ', "_").as_str() {
            "hour_of_day" | "hour" => Ok(XColumn::HourOfDay),
            "day_of_week" => Ok(XColumn::DayOfWeek),
            "toll_date" | "date" => Ok(XColumn::TollDate),
            "toll_week" | "week" => Ok(XColumn::TollWeek),
            "month" => Ok(XColumn::Month),
            "vehicle_class" => Ok(XColumn::VehicleClass),
            "detection_group" | "entry_point" => Ok(XColumn::EntryPoint),
            "detection_region" | "entry_region" | "region" => Ok(XColumn::EntryRegion),
            "time_period" => Ok(XColumn::TimePeriod),
            "minute_of_hour" => Ok(XColumn::MinuteOfHour),
            _ => Err(AnalysisError::unsupported("x_column", raw)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            XColumn::HourOfDay => "hour_of_day",
            XColumn::DayOfWeek => "day_of_week",
            XColumn::TollDate => "toll_date",
            XColumn::TollWeek => "toll_week",
            XColumn::Month => "month",
            XColumn::VehicleClass => "vehicle_class",
            XColumn::EntryPoint => "detection_group",
            XColumn::EntryRegion => "detection_region",
            XColumn::TimePeriod => "time_period",
            XColumn::MinuteOfHour => "minute_of_hour",
        }
    }
}

/// Numeric column summed along the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YColumn {
    CrzEntries,
    ExcludedRoadwayEntries,
    TotalEntries,
}

impl YColumn {
    pub fn parse(value: Option<&str>) -> Result<Self, AnalysisError> {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(YColumn::CrzEntries);
        };
        match raw.to_lowercase().replace(' ', "_").as_str() {
            "crz_entries" => Ok(YColumn::CrzEntries),
            "excluded_roadway_entries" => Ok(YColumn::ExcludedRoadwayEntries),
            "total_entries" => Ok(YColumn::TotalEntries),
            _ => Err(AnalysisError::unsupported("y_column", raw)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            YColumn::CrzEntries => "crz_entries",
            YColumn::ExcludedRoadwayEntries => "excluded_roadway_entries",
            YColumn::TotalEntries => "total_entries",
        }
    }

    fn of(&self, r: &Record) -> u64 {
        match self {
            YColumn::CrzEntries => r.crz_entries,
            YColumn::ExcludedRoadwayEntries => r.excluded_roadway_entries,
            YColumn::TotalEntries => r.total_entries(),
        }
    }
}

/// Describes a chart over the filtered view. Nothing is rendered; the
/// caller receives the series and labels.
pub fn generate_visualization(
    dataset: &Dataset,
    params: &VisualizationParams,
) -> Result<VisualizationSpec, AnalysisError> {
    let chart_type = match params.chart_type.as_deref().map(str::trim) {
        None | Some("") => "bar",
        Some(c) if CHART_TYPES.contains(&c) => c,
        Some(c) => return Err(AnalysisError::unsupported("chart_type", c)),
    };
    let x = XColumn::parse(params.x_column.as_deref())?;
    let y = YColumn::parse(params.y_column.as_deref())?;
    let view = filter_crz_data(dataset, &params.filters);
    let value = |r: &Record| y.of(r);

    let data: Vec<ChartPoint> = match x {
        XColumn::HourOfDay => points(sum_by(&view, |r| r.hour_of_day, value), |h| h.to_string()),
        XColumn::MinuteOfHour => {
            points(sum_by(&view, |r| r.minute_of_hour, value), |m| m.to_string())
        }
        XColumn::DayOfWeek => points(
            sum_by(
                &view,
                |r| (sunday_index(&r.day_of_week).unwrap_or(7), r.day_of_week.clone()),
                value,
            ),
            |(_, d)| d,
        ),
        XColumn::TollDate => points(sum_by(&view, |r| r.toll_date, value), |d| {
            d.format("%Y-%m-%d").to_string()
        }),
        XColumn::TollWeek => points(sum_by(&view, |r| r.toll_week, value), |d| {
            d.format("%Y-%m-%d").to_string()
        }),
        XColumn::Month => points(sum_by(&view, |r| (r.year, r.month), value), |(year, month)| {
            format!("{year:04}-{month:02}")
        }),
        XColumn::VehicleClass => points(sum_by(&view, |r| r.vehicle_class.clone(), value), |k| k),
        XColumn::EntryPoint => points(sum_by(&view, |r| r.detection_group.clone(), value), |k| k),
        XColumn::EntryRegion => {
            points(sum_by(&view, |r| r.detection_region.clone(), value), |k| k)
        }
        XColumn::TimePeriod => points(sum_by(&view, |r| r.time_period.clone(), value), |k| k),
    };

    Ok(VisualizationSpec {
        chart_type: chart_type.to_string(),
        title: params
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        x_column: x.as_str().to_string(),
        y_column: y.as_str().to_string(),
        data,
        filter_summary: FilterSummary::new(&params.filters, &view),
    })
}

fn points<K>(
    groups: BTreeMap<K, u64>,
    label: impl Fn(K) -> String,
) -> Vec<ChartPoint> {
    groups
        .into_iter()
        .map(|(k, y)| ChartPoint { x: label(k), y })
        .collect()
}
