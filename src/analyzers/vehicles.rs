use crate::analyzers::comparison::resolve_comparison;
use crate::analyzers::types::{
    ComparisonDistribution, FilterSummary, HourShare, Share, VehicleDistributionReport,
    VehiclePatternsReport, VehicleShare,
};
use crate::analyzers::utility::{argmax, pct, round1, sort_by_volume_desc, sum_by};
use crate::analyzers::AnalysisError;
use crate::dataset::record::{WEEKDAYS_MONDAY_FIRST, monday_index};
use crate::dataset::{Dataset, View};
use crate::filter::{FilterSpec, filter_crz_data};
use crate::registry::params::{CompareWith, VehicleDistributionParams, VehiclePatternsParams};
use std::collections::BTreeMap;
use tracing::warn;

/// Breaks traffic down by vehicle class, optionally alongside named
/// comparison periods.
///
/// Each comparison keyword is resolved to its own filter and applied to the
/// whole table independently of the main filters. Keywords that resolve to
/// nothing are skipped.
pub fn analyze_vehicle_distribution(
    dataset: &Dataset,
    params: &VehicleDistributionParams,
) -> VehicleDistributionReport {
    let view = filter_crz_data(dataset, &params.filters);
    let (vehicle_distribution, total_volume) = distribution(&view);

    let mut comparisons = BTreeMap::new();
    for (name, spec) in comparison_specs(params) {
        if spec.is_empty() {
            warn!(comparison = %name, "Unknown comparison period, skipping");
            continue;
        }
        let comp_view = filter_crz_data(dataset, &spec);
        let (comp_distribution, comp_total) = distribution(&comp_view);
        comparisons.insert(
            name,
            ComparisonDistribution {
                vehicle_distribution: comp_distribution,
                total_volume: comp_total,
                filters: spec,
            },
        );
    }

    VehicleDistributionReport {
        vehicle_distribution,
        total_volume,
        comparisons,
        filter_summary: FilterSummary::new(&params.filters, &view),
    }
}

fn comparison_specs(params: &VehicleDistributionParams) -> Vec<(String, FilterSpec)> {
    let current_day = params.filters.day_type();
    match &params.compare_with {
        None => Vec::new(),
        Some(CompareWith::Names(names)) => names
            .iter()
            .map(|n| (n.clone(), resolve_comparison(n, current_day)))
            .collect(),
        Some(CompareWith::Name(name)) => {
            vec![(name.clone(), resolve_comparison(name, current_day))]
        }
        Some(CompareWith::Filters(spec)) => vec![("custom".to_string(), spec.clone())],
    }
}

fn distribution(view: &View<'_>) -> (Vec<VehicleShare>, u64) {
    let by_class = sum_by(view, |r| r.vehicle_class.clone(), |r| r.crz_entries);
    let total: u64 = by_class.values().sum();

    let mut ranked: Vec<(String, u64)> = by_class.into_iter().collect();
    sort_by_volume_desc(&mut ranked);

    let shares = ranked
        .into_iter()
        .map(|(vehicle_class, volume)| VehicleShare {
            vehicle_class,
            volume,
            percentage: round1(pct(volume, total)),
        })
        .collect();
    (shares, total)
}

/// Profiles when and where one vehicle class travels.
///
/// `vehicle_class` is required. The class's share of all traffic is measured
/// against the same filters with the class constraint removed.
pub fn analyze_vehicle_patterns(
    dataset: &Dataset,
    params: &VehiclePatternsParams,
) -> Result<VehiclePatternsReport, AnalysisError> {
    let vehicle_class = params
        .filters
        .vehicle_class()
        .ok_or_else(|| AnalysisError::Validation("vehicle_class is required".to_string()))?
        .to_string();

    let view = filter_crz_data(dataset, &params.filters);
    let all_classes = filter_crz_data(
        dataset,
        &FilterSpec {
            vehicle_class: None,
            ..params.filters.clone()
        },
    );

    let total_volume = view.crz_total();

    let by_hour = sum_by(&view, |r| r.hour_of_day, |r| r.crz_entries);
    let peak_hour = argmax(by_hour.iter().map(|(h, v)| (*h, *v)));
    let hourly_distribution = by_hour
        .iter()
        .map(|(hour, volume)| HourShare {
            hour: *hour,
            volume: *volume,
            percentage: round1(pct(*volume, total_volume)),
        })
        .collect();

    let by_day = sum_by(
        &view,
        |r| {
            let order = monday_index(&r.day_of_week).unwrap_or(WEEKDAYS_MONDAY_FIRST.len());
            (order, r.day_of_week.clone())
        },
        |r| r.crz_entries,
    );
    let peak_day = argmax(by_day.iter().map(|((_, d), v)| (d.clone(), *v)));
    let day_distribution = by_day
        .into_iter()
        .map(|((_, name), volume)| Share {
            name,
            volume,
            percentage: round1(pct(volume, total_volume)),
        })
        .collect();

    let mut by_entry: Vec<(String, u64)> =
        sum_by(&view, |r| r.detection_group.clone(), |r| r.crz_entries)
            .into_iter()
            .collect();
    sort_by_volume_desc(&mut by_entry);
    let top_entry_points = by_entry
        .into_iter()
        .take(5)
        .map(|(name, volume)| Share {
            name,
            volume,
            percentage: round1(pct(volume, total_volume)),
        })
        .collect();

    Ok(VehiclePatternsReport {
        vehicle_class,
        total_volume,
        share_of_all_traffic: round1(pct(total_volume, all_classes.crz_total())),
        peak_hour,
        peak_day,
        hourly_distribution,
        day_distribution,
        top_entry_points,
        filter_summary: FilterSummary::new(&params.filters, &view),
    })
}
